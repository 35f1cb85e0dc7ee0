use crate::models::{Intent, ResponsePayload, Tip};

#[derive(Debug)]
pub enum TemplateText {
    Fixed(&'static str),
    Tiered {
        base: &'static str,
        premium: &'static str,
        free: &'static str,
    },
}

#[derive(Debug)]
pub enum QuickReplies {
    Fixed(&'static [&'static str]),
    Tiered {
        premium: &'static [&'static str],
        free: &'static [&'static str],
    },
}

#[derive(Debug)]
pub struct TipTemplate {
    pub title: &'static str,
    pub description: &'static str,
    pub action: &'static str,
}

#[derive(Debug)]
pub enum Tips {
    None,
    Always(&'static [TipTemplate]),
    PremiumOnly(&'static [TipTemplate]),
}

#[derive(Debug)]
pub struct ResponseTemplate {
    pub intent: Intent,
    pub text: TemplateText,
    pub quick_replies: QuickReplies,
    pub tips: Tips,
}

impl ResponseTemplate {
    pub fn render(&self, is_premium: bool) -> ResponsePayload {
        let text = match self.text {
            TemplateText::Fixed(text) => text.to_string(),
            TemplateText::Tiered {
                base,
                premium,
                free,
            } => format!("{base}{}", if is_premium { premium } else { free }),
        };

        let quick_replies: &[&str] = match self.quick_replies {
            QuickReplies::Fixed(labels) => labels,
            QuickReplies::Tiered { premium, free } => {
                if is_premium {
                    premium
                } else {
                    free
                }
            }
        };

        let tips: &[TipTemplate] = match self.tips {
            Tips::Always(tips) => tips,
            Tips::PremiumOnly(tips) if is_premium => tips,
            _ => &[],
        };

        ResponsePayload {
            text,
            quick_replies: quick_replies.iter().map(|label| label.to_string()).collect(),
            tips: tips
                .iter()
                .map(|tip| Tip {
                    title: tip.title.to_string(),
                    description: tip.description.to_string(),
                    action: tip.action.to_string(),
                })
                .collect(),
        }
    }
}

/// One entry per intent. `GeneralInquiry` stays last: it doubles as the
/// fallback in `template_for`.
pub static RESPONSE_TEMPLATES: [ResponseTemplate; 9] = [
    ResponseTemplate {
        intent: Intent::CalculateEmission,
        text: TemplateText::Fixed(
            "To calculate your carbon footprint, use the calculator on the website! I can help explain what each category means. What would you like to know more about?",
        ),
        quick_replies: QuickReplies::Fixed(&["Transport", "Energy", "Food", "Waste"]),
        tips: Tips::Always(&[TipTemplate {
            title: "Use the Calculator",
            description: "Navigate to the calculator section",
            action: "navigate:calculator",
        }]),
    },
    ResponseTemplate {
        intent: Intent::SuggestReduction,
        text: TemplateText::Fixed(
            "Great question! Here are top tips to reduce your carbon footprint:\n\n1. 🚗 Reduce car travel by 20%\n2. ⚡ Switch to renewable energy\n3. 🍽️ Eat less meat\n4. ♻️ Improve recycling\n\nWould you like specific tips for any category?",
        ),
        quick_replies: QuickReplies::Fixed(&["Transport Tips", "Energy Tips", "Food Tips"]),
        tips: Tips::Always(&[TipTemplate {
            title: "View Insights",
            description: "Check personalized insights",
            action: "navigate:insights",
        }]),
    },
    ResponseTemplate {
        intent: Intent::ExplainCategory,
        text: TemplateText::Fixed(
            "I can explain different emission categories:\n\n• **Transport**: Cars, flights, public transport\n• **Energy**: Electricity, heating, renewable sources\n• **Food**: Meat, dairy, local/organic choices\n• **Waste**: Recycling, composting, waste reduction\n\nWhich category interests you?",
        ),
        quick_replies: QuickReplies::Fixed(&["Transport", "Energy", "Food", "Waste"]),
        tips: Tips::None,
    },
    ResponseTemplate {
        intent: Intent::SubscribePremium,
        text: TemplateText::Fixed(
            "Premium features include:\n• Advanced analytics\n• PDF/CSV export\n• Device integrations\n• Personalized reduction plans\n• Priority support\n\nWould you like to learn more?",
        ),
        quick_replies: QuickReplies::Fixed(&["View Premium", "Subscribe"]),
        tips: Tips::Always(&[TipTemplate {
            title: "Premium Features",
            description: "Check out premium features",
            action: "navigate:premium",
        }]),
    },
    ResponseTemplate {
        intent: Intent::ExportReport,
        text: TemplateText::Tiered {
            base: "Export features are available in premium. You can export your data as CSV or PDF for detailed analysis.",
            premium: " I can help you export your data now!",
            free: " Would you like to upgrade to premium?",
        },
        quick_replies: QuickReplies::Tiered {
            premium: &["Export CSV", "Export PDF"],
            free: &["View Premium", "Subscribe"],
        },
        tips: Tips::PremiumOnly(&[TipTemplate {
            title: "Export Data",
            description: "Use export in dashboard",
            action: "navigate:dashboard",
        }]),
    },
    ResponseTemplate {
        intent: Intent::ConnectDevice,
        text: TemplateText::Tiered {
            base: "Device integration is a premium feature. You can connect smart meters, mobility apps, and other devices to automatically track emissions.",
            premium: " I can help you set up device integration!",
            free: " Upgrade to premium to access this feature.",
        },
        quick_replies: QuickReplies::Tiered {
            premium: &["View Devices", "Connect Device"],
            free: &["View Premium"],
        },
        tips: Tips::None,
    },
    ResponseTemplate {
        intent: Intent::SetGoal,
        text: TemplateText::Tiered {
            base: "Setting goals is a great way to track progress! You can set reduction goals in the Goals section. I can help you create a personalized plan.",
            premium: " Let me create a custom plan for you!",
            free: " Premium users get personalized reduction plans.",
        },
        quick_replies: QuickReplies::Tiered {
            premium: &["Set Goal", "View Goals", "Create Plan"],
            free: &["Set Goal", "View Goals", "View Premium"],
        },
        tips: Tips::Always(&[TipTemplate {
            title: "Set Your Goal",
            description: "Navigate to goals section",
            action: "navigate:goals",
        }]),
    },
    ResponseTemplate {
        intent: Intent::ViewDashboard,
        text: TemplateText::Fixed(
            "Your dashboard shows:\n• Monthly CO₂e emissions\n• Category breakdown\n• Trend charts\n• Progress toward goals\n\nNavigate to the dashboard to see your data!",
        ),
        quick_replies: QuickReplies::Fixed(&["View Dashboard", "Calculate Footprint"]),
        tips: Tips::Always(&[TipTemplate {
            title: "Go to Dashboard",
            description: "View your emissions data",
            action: "navigate:dashboard",
        }]),
    },
    ResponseTemplate {
        intent: Intent::GeneralInquiry,
        text: TemplateText::Fixed(
            "I'm here to help with your carbon footprint questions! I can help you:\n\n• Calculate emissions\n• Get reduction tips\n• Understand your dashboard\n• Set goals\n\nWhat would you like to explore?",
        ),
        quick_replies: QuickReplies::Fixed(&[
            "Calculate Footprint",
            "Reduction Tips",
            "Dashboard",
            "Help",
        ]),
        tips: Tips::None,
    },
];

/// Quick replies attached to replies produced by the generative backend.
pub const GENERATIVE_QUICK_REPLIES: &[&str] = &["More Help", "Dashboard", "Calculator"];

pub fn template_for(intent: Intent) -> &'static ResponseTemplate {
    let general_inquiry = &RESPONSE_TEMPLATES[RESPONSE_TEMPLATES.len() - 1];
    RESPONSE_TEMPLATES
        .iter()
        .find(|template| template.intent == intent)
        .unwrap_or(general_inquiry)
}

pub fn select_response(intent: Intent, is_premium: bool) -> ResponsePayload {
    template_for(intent).render(is_premium)
}
