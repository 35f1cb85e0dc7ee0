use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of user goals a message can be mapped to.
///
/// Declaration order is significant: keyword-score ties resolve to the
/// variant declared first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CalculateEmission,
    SuggestReduction,
    ExplainCategory,
    SubscribePremium,
    ExportReport,
    ConnectDevice,
    SetGoal,
    ViewDashboard,
    GeneralInquiry,
}

impl Intent {
    pub const ALL: [Intent; 9] = [
        Intent::CalculateEmission,
        Intent::SuggestReduction,
        Intent::ExplainCategory,
        Intent::SubscribePremium,
        Intent::ExportReport,
        Intent::ConnectDevice,
        Intent::SetGoal,
        Intent::ViewDashboard,
        Intent::GeneralInquiry,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CalculateEmission => "calculate_emission",
            Self::SuggestReduction => "suggest_reduction",
            Self::ExplainCategory => "explain_category",
            Self::SubscribePremium => "subscribe_premium",
            Self::ExportReport => "export_report",
            Self::ConnectDevice => "connect_device",
            Self::SetGoal => "set_goal",
            Self::ViewDashboard => "view_dashboard",
            Self::GeneralInquiry => "general_inquiry",
        }
    }

    /// Intents whose reply text and quick replies depend on the premium tier.
    pub fn is_premium_sensitive(self) -> bool {
        matches!(self, Self::ExportReport | Self::ConnectDevice | Self::SetGoal)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown intent label `{0}`")]
pub struct ParseIntentError(pub String);

impl FromStr for Intent {
    type Err = ParseIntentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_lowercase();
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == wanted)
            .ok_or_else(|| ParseIntentError(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tip {
    pub title: String,
    pub description: String,
    pub action: String,
}

/// Reply body produced by the response selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub text: String,
    pub quick_replies: Vec<String>,
    #[serde(default)]
    pub tips: Vec<Tip>,
}

/// Per-request user context supplied by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub monthly_co2e: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String,
    #[serde(alias = "text")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            timestamp: Some(at.to_rfc3339()),
        }
    }

    pub fn assistant(content: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            timestamp: Some(at.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub message: String,
    pub user_id: Option<String>,
    pub history: Vec<ConversationTurn>,
    pub context: ChatContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Rules,
    Generative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(flatten)]
    pub payload: ResponsePayload,
    pub intent: Intent,
    pub timestamp: DateTime<Utc>,
    pub source: ReplySource,
}

/// Inputs for a premium reduction plan, as carried in a client's user data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub monthly_co2e: Option<f64>,
    #[serde(default)]
    pub goal_reduction_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub month: u8,
    pub focus: String,
    pub action: String,
    pub expected_reduction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReductionPlan {
    pub target_reduction: f64,
    pub current_monthly_emissions: f64,
    pub target_monthly_emissions: f64,
    pub timeline_months: u8,
    pub steps: Vec<PlanStep>,
}
