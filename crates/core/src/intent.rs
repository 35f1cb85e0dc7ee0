use crate::models::Intent;

/// Substring triggers for one intent.
#[derive(Debug)]
pub struct KeywordPattern {
    pub intent: Intent,
    pub keywords: &'static [&'static str],
}

/// Keyword table in intent declaration order. `GeneralInquiry` has no
/// triggers; it is what `classify_intent` returns when nothing matches.
pub const KEYWORD_PATTERNS: &[KeywordPattern] = &[
    KeywordPattern {
        intent: Intent::CalculateEmission,
        keywords: &[
            "calculate",
            "emission",
            "footprint",
            "carbon",
            "tracking",
            "measure",
        ],
    },
    KeywordPattern {
        intent: Intent::SuggestReduction,
        keywords: &["reduce", "lower", "decrease", "less", "minimize", "cut down"],
    },
    KeywordPattern {
        intent: Intent::ExplainCategory,
        keywords: &[
            "explain",
            "what is",
            "tell me about",
            "how does",
            "category",
            "transport",
            "energy",
            "food",
            "waste",
        ],
    },
    KeywordPattern {
        intent: Intent::SubscribePremium,
        keywords: &["premium", "subscribe", "upgrade", "paid", "subscription"],
    },
    KeywordPattern {
        intent: Intent::ExportReport,
        keywords: &["export", "report", "download", "pdf", "csv", "data"],
    },
    KeywordPattern {
        intent: Intent::ConnectDevice,
        keywords: &[
            "connect",
            "device",
            "integration",
            "smart meter",
            "app",
            "sync",
        ],
    },
    KeywordPattern {
        intent: Intent::SetGoal,
        keywords: &["goal", "target", "reduce by", "aim for", "challenge"],
    },
    KeywordPattern {
        intent: Intent::ViewDashboard,
        keywords: &["dashboard", "summary", "overview", "stats", "statistics"],
    },
];

pub fn keywords_for(intent: Intent) -> &'static [&'static str] {
    KEYWORD_PATTERNS
        .iter()
        .find(|pattern| pattern.intent == intent)
        .map(|pattern| pattern.keywords)
        .unwrap_or(&[])
}

/// Non-zero keyword scores per intent, in declaration order.
///
/// Each keyword counts at most once no matter how often it occurs.
pub fn score_intents(text: &str) -> Vec<(Intent, usize)> {
    let lower = text.to_lowercase();

    KEYWORD_PATTERNS
        .iter()
        .map(|pattern| (pattern.intent, count_hits(&lower, pattern.keywords)))
        .filter(|(_, score)| *score > 0)
        .collect()
}

pub fn classify_intent(text: &str) -> Intent {
    let mut best: Option<(Intent, usize)> = None;

    for (intent, score) in score_intents(text) {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((intent, score)),
        }
    }

    best.map(|(intent, _)| intent)
        .unwrap_or(Intent::GeneralInquiry)
}

fn count_hits(input: &str, needles: &[&str]) -> usize {
    needles.iter().filter(|needle| input.contains(*needle)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_message_is_general_inquiry() {
        assert_eq!(classify_intent(""), Intent::GeneralInquiry);
        assert_eq!(classify_intent("   "), Intent::GeneralInquiry);
    }

    #[test]
    fn unmatched_message_is_general_inquiry() {
        assert_eq!(classify_intent("hello there"), Intent::GeneralInquiry);
    }

    #[test]
    fn single_keyword_picks_its_intent() {
        assert_eq!(classify_intent("show me the dashboard"), Intent::ViewDashboard);
        assert_eq!(classify_intent("upgrade please"), Intent::SubscribePremium);
        assert_eq!(classify_intent("I need a pdf"), Intent::ExportReport);
    }

    #[test]
    fn every_keyword_maps_back_to_its_own_intent_when_alone() {
        for pattern in KEYWORD_PATTERNS {
            for keyword in pattern.keywords {
                let scores = score_intents(keyword);
                let own = scores
                    .iter()
                    .find(|(intent, _)| *intent == pattern.intent)
                    .map(|(_, score)| *score);
                assert!(own.is_some(), "{keyword} should score for {}", pattern.intent);
            }
        }
    }

    #[test]
    fn lone_keyword_classifies_as_its_intent_unless_it_embeds_another() {
        let mut checked = 0;
        for pattern in KEYWORD_PATTERNS {
            for keyword in pattern.keywords {
                let embeds_foreign_keyword = KEYWORD_PATTERNS
                    .iter()
                    .filter(|other| other.intent != pattern.intent)
                    .flat_map(|other| other.keywords.iter())
                    .any(|other| keyword.contains(other));
                if embeds_foreign_keyword {
                    continue;
                }

                assert_eq!(classify_intent(keyword), pattern.intent, "{keyword}");
                assert_eq!(
                    classify_intent(&format!("please {}", keyword.to_uppercase())),
                    pattern.intent,
                    "{keyword}"
                );
                checked += 1;
            }
        }
        // "reduce by" embeds "reduce"; everything else stands alone.
        assert_eq!(checked, KEYWORD_PATTERNS.iter().map(|p| p.keywords.len()).sum::<usize>() - 1);
    }

    #[test]
    fn classification_ignores_case() {
        assert_eq!(
            classify_intent("REDUCE my footprint"),
            classify_intent("reduce my footprint")
        );
        assert_eq!(classify_intent("DASHBOARD"), Intent::ViewDashboard);
    }

    #[test]
    fn repeated_keyword_counts_once() {
        let scores = score_intents("goal goal goal goal");
        assert_eq!(scores, vec![(Intent::SetGoal, 1)]);
        // two distinct export keywords beat one repeated goal keyword
        assert_eq!(
            classify_intent("goal goal goal export csv"),
            Intent::ExportReport
        );
    }

    #[test]
    fn highest_score_wins() {
        assert_eq!(
            classify_intent("I want to reduce my carbon emission"),
            Intent::CalculateEmission
        );
        assert_eq!(
            classify_intent("how can I lower and decrease my bills"),
            Intent::SuggestReduction
        );
    }

    #[test]
    fn ties_resolve_to_first_declared_intent() {
        assert_eq!(
            score_intents("reduce my emission"),
            vec![(Intent::CalculateEmission, 1), (Intent::SuggestReduction, 1)]
        );
        assert_eq!(classify_intent("reduce my emission"), Intent::CalculateEmission);
        assert_eq!(
            classify_intent("subscribe to the dashboard"),
            Intent::SubscribePremium
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let message = "export my stats to csv and set a goal";
        let first = classify_intent(message);
        for _ in 0..10 {
            assert_eq!(classify_intent(message), first);
        }
    }

    #[test]
    fn multi_word_keywords_need_a_literal_space() {
        assert_eq!(classify_intent("cut down"), Intent::SuggestReduction);
        assert_eq!(classify_intent("cut\tdown"), Intent::GeneralInquiry);
        assert_eq!(classify_intent("what\nis"), Intent::GeneralInquiry);
    }

    #[test]
    fn general_inquiry_has_no_keywords() {
        assert!(keywords_for(Intent::GeneralInquiry).is_empty());
        assert!(keywords_for(Intent::SetGoal).contains(&"aim for"));
    }
}
