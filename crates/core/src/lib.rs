pub mod intent;
pub mod models;
pub mod planner;
pub mod responses;

pub use intent::{classify_intent, keywords_for, score_intents, KEYWORD_PATTERNS};
pub use models::*;
pub use planner::build_reduction_plan;
pub use responses::{select_response, template_for, GENERATIVE_QUICK_REPLIES};
