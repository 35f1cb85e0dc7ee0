use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use footprint_core::{
    build_reduction_plan, classify_intent, select_response, ChatContext,
    ChatReply, ChatRequest, ConversationTurn, Intent, PlanRequest, ReductionPlan, ReplySource,
    ResponsePayload, GENERATIVE_QUICK_REPLIES, KEYWORD_PATTERNS,
};
use footprint_generative::{GenerationRequest, ResponseGenerator};
use footprint_observability::AppMetrics;
use footprint_storage::ConversationRepository;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message is required")]
    EmptyMessage,
    #[error("premium subscription required")]
    PremiumRequired,
    #[error("conversation storage failed: {0:#}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Treat every user as premium and skip the generative backend.
    pub mock_mode: bool,
    pub generative_timeout: Duration,
    pub max_stored_turns: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            mock_mode: true,
            generative_timeout: Duration::from_secs(20),
            max_stored_turns: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IntentCatalog {
    pub intents: Vec<Intent>,
    pub patterns: BTreeMap<Intent, &'static [&'static str]>,
}

#[derive(Clone)]
pub struct ChatbotAgent<S, G>
where
    S: ConversationRepository,
    G: ResponseGenerator,
{
    store: Arc<S>,
    generator: Arc<G>,
    settings: AgentSettings,
    metrics: Arc<AppMetrics>,
}

impl<S, G> ChatbotAgent<S, G>
where
    S: ConversationRepository,
    G: ResponseGenerator,
{
    pub fn new(
        store: Arc<S>,
        generator: Arc<G>,
        settings: AgentSettings,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            store,
            generator,
            settings,
            metrics,
        }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn generator_enabled(&self) -> bool {
        self.generator.is_enabled()
    }

    fn generative_allowed(&self) -> bool {
        self.generator.is_enabled() && !self.settings.mock_mode
    }

    #[instrument(skip(self, request), fields(user_id = request.user_id.as_deref().unwrap_or("anonymous")))]
    pub async fn handle_chat(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        let started = Instant::now();
        self.metrics.inc_request();

        let message = request.message.trim();
        if message.is_empty() {
            self.metrics.inc_rejected();
            self.metrics.observe_latency(started.elapsed());
            return Err(ChatError::EmptyMessage);
        }

        let is_premium = request.context.is_premium || self.settings.mock_mode;
        let intent = classify_intent(message);

        let mut generated = None;
        if self.generative_allowed() {
            let history = match (&request.user_id, request.history.is_empty()) {
                (Some(user_id), true) => self.store.load_conversation(user_id).await?.unwrap_or_default(),
                _ => request.history.clone(),
            };
            let context = ChatContext {
                is_premium,
                monthly_co2e: request.context.monthly_co2e,
            };
            generated = self.try_generate(message, &history, &context).await;
        }

        let (payload, source) = match generated {
            Some(text) => {
                self.metrics.inc_generative_reply();
                (
                    ResponsePayload {
                        text,
                        quick_replies: GENERATIVE_QUICK_REPLIES
                            .iter()
                            .map(|label| label.to_string())
                            .collect(),
                        tips: Vec::new(),
                    },
                    ReplySource::Generative,
                )
            }
            None => {
                self.metrics.inc_rule_reply();
                (select_response(intent, is_premium), ReplySource::Rules)
            }
        };

        let reply = ChatReply {
            payload,
            intent,
            timestamp: Utc::now(),
            source,
        };

        if let Some(user_id) = request.user_id.as_deref() {
            self.persist_turns(user_id, message, &reply).await?;
        }

        self.metrics.observe_latency(started.elapsed());
        info!(
            intent = %intent,
            source = ?source,
            premium = is_premium,
            "chat handled"
        );

        Ok(reply)
    }

    async fn try_generate(
        &self,
        message: &str,
        history: &[ConversationTurn],
        context: &ChatContext,
    ) -> Option<String> {
        let request = GenerationRequest {
            message,
            history,
            context,
        };

        let generated = match tokio::time::timeout(
            self.settings.generative_timeout,
            self.generator.generate(request),
        )
        .await
        {
            Ok(generated) => generated,
            Err(_) => {
                warn!(
                    backend = self.generator.backend_name(),
                    timeout_ms = self.settings.generative_timeout.as_millis() as u64,
                    "generative backend timed out"
                );
                None
            }
        };

        let generated = generated.filter(|text| !text.trim().is_empty());
        if generated.is_none() {
            self.metrics.inc_generative_fallback();
        }
        generated
    }

    pub fn intent_catalog(&self) -> IntentCatalog {
        IntentCatalog {
            intents: KEYWORD_PATTERNS.iter().map(|pattern| pattern.intent).collect(),
            patterns: KEYWORD_PATTERNS
                .iter()
                .map(|pattern| (pattern.intent, pattern.keywords))
                .collect(),
        }
    }

    pub async fn conversation(&self, user_id: &str) -> Result<Vec<ConversationTurn>, ChatError> {
        Ok(self
            .store
            .load_conversation(user_id)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_conversation(
        &self,
        user_id: &str,
        turns: &[ConversationTurn],
    ) -> Result<(), ChatError> {
        self.store.save_conversation(user_id, turns).await?;
        Ok(())
    }

    pub fn premium_plan(&self, request: &PlanRequest) -> Result<ReductionPlan, ChatError> {
        if !request.is_premium && !self.settings.mock_mode {
            return Err(ChatError::PremiumRequired);
        }

        Ok(build_reduction_plan(
            request.monthly_co2e,
            request.goal_reduction_percent,
        ))
    }

    async fn persist_turns(
        &self,
        user_id: &str,
        user_text: &str,
        reply: &ChatReply,
    ) -> anyhow::Result<()> {
        let mut turns = self
            .store
            .load_conversation(user_id)
            .await?
            .unwrap_or_default();

        turns.push(ConversationTurn::user(user_text, reply.timestamp));
        turns.push(ConversationTurn::assistant(
            reply.payload.text.as_str(),
            reply.timestamp,
        ));

        if turns.len() > self.settings.max_stored_turns {
            let keep_from = turns.len() - self.settings.max_stored_turns;
            turns = turns.split_off(keep_from);
        }

        self.store.save_conversation(user_id, &turns).await
    }
}
