mod config;
mod rate_limit;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use footprint_agents::{AgentSettings, ChatError, ChatbotAgent};
use footprint_core::{ChatContext, ChatRequest, ConversationTurn, PlanRequest};
use footprint_generative::Generator;
use footprint_observability::AppMetrics;
use footprint_storage::Store;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use crate::config::ChatbotConfig;
use crate::rate_limit::IpRateLimiter;

const SERVICE_NAME: &str = "carbon-footprint-chatbot";
const CHAT_FAILURE_TEXT: &str = "I'm sorry, I encountered an error. Please try again.";

pub type FootprintAgent = ChatbotAgent<Store, Generator>;

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<FootprintAgent>,
    pub metrics: Arc<AppMetrics>,
    pub limiter: IpRateLimiter,
    pub config: Arc<ChatbotConfig>,
    pub storage_backend: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    mock_mode: bool,
    gemini_enabled: bool,
    storage: &'static str,
    timestamp_utc: String,
    metrics: footprint_observability::MetricsSnapshot,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatBody {
    #[serde(default)]
    message: String,
    user_id: Option<String>,
    #[serde(default)]
    conversation_history: Vec<ConversationTurn>,
    #[serde(default)]
    context: ChatContext,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversationBody {
    user_id: Option<String>,
    #[serde(default)]
    conversation: Vec<ConversationTurn>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanBody {
    #[serde(default)]
    user_data: PlanRequest,
}

pub async fn build_app(config: ChatbotConfig) -> Result<Router> {
    let metrics = AppMetrics::shared();

    let store = match config.database_url.as_deref() {
        Some(database_url) => Store::sqlite(database_url).await?,
        None => Store::memory(),
    };
    let storage_backend = store.backend_name();

    let generator = match config.gemini_config() {
        Some(gemini) => Generator::gemini(gemini).context("failed to build gemini client")?,
        None => Generator::disabled(),
    };

    let settings = AgentSettings {
        mock_mode: config.mock_mode,
        generative_timeout: config.gemini_timeout,
        max_stored_turns: config.max_stored_turns,
    };

    let agent = Arc::new(ChatbotAgent::new(
        Arc::new(store),
        Arc::new(generator),
        settings,
        metrics.clone(),
    ));

    info!(
        mock_mode = config.mock_mode,
        gemini_enabled = agent.generator_enabled(),
        storage = storage_backend,
        "chatbot agent ready"
    );

    let state = ApiState {
        agent,
        metrics,
        limiter: IpRateLimiter::new(config.rate_limit_window, config.rate_limit_max),
        config: Arc::new(config),
        storage_backend,
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/chatbot/chat", post(chat))
        .route("/chatbot/intents", get(list_intents))
        .route("/chatbot/conversation", post(save_conversation))
        .route("/chatbot/conversation/:user_id", get(get_conversation))
        .route("/chatbot/premium/plan", post(premium_plan))
        .fallback(not_found)
        .layer(build_cors_layer(state.config.allowed_origins.as_deref()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(state.config.body_limit_bytes))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Carbon Footprint Tracker API",
        "status": "running",
        "endpoints": {
            "chatbot": "/chatbot/chat",
            "intents": "/chatbot/intents",
            "conversation": "/chatbot/conversation",
            "premium_plan": "/chatbot/premium/plan",
            "health": "/health"
        }
    }))
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        mock_mode: state.agent.settings().mock_mode,
        gemini_enabled: state.agent.generator_enabled(),
        storage: state.storage_backend,
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn chat(
    State(state): State<ApiState>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_request(rejection),
    };

    let request = ChatRequest {
        message: body.message,
        user_id: body.user_id,
        history: body.conversation_history,
        context: body.context,
    };

    match state.agent.handle_chat(request).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(ChatError::EmptyMessage) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Message is required" })),
        )
            .into_response(),
        Err(error) => {
            error!(error = %error, "chat endpoint failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "An error occurred processing your message",
                    "text": CHAT_FAILURE_TEXT
                })),
            )
                .into_response()
        }
    }
}

async fn list_intents(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.agent.intent_catalog())
}

async fn save_conversation(
    State(state): State<ApiState>,
    body: Result<Json<ConversationBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_request(rejection),
    };

    if let Some(user_id) = body.user_id.as_deref().filter(|id| !id.trim().is_empty()) {
        if let Err(error) = state
            .agent
            .save_conversation(user_id, &body.conversation)
            .await
        {
            return internal_error(&error);
        }
    }

    Json(serde_json::json!({
        "success": true,
        "message": "Conversation saved"
    }))
    .into_response()
}

async fn get_conversation(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.agent.conversation(&user_id).await {
        Ok(conversation) => {
            Json(serde_json::json!({ "conversation": conversation })).into_response()
        }
        Err(error) => internal_error(&error),
    }
}

async fn premium_plan(
    State(state): State<ApiState>,
    body: Result<Json<PlanBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_request(rejection),
    };

    match state.agent.premium_plan(&body.user_data) {
        Ok(plan) => (StatusCode::OK, Json(plan)).into_response(),
        Err(ChatError::PremiumRequired) => (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "error": "Premium subscription required" })),
        )
            .into_response(),
        Err(error) => internal_error(&error),
    }
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not found" })),
    )
}

fn invalid_request(rejection: JsonRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "error": "invalid_request",
            "message": rejection.body_text()
        })),
    )
        .into_response()
}

fn internal_error(error: &ChatError) -> Response {
    error!(error = %error, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": error.to_string() })),
    )
        .into_response()
}

fn build_cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    match allowed_origins {
        Some(origins) => {
            let origins = origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok())
                .collect::<Vec<_>>();
            base.allow_origin(AllowOrigin::list(origins))
        }
        None => base.allow_origin(Any),
    }
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if !state.limiter.allow(&ip) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "message": "rate limit exceeded for this IP"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .split(',')
                .next()
                .unwrap_or("unknown")
                .trim()
                .to_string()
        })
        .unwrap_or_else(|| "local".to_string())
}

#[cfg(test)]
mod tests {
    use super::request_ip;
    use axum::body::Body;
    use axum::http::Request;

    #[test]
    fn request_ip_prefers_first_forwarded_address() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_ip(&request), "203.0.113.9");

        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(request_ip(&request), "local");
    }
}
