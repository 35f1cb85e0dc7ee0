use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use footprint_api::{build_app, ChatbotConfig};
use footprint_core::{select_response, Intent};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app_with(config: ChatbotConfig) -> Router {
    build_app(config).await.expect("app should build")
}

fn live_config() -> ChatbotConfig {
    ChatbotConfig {
        mock_mode: false,
        ..ChatbotConfig::default()
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_reports_mode_and_backend() {
    let app = app_with(ChatbotConfig::default()).await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = body_json(response).await;
    assert_eq!(parsed["status"], "healthy");
    assert_eq!(parsed["service"], "carbon-footprint-chatbot");
    assert_eq!(parsed["mock_mode"], true);
    assert_eq!(parsed["gemini_enabled"], false);
}

#[tokio::test]
async fn chat_returns_intent_timestamp_and_payload() {
    let app = app_with(live_config()).await;

    let response = app
        .oneshot(post_json(
            "/chatbot/chat",
            json!({ "message": "Show me my dashboard", "userId": "user-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = body_json(response).await;
    assert_eq!(parsed["intent"], "view_dashboard");
    assert_eq!(parsed["source"], "rules");
    assert!(parsed["text"].as_str().unwrap().contains("dashboard"));
    assert_eq!(parsed["quick_replies"][0], "View Dashboard");
    assert_eq!(parsed["tips"][0]["action"], "navigate:dashboard");
    assert!(parsed["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn chat_rejects_blank_message() {
    let app = app_with(ChatbotConfig::default()).await;

    let response = app
        .clone()
        .oneshot(post_json("/chatbot/chat", json!({ "message": "   " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Message is required");

    let response = app
        .oneshot(post_json("/chatbot/chat", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_rejects_malformed_json() {
    let app = app_with(ChatbotConfig::default()).await;

    let request = Request::builder()
        .method("POST")
        .uri("/chatbot/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_request");
}

#[tokio::test]
async fn premium_context_changes_export_reply() {
    let app = app_with(live_config()).await;

    let free = app
        .clone()
        .oneshot(post_json(
            "/chatbot/chat",
            json!({ "message": "export my data", "context": { "is_premium": false } }),
        ))
        .await
        .unwrap();
    let premium = app
        .oneshot(post_json(
            "/chatbot/chat",
            json!({ "message": "export my data", "context": { "is_premium": true, "monthly_co2e": 0.8 } }),
        ))
        .await
        .unwrap();

    let free = body_json(free).await;
    let premium = body_json(premium).await;
    assert_eq!(free["intent"], "export_report");
    assert_eq!(free["quick_replies"], json!(["View Premium", "Subscribe"]));
    assert_eq!(free["tips"], json!([]));
    assert_eq!(premium["quick_replies"], json!(["Export CSV", "Export PDF"]));
}

#[tokio::test]
async fn unreachable_gemini_falls_back_to_rule_reply() {
    let config = ChatbotConfig {
        mock_mode: false,
        use_gemini: true,
        gemini_api_key: "test-key".to_string(),
        gemini_endpoint: "http://127.0.0.1:9".to_string(),
        gemini_timeout: Duration::from_secs(2),
        ..ChatbotConfig::default()
    };
    let app = app_with(config).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/chatbot/chat",
            json!({ "message": "I want to reduce my carbon emission" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = body_json(response).await;
    let expected = select_response(Intent::CalculateEmission, false);
    assert_eq!(parsed["intent"], "calculate_emission");
    assert_eq!(parsed["source"], "rules");
    assert_eq!(parsed["text"], expected.text);
    assert_eq!(parsed["quick_replies"], json!(expected.quick_replies));

    let health = body_json(app.oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(health["gemini_enabled"], true);
    assert_eq!(health["metrics"]["generative_fallback_total"], 1);
}

#[tokio::test]
async fn intents_catalog_lists_patterns() {
    let app = app_with(ChatbotConfig::default()).await;

    let response = app.oneshot(get("/chatbot/intents")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = body_json(response).await;
    assert_eq!(parsed["intents"].as_array().unwrap().len(), 8);
    assert_eq!(parsed["intents"][0], "calculate_emission");
    assert_eq!(parsed["patterns"]["set_goal"][3], "aim for");
}

#[tokio::test]
async fn conversation_save_and_fetch_is_last_write_wins() {
    let app = app_with(ChatbotConfig::default()).await;

    for content in ["first draft", "second draft"] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/chatbot/conversation",
                json!({
                    "userId": "user-42",
                    "conversation": [
                        { "role": "user", "content": content },
                        { "role": "assistant", "text": "noted" }
                    ]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], true);
    }

    let parsed = body_json(
        app.clone()
            .oneshot(get("/chatbot/conversation/user-42"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(parsed["conversation"].as_array().unwrap().len(), 2);
    assert_eq!(parsed["conversation"][0]["content"], "second draft");
    assert_eq!(parsed["conversation"][1]["content"], "noted");

    let unknown = body_json(app.oneshot(get("/chatbot/conversation/nobody")).await.unwrap()).await;
    assert_eq!(unknown["conversation"], json!([]));
}

#[tokio::test]
async fn chat_with_user_id_records_history() {
    let app = app_with(ChatbotConfig::default()).await;

    app.clone()
        .oneshot(post_json(
            "/chatbot/chat",
            json!({ "message": "set a goal", "userId": "user-9" }),
        ))
        .await
        .unwrap();

    let parsed = body_json(app.oneshot(get("/chatbot/conversation/user-9")).await.unwrap()).await;
    assert_eq!(parsed["conversation"][0]["role"], "user");
    assert_eq!(parsed["conversation"][0]["content"], "set a goal");
    assert_eq!(parsed["conversation"][1]["role"], "assistant");
}

#[tokio::test]
async fn premium_plan_is_gated_outside_mock_mode() {
    let live = app_with(live_config()).await;
    let body = json!({
        "userId": "user-1",
        "userData": { "is_premium": false, "monthly_co2e": 1.0 }
    });

    let response = live
        .clone()
        .oneshot(post_json("/chatbot/premium/plan", body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Premium subscription required");

    let premium = live
        .oneshot(post_json(
            "/chatbot/premium/plan",
            json!({ "userData": { "is_premium": true, "monthly_co2e": 2.0, "goal_reduction_percent": 50 } }),
        ))
        .await
        .unwrap();
    assert_eq!(premium.status(), StatusCode::OK);
    let plan = body_json(premium).await;
    assert_eq!(plan["target_monthly_emissions"], 1.0);
    assert_eq!(plan["timeline_months"], 3);
    assert_eq!(plan["steps"][2]["focus"], "Food");

    let mock = app_with(ChatbotConfig::default()).await;
    let response = mock
        .oneshot(post_json("/chatbot/premium/plan", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_routes_return_json_404() {
    let app = app_with(ChatbotConfig::default()).await;

    let response = app.oneshot(get("/chatbot/unknown")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Not found");
}

#[tokio::test]
async fn requests_beyond_limit_are_rejected() {
    let app = app_with(ChatbotConfig {
        rate_limit_max: 2,
        ..ChatbotConfig::default()
    })
    .await;

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/chatbot/intents")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(get("/chatbot/intents")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let health = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}
