use anyhow::Result;
use footprint_api::{build_app, ChatbotConfig};
use footprint_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("footprint_api");

    let config = ChatbotConfig::from_env();
    let bind = config.bind.clone();
    let mock_mode = config.mock_mode;
    let gemini_enabled = config.gemini_enabled();

    let app = build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(
        bind = %bind,
        mock_mode,
        gemini_enabled,
        "carbon footprint chatbot api started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
