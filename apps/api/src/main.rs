use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use consultant_api::config::Config;
use consultant_api::llm_client::GeminiClient;
use consultant_api::routes::build_app;
use consultant_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "consultant_api={level},tower_http={level}",
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Consultant API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = GeminiClient::from_config(&config)?;
    info!(
        "LLM client initialized (model: {}, timeout: {}s, attempts: {})",
        config.gemini_model, config.llm_timeout_secs, config.llm_max_attempts
    );

    // Question replies are read by the interpreter chosen here
    let question_interpreter = config.question_parse_mode.interpreter();
    info!("Question parse mode: {}", config.question_parse_mode);

    let state = AppState {
        llm: Arc::new(llm),
        question_interpreter,
    };

    let app = build_app(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
