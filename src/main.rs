use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use connections::{
    generator::LlmPuzzleGenerator,
    judge::LlmJudge,
    llm::{self, LlmManager},
    state::AppState,
    types::TimingConfig,
};

/// 6573 is ascii for "AI"
const DEFAULT_PORT: u16 = 6573;

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "connections=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Connections...");

    let llm_config = llm::LlmConfig::from_env();
    let llm_manager = match llm_config.build_manager() {
        Ok(manager) => {
            let names: Vec<&str> = manager.providers.iter().map(|p| p.name()).collect();
            tracing::info!("LLM providers initialized: {:?}", names);
            manager
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize LLM providers: {}. Rounds will fail until one is configured.",
                e
            );
            LlmManager::new(Vec::new())
        }
    };
    let llm_manager = Arc::new(llm_manager);

    let generator = LlmPuzzleGenerator::new(
        llm_manager.clone(),
        llm_config.generator_model.clone(),
        llm_config.default_timeout,
    );
    let judge = LlmJudge::new(
        llm_manager,
        llm_config.judge_model.clone(),
        llm_config.default_timeout,
    );

    let state = Arc::new(AppState::new(
        Arc::new(generator),
        Arc::new(judge),
        TimingConfig::from_env(),
    ));

    // Have a puzzle ready for the first visitor
    state.spawn_round();

    let app = connections::app(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
