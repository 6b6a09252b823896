mod config;
mod db;
mod documents;
mod errors;
mod llm_client;
mod routes;
mod scheduling;
mod screening;
mod state;
mod storage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{CompletionProvider, GeminiClient, OpenAiClient};
use crate::routes::build_router;
use crate::scheduling::{InterviewScheduler, LogNotifier};
use crate::screening::orchestrator::{AnalysisOrchestrator, ProviderState};
use crate::state::AppState;
use crate::storage::{CandidateStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed numeric env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    // Storage: Postgres when configured, in-memory otherwise
    let store: Arc<dyn CandidateStore> = match &config.database_url {
        Some(url) => {
            let pg = PgStore::new(create_pool(url).await?);
            pg.ensure_schema().await?;
            Arc::new(pg)
        }
        None => {
            info!("DATABASE_URL not set; candidates are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    // AI providers, in priority order
    let primary = config.gemini_api_key.clone().map(|key| {
        Arc::new(GeminiClient::new(key, config.gemini_model.clone())) as Arc<dyn CompletionProvider>
    });
    let secondary = config.openai_api_key.clone().map(|key| {
        Arc::new(OpenAiClient::new(key, config.openai_model.clone())) as Arc<dyn CompletionProvider>
    });
    let provider_state = Arc::new(ProviderState::new(config.initial_mode()));
    let orchestrator = Arc::new(AnalysisOrchestrator::new(
        primary,
        secondary,
        provider_state,
        config.resume_excerpt_chars,
    ));

    // No calendar or mail transport is wired by default: slots come from the
    // working-hours window and invitations are only logged.
    let scheduler = Arc::new(InterviewScheduler::new(
        Arc::clone(&store),
        Arc::clone(&orchestrator),
        None,
        Arc::new(LogNotifier),
        config.interview,
    ));
    warn!("No mail transport configured; interview invitations are logged, not delivered");
    info!(
        "Interview window: {} days, {}:00-{}:00, up to {} slots",
        config.interview.window_days,
        config.interview.start_hour,
        config.interview.end_hour,
        config.interview.max_slots
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        store,
        orchestrator,
        scheduler,
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict origins once the frontend host is fixed
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
