//! HTTP API gateway for ChatArbor.
//!
//! The axum surface over the turn pipeline: chat (streamed or
//! whole-message), session state, knowledge-base administration, and
//! feedback ratings.

pub mod api;
pub mod feedback;

use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use axum::Router;
use chatarbor_agent::{SessionStore, TurnOrchestrator};
use chatarbor_config::AppConfig;
use chatarbor_core::document::DocumentStore;
use chatarbor_providers::ProviderFactory;
use chatarbor_retrieval::InMemoryDocumentStore;

use feedback::FeedbackReport;

/// Everything the request handlers share.
pub struct GatewayState {
    pub orchestrator: TurnOrchestrator,
    pub documents: Arc<dyn DocumentStore>,
    pub feedback: RwLock<Vec<FeedbackReport>>,
}

pub type SharedState = Arc<GatewayState>;

/// The full gateway router, with CORS and request tracing layered on.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    api::api_router(state)
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Wire the pipeline together and serve it until shutdown.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let factory = ProviderFactory::from_config(&config.api);
    let api_key = config.api.api_key.clone().unwrap_or_default();
    let provider = factory.provider(&api_key).await?;

    let documents: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    let tools = Arc::new(chatarbor_tools::default_registry());
    let sessions = Arc::new(SessionStore::new(config.api.model.clone()));

    let orchestrator = TurnOrchestrator::new(provider, documents.clone(), tools, sessions)
        .with_system_instruction(config.chat.system_instruction.clone())
        .with_history_window(config.chat.history_window)
        .with_top_k(config.retrieval.top_k)
        .with_temperature(config.api.temperature)
        .with_max_tokens(config.api.max_tokens);

    let state = Arc::new(GatewayState {
        orchestrator,
        documents,
        feedback: RwLock::new(Vec::new()),
    });

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "ChatArbor gateway listening");
    axum::serve(listener, router).await?;

    Ok(())
}
