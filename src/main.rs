//! Agent Chat - conversational client for a remote agent service
//!
//! Keeps one session's message history, binds a staged file's metadata to the
//! next message, forwards each turn to the agent endpoint and exposes the
//! history to rendering sinks over HTTP and SSE.

mod agent;
mod api;
mod config;
mod render;
mod session;

use agent::{AgentClient, HttpAgentClient, LoggingClient, SimulatedAgentClient};
use api::{create_router, AppState};
use config::ChatConfig;
use session::{Session, SessionContext};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agent_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ChatConfig::from_env();

    let client: Arc<dyn AgentClient> = if config.simulate {
        tracing::warn!("AGENT_SIMULATE set; replies are generated locally");
        Arc::new(SimulatedAgentClient::default())
    } else {
        Arc::new(HttpAgentClient::new(
            config.endpoint_url.clone(),
            config.request_timeout,
        )?)
    };
    let client: Arc<dyn AgentClient> = Arc::new(LoggingClient::new(client));

    let context = SessionContext::new(config.session_id.clone(), client.endpoint());
    tracing::info!(
        session_id = %context.session_id(),
        endpoint = %context.endpoint_url(),
        timeout_secs = config.request_timeout.as_secs(),
        "Chat session initialized"
    );
    let session = Arc::new(Session::new(context, client, config.request_timeout));

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(AppState::new(session))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Agent chat listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
