use crate::config::Config;
use crate::session::Session;
use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    Router,
};
use mvgraph_compiler::{ConvertOptions, ParameterBindings};
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

mod error;
pub mod routes_graph;
pub mod routes_params;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub session: Session,
    pub config: Arc<Config>,
    /// Default parameter bindings (can be replaced via API)
    pub params: Arc<RwLock<ParameterBindings>>,
    /// Converter settings derived from the engine config
    pub options: Arc<ConvertOptions>,
}

impl AppContext {
    pub fn new(session: Session, config: Config) -> Self {
        Self {
            session,
            params: Arc::new(RwLock::new(config.graph.params.clone())),
            options: Arc::new(config.engine.convert_options()),
            config: Arc::new(config),
        }
    }

    /// Default bindings overlaid with per-request ones.
    pub fn bindings(&self, overrides: &ParameterBindings) -> ParameterBindings {
        let mut bindings = self.params.read().clone();
        bindings.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        bindings
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .merge(routes_params::params_routes())
        .nest("/graph", routes_graph::graph_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Start the HTTP server and serve until a shutdown signal arrives
pub async fn start_server(ctx: AppContext) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", ctx.config.server.host, ctx.config.server.port)
        .parse()
        .context("Invalid server address")?;

    let session = ctx.session.clone();
    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = session.destroy().await {
        tracing::warn!("Failed to destroy graph on shutdown: {}", e);
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
