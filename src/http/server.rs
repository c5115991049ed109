//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the `/api` handlers
//! - Wire up middleware (API logger, panic recovery, CORS, timeout,
//!   request ID, tracing)
//! - Apply configuration reloads to the shared snapshot
//! - Bind server to listener and shut down on Ctrl+C

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AppConfig, CorsConfig, SharedConfig};
use crate::diagnostics::{BlobStore, DiagnosticsProbe, RecordStore};
use crate::http::error::panic_response;
use crate::http::handlers;
use crate::http::middleware::{api_logger_middleware, ApiLoggerState};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::observability::ApiLogChannel;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: SharedConfig,
    pub probe: Arc<DiagnosticsProbe>,
}

/// HTTP server for the API surface.
pub struct HttpServer {
    router: Router,
    config: SharedConfig,
}

impl HttpServer {
    pub fn new(
        config: SharedConfig,
        channel: Arc<ApiLogChannel>,
        store: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let probe = Arc::new(DiagnosticsProbe::new(config.clone(), store, blobs));
        let state = AppState {
            config: config.clone(),
            probe,
        };

        let snapshot = config.load_full();
        let logger = ApiLoggerState::new(channel, snapshot.security.max_body_size);
        let router = Self::build_router(&snapshot, state, logger);

        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState, logger: ApiLoggerState) -> Router {
        let api = Router::new()
            .route("/diagnostics", get(handlers::diagnostics))
            .route("/debug", get(handlers::debug))
            .route("/register-test", post(handlers::register_test))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_upload_size))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(middleware::from_fn_with_state(logger, api_logger_middleware));

        Router::new()
            .nest("/api", api)
            .layer(cors_layer(&config.cors))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http())
    }

    /// Router with every layer applied, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configurations received on `updates` replace the shared snapshot.
    pub async fn run(
        self,
        listener: TcpListener,
        mut updates: mpsc::UnboundedReceiver<AppConfig>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let shared = self.config.clone();
        tokio::spawn(async move {
            while let Some(next) = updates.recv().await {
                tracing::info!(env = %next.app.env, "Configuration reloaded");
                shared.store(Arc::new(next));
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// CORS policy from configuration. A `"*"` entry allows anything for
/// that dimension; unparseable entries are skipped with a warning.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let wildcard = |values: &[String]| values.iter().any(|v| v == "*");

    let origins = if wildcard(&config.allowed_origins) {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parse_all(&config.allowed_origins, |v| v.parse::<HeaderValue>().ok()))
    };
    let methods = if wildcard(&config.allowed_methods) {
        AllowMethods::any()
    } else {
        AllowMethods::list(parse_all(&config.allowed_methods, |v| {
            Method::from_bytes(v.to_ascii_uppercase().as_bytes()).ok()
        }))
    };
    let headers = if wildcard(&config.allowed_headers) {
        AllowHeaders::any()
    } else {
        AllowHeaders::list(parse_all(&config.allowed_headers, |v| v.parse::<HeaderName>().ok()))
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
}

fn parse_all<T>(values: &[String], parse: impl Fn(&str) -> Option<T>) -> Vec<T> {
    values
        .iter()
        .filter_map(|v| {
            let parsed = parse(v);
            if parsed.is_none() {
                tracing::warn!(value = %v, "Ignoring invalid CORS entry");
            }
            parsed
        })
        .collect()
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
