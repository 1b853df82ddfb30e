//! HTTP server exposing `/probe`, the landing page and the exporter's own metrics.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::collector::OPENMETRICS_CONTENT_TYPE;
use crate::error::ProbeError;
use crate::metrics::ExporterMetrics;
use crate::params::ProbeRequest;
use crate::probe::Prober;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    prober: Arc<Prober>,
    metrics: Arc<ExporterMetrics>,
    field_prefix: Arc<str>,
    metrics_path: Arc<str>,
}

impl AppState {
    pub fn new(
        prober: Prober,
        metrics: Arc<ExporterMetrics>,
        field_prefix: &str,
        metrics_path: &str,
    ) -> Self {
        Self {
            prober: Arc::new(prober),
            metrics,
            field_prefix: Arc::from(field_prefix),
            metrics_path: Arc::from(metrics_path),
        }
    }
}

/// Create the HTTP router.
pub fn create_router(state: AppState) -> Router {
    let metrics_path = state.metrics_path.to_string();

    Router::new()
        .route("/", get(index_handler))
        .route("/probe", get(probe_handler))
        .route(&metrics_path, get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl IntoResponse for ProbeError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            [("content-type", "text/plain; charset=utf-8")],
            format!("{}\n", self),
        )
            .into_response()
    }
}

/// Handler for the landing page.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        r#"<html>
<head><title>Json Exporter</title></head>
<body>
<h1>Json Exporter</h1>
<p><a href="/probe">Run a probe</a></p>
<p><a href="{}">Metrics</a></p>
</body>
</html>
"#,
        state.metrics_path
    ))
}

/// Handler for the /probe endpoint.
async fn probe_handler(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let request = match ProbeRequest::from_query(&params, &state.field_prefix) {
        Ok(request) => request,
        Err(e) => {
            debug!(kind = e.kind(), error = %e, "Probe rejected");
            state.metrics.reject(&e);
            return e.into_response();
        }
    };

    debug!(
        url = %request.target,
        fields = request.fields.len(),
        "Probing target"
    );

    let started = Instant::now();
    let result = state.prober.probe(&request).await;
    state
        .metrics
        .observe(result.as_ref().map(|_| ()), started.elapsed());

    match result {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", OPENMETRICS_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            if e.is_upstream() {
                warn!(kind = e.kind(), error = %e, "Probe failed");
            } else {
                debug!(kind = e.kind(), error = ?e, "Probe rejected");
            }
            e.into_response()
        }
    }
}

/// Handler for the exporter's own metrics.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", OPENMETRICS_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics\n").into_response(),
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// HTTP server configuration.
pub struct HttpServer {
    state: AppState,
    listen_addr: SocketAddr,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(state: AppState, listen_addr: SocketAddr) -> Self {
        Self { state, listen_addr }
    }

    /// Run the HTTP server until the shutdown signal is received.
    ///
    /// Fails immediately if the listen address cannot be bound.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let router = create_router(self.state);

        info!(addr = %self.listen_addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        info!(addr = %self.listen_addr, "HTTP server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
