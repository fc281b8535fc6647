//! Minimal HTTP transport wrapping `AnalyzeFlightPrices`: health check,
//! the `/analyze` endpoint, and a Prometheus scrape route, built on
//! Axum and `tower-http`.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::AnalysisError;
use crate::orchestrator::{AnalysisOrchestrator, AnalysisRequest};
use crate::storage::Storage;

#[derive(Clone)]
struct AppState<S: Storage> {
    orchestrator: Arc<AnalysisOrchestrator<S>>,
}

fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}

/// Maps an `AnalysisError` to an HTTP response, honoring §7's policy
/// that only `Input`, `Storage(permanent)`, and `Timeout` are ever
/// surfaced to a caller. `is_surfaced()` is the single place that
/// decides this; a non-surfaced error reaching here degrades to a 503
/// instead of a hard 500.
fn error_response(err: AnalysisError) -> axum::response::Response {
    if !err.is_surfaced() {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": err.to_string() }))).into_response();
    }
    let status = match err {
        AnalysisError::Input { .. } => StatusCode::BAD_REQUEST,
        AnalysisError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        AnalysisError::Storage { .. } | AnalysisError::Upstream { .. } | AnalysisError::ModelUnavailable { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

async fn analyze<S: Storage>(State(state): State<AppState<S>>, Json(request): Json<AnalysisRequest>) -> axum::response::Response {
    let today = chrono::Utc::now().date_naive();
    match state.orchestrator.analyze(&request, today).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => {
            error!(error = %err, "analysis request failed");
            error_response(err)
        }
    }
}

/// Starts the `fareseer serve` HTTP transport. Runs until the listener
/// is dropped or the process is signaled.
pub async fn start_web_server<S: Storage>(interface: &str, port: u16, orchestrator: AnalysisOrchestrator<S>) -> anyhow::Result<()> {
    let metrics_handle = init_metrics();
    let state = AppState { orchestrator: Arc::new(orchestrator) };

    let metrics_router = Router::new().route("/metrics", get(metrics_handler)).with_state(metrics_handle);

    let app = Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(format!("{interface}:{port}")).await?;
    info!("fareseer listening on http://{interface}:{port}");
    axum::serve(listener, app).await?;
    Ok(())
}
