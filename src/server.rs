use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::{Deserialize, Serialize};
use tower::limit::ConcurrencyLimitLayer;

use crate::config::ServerConfig;
use crate::data::{ConflictReport, ConflictType, SchedulerInput, SchedulerResult};
use crate::error::ScheduleError;
use crate::report::{FormattedConflict, NameLookup, format_conflicts, summarize_conflicts};
use crate::solver::Scheduler;

#[derive(Debug, Clone)]
pub struct AppState {
    scheduler: Arc<Scheduler>,
}

impl AppState {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler: Arc::new(scheduler),
        }
    }
}

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(ScheduleError),
    Internal(String),
}

impl From<ScheduleError> for AppError {
    fn from(e: ScheduleError) -> Self {
        AppError::BadRequest(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest(e) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", e.to_string()),
            AppError::Internal(msg) => {
                error!("internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };
        let body = ApiError {
            code: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub conflicts: Vec<ConflictReport>,
    #[serde(flatten)]
    pub names: NameLookup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub conflicts: Vec<FormattedConflict>,
    pub summary: BTreeMap<ConflictType, usize>,
}

async fn solve_handler(
    State(state): State<AppState>,
    Json(input): Json<SchedulerInput>,
) -> Result<Json<SchedulerResult>, AppError> {
    // solving is CPU bound; keep it off the async workers
    let scheduler = Arc::clone(&state.scheduler);
    let result = tokio::task::spawn_blocking(move || scheduler.solve(&input))
        .await
        .map_err(|e| AppError::Internal(format!("solver task failed: {e}")))??;
    Ok(Json(result))
}

async fn report_handler(Json(request): Json<ReportRequest>) -> Json<ReportResponse> {
    Json(ReportResponse {
        conflicts: format_conflicts(&request.conflicts, &request.names),
        summary: summarize_conflicts(&request.conflicts),
    })
}

async fn health_handler() -> &'static str {
    "ok"
}

pub fn router(state: AppState, max_concurrent_solves: usize) -> Router {
    Router::new()
        .route(
            "/v1/timetable/solve",
            post(solve_handler).layer(ConcurrencyLimitLayer::new(max_concurrent_solves)),
        )
        .route("/v1/timetable/report", post(report_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn run_server(config: ServerConfig) -> Result<(), ScheduleError> {
    let scheduler = Scheduler::new(config.scheduler_config()?);
    let app = router(AppState::new(scheduler), config.max_concurrent_solves);

    let listener = tokio::net::TcpListener::bind(config.socket_addr()?).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
