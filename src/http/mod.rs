use std::sync::atomic::Ordering as AtomicOrdering;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::state::AppState;
use crate::store::StoreError;

mod configuration;
mod dashboard;
mod forecasts;
mod notifications;
mod reports;
mod treasury;
mod votes;

#[cfg(test)]
mod tests;

pub fn router(state: AppState) -> Router {
    // Dashboard front-ends are served from other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let votes_router = votes::router().with_state(state.clone());
    let treasury_router = treasury::router().with_state(state.clone());
    let forecasts_router = forecasts::router().with_state(state.clone());
    let notifications_router = notifications::router().with_state(state.clone());
    let configuration_router = configuration::router().with_state(state.clone());
    let reports_router = reports::router().with_state(state.clone());
    Router::new()
        .route("/health", get(health_live))
        .route("/health/ready", get(health_ready))
        .route("/dashboard", get(dashboard::get_dashboard))
        .nest("/votes", votes_router)
        .nest("/treasury", treasury_router)
        .nest("/forecasts", forecasts_router)
        .nest("/notifications", notifications_router)
        .nest("/configuration", configuration_router)
        .nest("/reports", reports_router)
        .layer(cors)
        .with_state(state)
}

async fn health_live(State(state): State<AppState>) -> Result<Json<HealthResponse>, HttpError> {
    let uptime = state.start_time.elapsed().as_secs();
    let response = HealthResponse {
        status: "live",
        uptime_seconds: uptime,
    };
    Ok(Json(response))
}

async fn health_ready(State(state): State<AppState>) -> Result<Json<ReadyResponse>, HttpError> {
    let store = state.store.read().await;
    let stats = store.vote_stats();
    let response = ReadyResponse {
        status: "ready",
        propositions: stats.total,
        quorum_percent: store.tally_engine().quorum_percent(),
        pending_notifications: store.pending_notifications(),
        reminders_enabled: state.reminders_enabled.load(AtomicOrdering::SeqCst),
        cached_summaries: state.cache.summaries.entry_count(),
    };
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
struct ReadyResponse {
    status: &'static str,
    propositions: usize,
    quorum_percent: u32,
    pending_notifications: usize,
    reminders_enabled: bool,
    cached_summaries: u64,
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: String) -> Self {
        assert!(status != StatusCode::OK, "Error status cannot be 200");
        assert!(!message.is_empty(), "Error message cannot be empty");
        Self { status, message }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into())
    }
}

impl From<StoreError> for HttpError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::PropositionNotFound(_)
            | StoreError::TransactionNotFound(_)
            | StoreError::ForecastNotFound(_)
            | StoreError::NotificationNotFound(_)
            | StoreError::ReportNotFound(_) => StatusCode::NOT_FOUND,
            StoreError::DuplicateBallot { .. }
            | StoreError::AlreadyReviewed { .. }
            | StoreError::ForecastCancelled(_) => StatusCode::CONFLICT,
            StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
            StoreError::Parameters(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        info!("HTTP error: {}", self.message);
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}
