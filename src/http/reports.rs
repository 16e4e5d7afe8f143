use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::models::reports::{ReportListView, ReportRequest};
use crate::state::AppState;
use crate::store::{NewReport, ReportFormat, ReportKind, ReportRecord, ReportStats};

use super::HttpError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_reports).post(request_report))
        .route("/{report_id}", get(get_report))
        .route("/stats", get(get_stats))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ReportsQuery {
    kind: Option<ReportKind>,
    format: Option<ReportFormat>,
}

async fn get_reports(
    Query(query): Query<ReportsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ReportListView>, HttpError> {
    let store = state.store.read().await;
    let reports = store
        .reports(query.kind, query.format)
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();
    Ok(Json(ReportListView {
        reports,
        stats: store.report_stats(),
    }))
}

async fn get_report(
    Path(report_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ReportRecord>, HttpError> {
    let record = state.store.read().await.report(report_id)?.clone();
    Ok(Json(record))
}

/// Queues a report; the background worker renders it on its next tick.
async fn request_report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<(StatusCode, Json<ReportRecord>), HttpError> {
    let new = NewReport {
        kind: request.kind,
        format: request.format,
        period: request.period,
    };
    let record = state
        .store
        .write()
        .await
        .request_report(new, Utc::now())?
        .clone();
    Ok((StatusCode::ACCEPTED, Json(record)))
}

async fn get_stats(State(state): State<AppState>) -> Result<Json<ReportStats>, HttpError> {
    let stats = state.store.read().await.report_stats();
    Ok(Json(stats))
}
