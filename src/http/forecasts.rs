use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::models::forecasts::ForecastListView;
use crate::state::AppState;
use crate::store::{BudgetKind, ForecastDraft, ForecastRecord, ForecastTotals};

use super::HttpError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_forecasts).post(create_forecast))
        .route(
            "/{forecast_id}",
            get(get_forecast).put(update_forecast).delete(delete_forecast),
        )
        .route("/{forecast_id}/cancel", post(cancel_forecast))
        .route("/totals", get(get_totals))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ForecastsQuery {
    kind: Option<BudgetKind>,
}

async fn get_forecasts(
    Query(query): Query<ForecastsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ForecastListView>, HttpError> {
    let store = state.store.read().await;
    let forecasts = store
        .forecasts(query.kind)
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();
    Ok(Json(ForecastListView {
        forecasts,
        totals: store.forecast_totals(),
    }))
}

async fn get_forecast(
    Path(forecast_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ForecastRecord>, HttpError> {
    let record = state.store.read().await.forecast(forecast_id)?.clone();
    Ok(Json(record))
}

async fn create_forecast(
    State(state): State<AppState>,
    Json(draft): Json<ForecastDraft>,
) -> Result<(StatusCode, Json<ForecastRecord>), HttpError> {
    let record = state
        .store
        .write()
        .await
        .create_forecast(draft, Utc::now().date_naive())?
        .clone();
    state.cache.invalidate();
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_forecast(
    Path(forecast_id): Path<i64>,
    State(state): State<AppState>,
    Json(draft): Json<ForecastDraft>,
) -> Result<Json<ForecastRecord>, HttpError> {
    let record = state
        .store
        .write()
        .await
        .update_forecast(forecast_id, draft)?
        .clone();
    state.cache.invalidate();
    Ok(Json(record))
}

async fn cancel_forecast(
    Path(forecast_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ForecastRecord>, HttpError> {
    let record = state
        .store
        .write()
        .await
        .cancel_forecast(forecast_id)?
        .clone();
    state.cache.invalidate();
    Ok(Json(record))
}

async fn delete_forecast(
    Path(forecast_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<StatusCode, HttpError> {
    state.store.write().await.delete_forecast(forecast_id)?;
    state.cache.invalidate();
    Ok(StatusCode::NO_CONTENT)
}

async fn get_totals(State(state): State<AppState>) -> Result<Json<ForecastTotals>, HttpError> {
    let totals = state.store.read().await.forecast_totals();
    Ok(Json(totals))
}
