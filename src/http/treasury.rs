use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::models::treasury::{
    TransactionCreateRequest, TransactionReviewRequest, TransactionReviewResponse,
};
use crate::state::AppState;
use crate::store::{NewTransaction, TransactionRecord, TransactionStatus, TreasurySummary};

use super::HttpError;

const MAX_TRANSACTION_LIMIT: usize = 500;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(get_transactions).post(create_transaction))
        .route("/transactions/{transaction_id}", get(get_transaction))
        .route("/transactions/{transaction_id}/review", post(review_transaction))
        .route("/summary", get(get_summary))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TransactionsQuery {
    status: Option<TransactionStatus>,
    limit: Option<usize>,
}

async fn get_transactions(
    Query(query): Query<TransactionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<TransactionRecord>>, HttpError> {
    let limit = query.limit.unwrap_or(100);
    if limit == 0 {
        return Err(HttpError::bad_request("limit must be positive"));
    }
    let limit = limit.min(MAX_TRANSACTION_LIMIT);

    let store = state.store.read().await;
    let transactions = store
        .transactions(query.status)
        .into_iter()
        .take(limit)
        .cloned()
        .collect::<Vec<_>>();
    Ok(Json(transactions))
}

async fn get_transaction(
    Path(transaction_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<TransactionRecord>, HttpError> {
    let store = state.store.read().await;
    let record = store.transaction(transaction_id)?.clone();
    Ok(Json(record))
}

async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<TransactionCreateRequest>,
) -> Result<(StatusCode, Json<TransactionRecord>), HttpError> {
    let new = NewTransaction {
        kind: request.kind,
        amount: request.amount,
        counterparty: request.counterparty,
        description: request.description,
    };
    let record = state
        .store
        .write()
        .await
        .record_transaction(new, Utc::now())?
        .clone();

    state.cache.invalidate();
    Ok((StatusCode::CREATED, Json(record)))
}

async fn review_transaction(
    Path(transaction_id): Path<i64>,
    State(state): State<AppState>,
    Json(request): Json<TransactionReviewRequest>,
) -> Result<Json<TransactionReviewResponse>, HttpError> {
    let now = Utc::now();
    let mut store = state.store.write().await;
    let transaction = store
        .review_transaction(transaction_id, request.decision, now)?
        .clone();
    let summary = store.treasury_summary(now);
    drop(store);

    state.cache.invalidate();
    Ok(Json(TransactionReviewResponse {
        transaction,
        summary,
    }))
}

async fn get_summary(State(state): State<AppState>) -> Result<Json<TreasurySummary>, HttpError> {
    let summary = state.store.read().await.treasury_summary(Utc::now());
    Ok(Json(summary))
}
