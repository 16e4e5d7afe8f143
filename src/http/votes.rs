use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::models::votes::{
    BallotRequest, BallotResponse, PropositionCreateRequest, PropositionView,
};
use crate::state::AppState;
use crate::store::{NewProposition, VoteStats};
use crate::tally::PropositionStatus;

use super::HttpError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/propositions", get(get_propositions).post(create_proposition))
        .route("/propositions/{proposition_id}", get(get_proposition))
        .route("/ballots", post(submit_ballot))
        .route("/stats", get(get_vote_stats))
}

#[derive(Debug, Deserialize)]
struct GetPropositionsQuery {
    #[serde(alias = "state")]
    status: Option<PropositionStatus>,
    voter: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PropositionDetailQuery {
    voter: Option<String>,
}

async fn get_propositions(
    Query(query): Query<GetPropositionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<PropositionView>>, HttpError> {
    let store = state.store.read().await;
    let engine = store.tally_engine();
    let views = store
        .propositions(query.status)
        .into_iter()
        .map(|record| PropositionView::from_record(record, engine, query.voter.as_deref()))
        .collect::<Vec<_>>();
    Ok(Json(views))
}

async fn get_proposition(
    Path(proposition_id): Path<i64>,
    Query(detail): Query<PropositionDetailQuery>,
    State(state): State<AppState>,
) -> Result<Json<PropositionView>, HttpError> {
    let store = state.store.read().await;
    let record = store.proposition(proposition_id)?;
    let view = PropositionView::from_record(record, store.tally_engine(), detail.voter.as_deref());
    Ok(Json(view))
}

async fn create_proposition(
    State(state): State<AppState>,
    Json(request): Json<PropositionCreateRequest>,
) -> Result<(StatusCode, Json<PropositionView>), HttpError> {
    let new = NewProposition {
        description: request.description,
        amount: request.amount,
        kind: request.kind,
        total_voters: request.total_voters,
        expires_on: request.expires_on,
        votes_for: request.votes_for.unwrap_or(0),
        votes_against: request.votes_against.unwrap_or(0),
    };

    let mut store = state.store.write().await;
    let engine = store.tally_engine();
    let record = store.create_proposition(new, Utc::now().date_naive())?;
    let view = PropositionView::from_record(record, engine, None);
    drop(store);

    state.cache.invalidate();
    Ok((StatusCode::CREATED, Json(view)))
}

async fn submit_ballot(
    State(state): State<AppState>,
    Json(request): Json<BallotRequest>,
) -> Result<Json<BallotResponse>, HttpError> {
    let approve = resolve_approval(&request)?;

    let voter = request.voter.trim();
    let outcome = state.store.write().await.cast_ballot(
        request.proposition_id,
        voter,
        approve,
        Utc::now(),
    )?;

    if outcome.accepted {
        state.cache.invalidate();
    }
    if outcome.resolved {
        info!(
            "Ballot from {voter} closed proposition {}",
            request.proposition_id
        );
    }

    let tally = outcome.proposition.tally;
    let response = BallotResponse {
        proposition_id: tally.id,
        status: tally.status,
        result: tally.result,
        votes_for: tally.votes_for,
        votes_against: tally.votes_against,
        voter: voter.to_string(),
        approve,
        accepted: outcome.accepted,
        finalized: tally.status.is_terminal(),
    };

    Ok(Json(response))
}

async fn get_vote_stats(State(state): State<AppState>) -> Result<Json<VoteStats>, HttpError> {
    let stats = state.store.read().await.vote_stats();
    Ok(Json(stats))
}

fn resolve_approval(request: &BallotRequest) -> Result<bool, HttpError> {
    if let Some(approve) = request.approve {
        return Ok(approve);
    }

    if let Some(option) = request.option.as_ref() {
        let normalized = option.trim().to_ascii_lowercase();
        return match normalized.as_str() {
            "yes" | "for" | "approve" => Ok(true),
            "no" | "against" | "reject" => Ok(false),
            _ => Err(HttpError::bad_request(format!(
                "Unsupported vote option {normalized}"
            ))),
        };
    }

    Err(HttpError::bad_request("approve or option must be provided"))
}
