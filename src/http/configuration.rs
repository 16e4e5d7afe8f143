use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::models::configuration::{ConfigurationUpdateRequest, ConfigurationView};
use crate::state::AppState;

use super::HttpError;

const MAX_CHANGES_PER_REQUEST: usize = 64;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_configuration).put(update_configuration))
}

async fn get_configuration(
    State(state): State<AppState>,
) -> Result<Json<ConfigurationView>, HttpError> {
    let parameters = state.store.read().await.parameters().all().to_vec();
    Ok(Json(ConfigurationView {
        parameters,
        changed: Vec::new(),
    }))
}

/// Applies every change or none of them.
async fn update_configuration(
    State(state): State<AppState>,
    Json(request): Json<ConfigurationUpdateRequest>,
) -> Result<Json<ConfigurationView>, HttpError> {
    if request.changes.is_empty() {
        return Err(HttpError::bad_request("changes must not be empty"));
    }
    if request.changes.len() > MAX_CHANGES_PER_REQUEST {
        return Err(HttpError::bad_request(format!(
            "at most {MAX_CHANGES_PER_REQUEST} changes per request"
        )));
    }

    let changes = request
        .changes
        .into_iter()
        .map(|change| (change.id.trim().to_string(), change.value))
        .collect::<Vec<_>>();

    let mut store = state.store.write().await;
    let changed = store.update_parameters(&changes, Utc::now())?;
    let parameters = store.parameters().all().to_vec();
    drop(store);

    state.cache.invalidate();
    Ok(Json(ConfigurationView {
        parameters,
        changed,
    }))
}
