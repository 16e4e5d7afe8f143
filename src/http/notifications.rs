use std::sync::atomic::Ordering as AtomicOrdering;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::models::notifications::{EventRequest, ReminderResponse, ReminderToggle};
use crate::state::AppState;
use crate::store::{NewNotification, NotificationLevel, NotificationRecord, NotificationStatus};

use super::HttpError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_notifications))
        .route("/events", post(trigger_event))
        .route("/{notification_id}/read", post(mark_read))
        .route("/{notification_id}/remind", post(remind))
        .route("/reminders", get(get_reminders).put(set_reminders))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct NotificationsQuery {
    status: Option<NotificationStatus>,
}

async fn get_notifications(
    Query(query): Query<NotificationsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<NotificationRecord>>, HttpError> {
    let store = state.store.read().await;
    let notifications = store
        .notifications(query.status)
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();
    Ok(Json(notifications))
}

async fn trigger_event(
    State(state): State<AppState>,
    Json(request): Json<EventRequest>,
) -> Result<(StatusCode, Json<NotificationRecord>), HttpError> {
    let new = NewNotification {
        event: request.event,
        message: request.message,
        recipient: request.recipient,
        level: request.level.unwrap_or(NotificationLevel::Info),
        awaiting_reply: request.awaiting_reply,
    };
    let record = state
        .store
        .write()
        .await
        .trigger_event(new, Utc::now())?
        .clone();
    state.cache.invalidate();
    Ok((StatusCode::CREATED, Json(record)))
}

async fn mark_read(
    Path(notification_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<NotificationRecord>, HttpError> {
    let record = state
        .store
        .write()
        .await
        .mark_read(notification_id)?
        .clone();
    state.cache.invalidate();
    Ok(Json(record))
}

async fn remind(
    Path(notification_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ReminderResponse>, HttpError> {
    let outcome = state
        .store
        .write()
        .await
        .remind(notification_id, Utc::now())?;
    Ok(Json(ReminderResponse {
        notification: outcome.notification,
        reminded: outcome.reminded,
    }))
}

async fn get_reminders(State(state): State<AppState>) -> Json<ReminderToggle> {
    Json(ReminderToggle {
        enabled: state.reminders_enabled.load(AtomicOrdering::SeqCst),
    })
}

async fn set_reminders(
    State(state): State<AppState>,
    Json(toggle): Json<ReminderToggle>,
) -> Json<ReminderToggle> {
    state
        .reminders_enabled
        .store(toggle.enabled, AtomicOrdering::SeqCst);
    info!("Automatic reminders set to {}", toggle.enabled);
    Json(toggle)
}
