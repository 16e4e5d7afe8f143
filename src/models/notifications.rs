use serde::{Deserialize, Serialize};

use crate::store::{NotificationLevel, NotificationRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRequest {
    pub event: String,
    pub message: String,
    pub recipient: String,
    #[serde(default)]
    pub level: Option<NotificationLevel>,
    #[serde(default)]
    pub awaiting_reply: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderResponse {
    pub notification: NotificationRecord,
    pub reminded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderToggle {
    pub enabled: bool,
}
