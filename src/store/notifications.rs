use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{LedgerStore, MAX_DESCRIPTION_LEN, MAX_PARTY_LEN, StoreError, require_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Warning,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    Read,
    Pending,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationRecord {
    pub id: i64,
    pub message: String,
    pub sent_at: DateTime<Utc>,
    pub level: NotificationLevel,
    pub recipient: String,
    pub status: NotificationStatus,
    pub event: String,
    pub reminder_count: u32,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub event: String,
    pub message: String,
    pub recipient: String,
    pub level: NotificationLevel,
    /// Pending notifications wait for an answer and are eligible for reminders.
    pub awaiting_reply: bool,
}

/// When and how often an unanswered notification is re-sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderPolicy {
    pub resend_after: Duration,
    pub max_reminders: u32,
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self {
            resend_after: Duration::hours(24),
            max_reminders: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReminderOutcome {
    pub notification: NotificationRecord,
    pub reminded: bool,
}

impl LedgerStore {
    pub fn trigger_event(
        &mut self,
        new: NewNotification,
        now: DateTime<Utc>,
    ) -> Result<&NotificationRecord, StoreError> {
        let event = require_text("event", &new.event, MAX_PARTY_LEN)?;
        let message = require_text("message", &new.message, MAX_DESCRIPTION_LEN)?;
        let recipient = require_text("recipient", &new.recipient, MAX_PARTY_LEN)?;

        let id = self.allocate_id();
        let status = if new.awaiting_reply {
            NotificationStatus::Pending
        } else {
            NotificationStatus::Sent
        };
        let record = NotificationRecord {
            id,
            message,
            sent_at: now,
            level: new.level,
            recipient,
            status,
            event,
            reminder_count: 0,
        };
        info!("Notification {id} sent for event {}", record.event);
        let record = self.notifications.entry(id).or_insert(record);
        Ok(&*record)
    }

    pub fn mark_read(&mut self, id: i64) -> Result<&NotificationRecord, StoreError> {
        let record = self
            .notifications
            .get_mut(&id)
            .ok_or(StoreError::NotificationNotFound(id))?;
        record.status = NotificationStatus::Read;
        Ok(&*record)
    }

    /// Re-sends a notification by hand. Only pending notifications move.
    pub fn remind(&mut self, id: i64, now: DateTime<Utc>) -> Result<ReminderOutcome, StoreError> {
        let record = self
            .notifications
            .get_mut(&id)
            .ok_or(StoreError::NotificationNotFound(id))?;

        if record.status != NotificationStatus::Pending {
            debug!("Notification {id} is not pending; reminder skipped");
            return Ok(ReminderOutcome {
                notification: record.clone(),
                reminded: false,
            });
        }

        record.reminder_count = record.reminder_count.saturating_add(1);
        record.sent_at = now;
        Ok(ReminderOutcome {
            notification: record.clone(),
            reminded: true,
        })
    }

    /// Re-sends every pending notification left unanswered for at least
    /// `policy.resend_after` that has not used up its reminders.
    pub fn sweep_reminders(&mut self, policy: ReminderPolicy, now: DateTime<Utc>) -> Vec<i64> {
        let mut reminded = Vec::new();
        for record in self.notifications.values_mut() {
            if record.status != NotificationStatus::Pending {
                continue;
            }
            if record.reminder_count >= policy.max_reminders {
                continue;
            }
            if now - record.sent_at < policy.resend_after {
                continue;
            }
            record.reminder_count += 1;
            record.sent_at = now;
            reminded.push(record.id);
        }
        reminded
    }

    /// Newest first.
    pub fn notifications(&self, status: Option<NotificationStatus>) -> Vec<&NotificationRecord> {
        self.notifications
            .values()
            .rev()
            .filter(|record| status.is_none_or(|wanted| record.status == wanted))
            .collect()
    }

    pub fn pending_notifications(&self) -> usize {
        self.notifications
            .values()
            .filter(|record| record.status == NotificationStatus::Pending)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{at, store};

    fn overdue_transaction(awaiting_reply: bool) -> NewNotification {
        NewNotification {
            event: "deadline_passed".to_string(),
            message: "Validation deadline passed for transaction #1234".to_string(),
            recipient: "payment_officer".to_string(),
            level: NotificationLevel::Warning,
            awaiting_reply,
        }
    }

    #[test]
    fn trigger_and_mark_read() {
        let mut store = store();
        let record = store
            .trigger_event(overdue_transaction(false), at(9))
            .expect("sent");
        assert_eq!(record.status, NotificationStatus::Sent);
        assert_eq!(record.reminder_count, 0);
        let id = record.id;

        assert_eq!(store.mark_read(id).unwrap().status, NotificationStatus::Read);
        assert!(matches!(
            store.mark_read(77),
            Err(StoreError::NotificationNotFound(77))
        ));
    }

    #[test]
    fn manual_reminder_only_moves_pending() {
        let mut store = store();
        let sent = store.trigger_event(overdue_transaction(false), at(9)).unwrap().id;
        let pending = store.trigger_event(overdue_transaction(true), at(9)).unwrap().id;

        let skipped = store.remind(sent, at(10)).unwrap();
        assert!(!skipped.reminded);
        assert_eq!(skipped.notification.sent_at, at(9));

        let moved = store.remind(pending, at(10)).unwrap();
        assert!(moved.reminded);
        assert_eq!(moved.notification.reminder_count, 1);
        assert_eq!(moved.notification.sent_at, at(10));
    }

    #[test]
    fn sweep_respects_age_and_cap() {
        let mut store = store();
        let id = store.trigger_event(overdue_transaction(true), at(0)).unwrap().id;
        let policy = ReminderPolicy::default();

        assert!(store.sweep_reminders(policy, at(23)).is_empty());

        let mut now = at(0);
        for expected in 1..=3u32 {
            now += Duration::hours(24);
            assert_eq!(store.sweep_reminders(policy, now), vec![id]);
            let record = store.notifications(None)[0].clone();
            assert_eq!(record.reminder_count, expected);
        }

        now += Duration::hours(48);
        assert!(store.sweep_reminders(policy, now).is_empty());
        assert_eq!(store.pending_notifications(), 1);
    }

    #[test]
    fn listing_filters_by_status() {
        let mut store = store();
        store.trigger_event(overdue_transaction(true), at(9)).unwrap();
        store.trigger_event(overdue_transaction(false), at(9)).unwrap();
        assert_eq!(store.notifications(Some(NotificationStatus::Pending)).len(), 1);
        assert_eq!(store.notifications(None).len(), 2);
        assert!(store.trigger_event(
            NewNotification { recipient: String::new(), ..overdue_transaction(false) },
            at(9)
        )
        .is_err());
    }
}
