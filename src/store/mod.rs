//! In-memory ledger shared by every HTTP area.
//!
//! The store owns propositions, cash-box transactions, forecasts,
//! notifications, reports and runtime parameters. Callers hold it behind a single
//! `RwLock` so that each mutation runs to completion before the next one.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::parameters::{AUTO_NOTIFICATIONS, ParameterError, ParameterSet};
use crate::tally::TallyEngine;

mod forecasts;
mod notifications;
mod reports;
mod treasury;
mod votes;

pub use forecasts::{ForecastDraft, ForecastRecord, ForecastStatus, ForecastTotals};
pub use notifications::{
    NewNotification, NotificationLevel, NotificationRecord, NotificationStatus, ReminderOutcome,
    ReminderPolicy,
};
pub use reports::{
    NewReport, ReportFormat, ReportKind, ReportRecord, ReportStats, ReportStatus,
};
pub use treasury::{
    NewTransaction, Review, TransactionKind, TransactionRecord, TransactionStatus, TreasurySummary,
};
pub use votes::{BallotOutcome, NewProposition, PropositionRecord, VoteStats};

pub const MAX_DESCRIPTION_LEN: usize = 1_024;
pub const MAX_PARTY_LEN: usize = 256;
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;
pub const BUDGET_OFFICER: &str = "budget_officer";

/// Direction of money a proposition or forecast concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetKind {
    Revenue,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("proposition {0} not found")]
    PropositionNotFound(i64),
    #[error("transaction {0} not found")]
    TransactionNotFound(i64),
    #[error("forecast {0} not found")]
    ForecastNotFound(i64),
    #[error("notification {0} not found")]
    NotificationNotFound(i64),
    #[error("report {0} not found")]
    ReportNotFound(i64),
    #[error("{voter} already voted on proposition {proposition_id}")]
    DuplicateBallot { proposition_id: i64, voter: String },
    #[error("transaction {id} was already {status}")]
    AlreadyReviewed { id: i64, status: &'static str },
    #[error("forecast {0} is cancelled")]
    ForecastCancelled(i64),
    #[error("{0}")]
    Invalid(String),
    #[error("invalid configuration: {}", join_errors(.0))]
    Parameters(Vec<ParameterError>),
}

fn join_errors(errors: &[ParameterError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug)]
pub struct LedgerStore {
    propositions: BTreeMap<i64, PropositionRecord>,
    transactions: BTreeMap<i64, TransactionRecord>,
    forecasts: BTreeMap<i64, ForecastRecord>,
    notifications: BTreeMap<i64, NotificationRecord>,
    reports: BTreeMap<i64, ReportRecord>,
    parameters: ParameterSet,
    opening_balance: i64,
    treasury_updated_at: DateTime<Utc>,
    next_id: i64,
}

impl LedgerStore {
    pub fn new(parameters: ParameterSet, opening_balance: i64, now: DateTime<Utc>) -> Self {
        assert!(
            opening_balance.abs() <= MAX_AMOUNT,
            "Opening balance exceeds amount bounds"
        );
        Self {
            propositions: BTreeMap::new(),
            transactions: BTreeMap::new(),
            forecasts: BTreeMap::new(),
            notifications: BTreeMap::new(),
            reports: BTreeMap::new(),
            parameters,
            opening_balance,
            treasury_updated_at: now,
            next_id: 1,
        }
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// Applies a batch of parameter changes atomically.
    pub fn update_parameters(
        &mut self,
        changes: &[(String, serde_json::Value)],
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, StoreError> {
        let changed = self
            .parameters
            .apply(changes)
            .map_err(StoreError::Parameters)?;
        if !changed.is_empty() {
            self.emit(
                NewNotification {
                    event: "configuration_saved".to_string(),
                    message: format!("Configuration updated: {}", changed.join(", ")),
                    recipient: BUDGET_OFFICER.to_string(),
                    level: NotificationLevel::Info,
                    awaiting_reply: false,
                },
                now,
            );
        }
        Ok(changed)
    }

    pub fn tally_engine(&self) -> TallyEngine {
        TallyEngine::new(self.parameters.quorum_percent())
    }

    pub fn auto_notifications(&self) -> bool {
        self.parameters.flag(AUTO_NOTIFICATIONS).unwrap_or(false)
    }

    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Raises a system notification when automatic notifications are on.
    fn emit(&mut self, notification: NewNotification, now: DateTime<Utc>) {
        if !self.auto_notifications() {
            return;
        }
        // Inputs are built internally and always pass validation.
        if let Err(err) = self.trigger_event(notification, now) {
            tracing::warn!("Dropped system notification: {err}");
        }
    }
}

pub(crate) fn require_text(label: &str, value: &str, max_len: usize) -> Result<String, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Invalid(format!("{label} must not be empty")));
    }
    if trimmed.chars().count() > max_len {
        return Err(StoreError::Invalid(format!(
            "{label} exceeds {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn require_amount(amount: i64) -> Result<i64, StoreError> {
    if amount <= 0 {
        return Err(StoreError::Invalid("amount must be positive".to_string()));
    }
    if amount > MAX_AMOUNT {
        return Err(StoreError::Invalid(format!(
            "amount exceeds {MAX_AMOUNT}"
        )));
    }
    Ok(amount)
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, TimeZone, Utc};

    use super::LedgerStore;
    use crate::parameters::ParameterSet;

    pub fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    pub fn store() -> LedgerStore {
        LedgerStore::new(ParameterSet::default(), 0, at(8))
    }
}
