use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{LedgerStore, MAX_DESCRIPTION_LEN, MAX_PARTY_LEN, StoreError, require_amount, require_text};
use crate::parameters::VALIDATION_DELAY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Receipt,
    Expense,
    Verification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Validated,
    Rejected,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Validated => "validated",
            TransactionStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Review {
    Validate,
    Reject,
}

/// Cash-box movement. Expenses carry a negative amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub id: i64,
    pub amount: i64,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub recorded_at: DateTime<Utc>,
    pub counterparty: String,
    pub description: String,
    pub status: TransactionStatus,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: i64,
    pub counterparty: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreasurySummary {
    pub balance: i64,
    pub total_receipts: i64,
    pub total_expenses: i64,
    pub pending: usize,
    pub overdue: usize,
    pub updated_at: DateTime<Utc>,
}

impl LedgerStore {
    pub fn record_transaction(
        &mut self,
        new: NewTransaction,
        now: DateTime<Utc>,
    ) -> Result<&TransactionRecord, StoreError> {
        let amount = require_amount(new.amount)?;
        let signed = match new.kind {
            TransactionKind::Receipt => amount,
            TransactionKind::Expense => -amount,
            TransactionKind::Verification => {
                return Err(StoreError::Invalid(
                    "verification entries cannot be recorded directly".to_string(),
                ));
            }
        };
        let counterparty = require_text("counterparty", &new.counterparty, MAX_PARTY_LEN)?;
        let description = require_text("description", &new.description, MAX_DESCRIPTION_LEN)?;

        let id = self.allocate_id();
        let record = TransactionRecord {
            id,
            amount: signed,
            kind: new.kind,
            date: now.date_naive(),
            recorded_at: now,
            counterparty,
            description,
            status: TransactionStatus::Pending,
            reviewed_at: None,
        };
        self.treasury_updated_at = now;

        info!("Recorded pending transaction {id} of {signed}");
        let record = self.transactions.entry(id).or_insert(record);
        Ok(&*record)
    }

    /// Validates or rejects a pending transaction.
    pub fn review_transaction(
        &mut self,
        id: i64,
        review: Review,
        now: DateTime<Utc>,
    ) -> Result<&TransactionRecord, StoreError> {
        let record = self
            .transactions
            .get_mut(&id)
            .ok_or(StoreError::TransactionNotFound(id))?;

        if record.status != TransactionStatus::Pending {
            return Err(StoreError::AlreadyReviewed {
                id,
                status: record.status.as_str(),
            });
        }

        record.status = match review {
            Review::Validate => TransactionStatus::Validated,
            Review::Reject => TransactionStatus::Rejected,
        };
        record.reviewed_at = Some(now);
        self.treasury_updated_at = now;

        info!("Transaction {id} {}", record.status.as_str());
        Ok(&*record)
    }

    pub fn transaction(&self, id: i64) -> Result<&TransactionRecord, StoreError> {
        self.transactions
            .get(&id)
            .ok_or(StoreError::TransactionNotFound(id))
    }

    /// Newest first.
    pub fn transactions(&self, status: Option<TransactionStatus>) -> Vec<&TransactionRecord> {
        self.transactions
            .values()
            .rev()
            .filter(|record| status.is_none_or(|wanted| record.status == wanted))
            .collect()
    }

    /// Balance is the opening balance plus validated movements only.
    pub fn treasury_summary(&self, now: DateTime<Utc>) -> TreasurySummary {
        let delay_hours = self.parameters.number(VALIDATION_DELAY).unwrap_or(48);
        let deadline = Duration::hours(delay_hours);

        let mut total_receipts = 0i64;
        let mut total_expenses = 0i64;
        let mut pending = 0usize;
        let mut overdue = 0usize;

        for record in self.transactions.values() {
            match record.status {
                TransactionStatus::Validated if record.amount > 0 => {
                    total_receipts = total_receipts.saturating_add(record.amount);
                }
                TransactionStatus::Validated => {
                    total_expenses = total_expenses.saturating_add(record.amount.abs());
                }
                TransactionStatus::Pending => {
                    pending += 1;
                    if now - record.recorded_at > deadline {
                        overdue += 1;
                    }
                }
                TransactionStatus::Rejected => {}
            }
        }

        TreasurySummary {
            balance: self
                .opening_balance
                .saturating_add(total_receipts)
                .saturating_sub(total_expenses),
            total_receipts,
            total_expenses,
            pending,
            overdue,
            updated_at: self.treasury_updated_at,
        }
    }
}
