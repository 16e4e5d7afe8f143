use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    BudgetKind, LedgerStore, MAX_DESCRIPTION_LEN, MAX_PARTY_LEN, StoreError, require_amount,
    require_text,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastStatus {
    Active,
    Modified,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastRecord {
    pub id: i64,
    pub kind: BudgetKind,
    pub amount: i64,
    pub planned_on: NaiveDate,
    pub recorded_on: NaiveDate,
    pub status: ForecastStatus,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastDraft {
    pub kind: BudgetKind,
    pub amount: i64,
    pub planned_on: NaiveDate,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ForecastTotals {
    pub revenue: i64,
    pub expense: i64,
    pub net: i64,
}

struct CheckedDraft {
    kind: BudgetKind,
    amount: i64,
    planned_on: NaiveDate,
    description: String,
    category: String,
}

fn check_draft(draft: ForecastDraft) -> Result<CheckedDraft, StoreError> {
    Ok(CheckedDraft {
        kind: draft.kind,
        amount: require_amount(draft.amount)?,
        planned_on: draft.planned_on,
        description: require_text("description", &draft.description, MAX_DESCRIPTION_LEN)?,
        category: require_text("category", &draft.category, MAX_PARTY_LEN)?,
    })
}

impl LedgerStore {
    pub fn create_forecast(
        &mut self,
        draft: ForecastDraft,
        today: NaiveDate,
    ) -> Result<&ForecastRecord, StoreError> {
        let checked = check_draft(draft)?;
        let id = self.allocate_id();
        let record = ForecastRecord {
            id,
            kind: checked.kind,
            amount: checked.amount,
            planned_on: checked.planned_on,
            recorded_on: today,
            status: ForecastStatus::Active,
            description: checked.description,
            category: checked.category,
        };
        info!("Recorded forecast {id} for {}", record.planned_on);
        let record = self.forecasts.entry(id).or_insert(record);
        Ok(&*record)
    }

    /// Replaces the editable fields and marks the forecast modified.
    pub fn update_forecast(
        &mut self,
        id: i64,
        draft: ForecastDraft,
    ) -> Result<&ForecastRecord, StoreError> {
        let checked = check_draft(draft)?;
        let record = self
            .forecasts
            .get_mut(&id)
            .ok_or(StoreError::ForecastNotFound(id))?;
        if record.status == ForecastStatus::Cancelled {
            return Err(StoreError::ForecastCancelled(id));
        }

        record.kind = checked.kind;
        record.amount = checked.amount;
        record.planned_on = checked.planned_on;
        record.description = checked.description;
        record.category = checked.category;
        record.status = ForecastStatus::Modified;
        Ok(&*record)
    }

    pub fn cancel_forecast(&mut self, id: i64) -> Result<&ForecastRecord, StoreError> {
        let record = self
            .forecasts
            .get_mut(&id)
            .ok_or(StoreError::ForecastNotFound(id))?;
        record.status = ForecastStatus::Cancelled;
        Ok(&*record)
    }

    pub fn delete_forecast(&mut self, id: i64) -> Result<ForecastRecord, StoreError> {
        let removed = self
            .forecasts
            .remove(&id)
            .ok_or(StoreError::ForecastNotFound(id))?;
        info!("Deleted forecast {id}");
        Ok(removed)
    }

    pub fn forecast(&self, id: i64) -> Result<&ForecastRecord, StoreError> {
        self.forecasts
            .get(&id)
            .ok_or(StoreError::ForecastNotFound(id))
    }

    pub fn forecasts(&self, kind: Option<BudgetKind>) -> Vec<&ForecastRecord> {
        self.forecasts
            .values()
            .filter(|record| kind.is_none_or(|wanted| record.kind == wanted))
            .collect()
    }

    /// Sums every forecast that is not cancelled.
    pub fn forecast_totals(&self) -> ForecastTotals {
        let mut totals = ForecastTotals::default();
        for record in self.forecasts.values() {
            if record.status == ForecastStatus::Cancelled {
                continue;
            }
            match record.kind {
                BudgetKind::Revenue => totals.revenue = totals.revenue.saturating_add(record.amount),
                BudgetKind::Expense => totals.expense = totals.expense.saturating_add(record.amount),
            }
        }
        totals.net = totals.revenue.saturating_sub(totals.expense);
        totals
    }
}
