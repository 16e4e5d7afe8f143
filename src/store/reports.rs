use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{BUDGET_OFFICER, LedgerStore, MAX_PARTY_LEN, StoreError, require_text};
use crate::parameters::BUDGET_MAX;
use crate::store::{NewNotification, NotificationLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Budget,
    Treasury,
    Votes,
    Forecasts,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Budget => "budget",
            ReportKind::Treasury => "treasury",
            ReportKind::Votes => "votes",
            ReportKind::Forecasts => "forecasts",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Pdf,
    Excel,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Generating,
    Generated,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRecord {
    pub id: i64,
    pub kind: ReportKind,
    pub format: ReportFormat,
    pub period: String,
    pub content: String,
    pub generated_on: NaiveDate,
    pub status: ReportStatus,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub kind: ReportKind,
    pub format: ReportFormat,
    pub period: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    pub total: usize,
    pub budget: usize,
    pub treasury: usize,
    pub votes: usize,
    pub forecasts: usize,
    pub generating: usize,
}

impl LedgerStore {
    /// Queues a report. Its content is rendered by `complete_reports`.
    pub fn request_report(
        &mut self,
        new: NewReport,
        now: DateTime<Utc>,
    ) -> Result<&ReportRecord, StoreError> {
        let period = match new.period {
            Some(period) => require_text("period", &period, MAX_PARTY_LEN)?,
            None => now.format("%B %Y").to_string(),
        };

        let id = self.allocate_id();
        let record = ReportRecord {
            id,
            kind: new.kind,
            format: new.format,
            content: format!("New {} report - {period}", new.kind.as_str()),
            period,
            generated_on: now.date_naive(),
            status: ReportStatus::Generating,
        };
        info!("Queued {} report {id}", new.kind.as_str());
        let record = self.reports.entry(id).or_insert(record);
        Ok(&*record)
    }

    /// Renders every queued report from the current ledger.
    ///
    /// Reports over an area with no records end in `error`.
    pub fn complete_reports(&mut self, now: DateTime<Utc>) -> Vec<i64> {
        let queued = self
            .reports
            .values()
            .filter(|record| record.status == ReportStatus::Generating)
            .map(|record| (record.id, record.kind, record.period.clone()))
            .collect::<Vec<_>>();

        let mut completed = Vec::with_capacity(queued.len());
        for (id, kind, period) in queued {
            let rendered = self.render_report(kind, &period, now);
            let Some(record) = self.reports.get_mut(&id) else {
                continue;
            };
            let (level, message) = match rendered {
                Some(content) => {
                    record.status = ReportStatus::Generated;
                    record.content = content;
                    (NotificationLevel::Success, format!("Report ready: {}", record.content))
                }
                None => {
                    warn!("No {} data for report {id}", kind.as_str());
                    record.status = ReportStatus::Error;
                    record.content = format!("No {} data for {period}", kind.as_str());
                    (NotificationLevel::Error, format!("Report failed: {}", record.content))
                }
            };
            record.generated_on = now.date_naive();
            completed.push(id);

            self.emit(
                NewNotification {
                    event: "report_generated".to_string(),
                    message,
                    recipient: BUDGET_OFFICER.to_string(),
                    level,
                    awaiting_reply: false,
                },
                now,
            );
        }
        completed
    }

    fn render_report(&self, kind: ReportKind, period: &str, now: DateTime<Utc>) -> Option<String> {
        match kind {
            ReportKind::Budget => {
                let budget_max = self.parameters.number(BUDGET_MAX).unwrap_or(0);
                let spent = self.treasury_summary(now).total_expenses;
                Some(format!(
                    "Budget report {period}: {spent} spent of {budget_max}"
                ))
            }
            ReportKind::Treasury => {
                if self.transactions.is_empty() {
                    return None;
                }
                let summary = self.treasury_summary(now);
                Some(format!(
                    "Treasury report {period}: balance {}, {} receipts, {} expenses, {} pending",
                    summary.balance, summary.total_receipts, summary.total_expenses, summary.pending
                ))
            }
            ReportKind::Votes => {
                let stats = self.vote_stats();
                if stats.total == 0 {
                    return None;
                }
                Some(format!(
                    "Votes report {period}: {} approved, {} rejected, {} open",
                    stats.approved, stats.rejected, stats.open
                ))
            }
            ReportKind::Forecasts => {
                if self.forecasts.is_empty() {
                    return None;
                }
                let totals = self.forecast_totals();
                Some(format!(
                    "Forecast report {period}: {} revenue, {} expense, net {}",
                    totals.revenue, totals.expense, totals.net
                ))
            }
        }
    }

    pub fn report(&self, id: i64) -> Result<&ReportRecord, StoreError> {
        self.reports.get(&id).ok_or(StoreError::ReportNotFound(id))
    }

    /// Newest first.
    pub fn reports(
        &self,
        kind: Option<ReportKind>,
        format: Option<ReportFormat>,
    ) -> Vec<&ReportRecord> {
        self.reports
            .values()
            .rev()
            .filter(|record| kind.is_none_or(|wanted| record.kind == wanted))
            .filter(|record| format.is_none_or(|wanted| record.format == wanted))
            .collect()
    }

    pub fn report_stats(&self) -> ReportStats {
        let mut stats = ReportStats {
            total: self.reports.len(),
            ..ReportStats::default()
        };
        for record in self.reports.values() {
            match record.kind {
                ReportKind::Budget => stats.budget += 1,
                ReportKind::Treasury => stats.treasury += 1,
                ReportKind::Votes => stats.votes += 1,
                ReportKind::Forecasts => stats.forecasts += 1,
            }
            if record.status == ReportStatus::Generating {
                stats.generating += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{at, store};
    use crate::store::{NewTransaction, TransactionKind};

    fn request(kind: ReportKind, format: ReportFormat) -> NewReport {
        NewReport {
            kind,
            format,
            period: Some("January 2024".to_string()),
        }
    }

    #[test]
    fn requested_report_starts_generating() {
        let mut store = store();
        let record = store
            .request_report(request(ReportKind::Budget, ReportFormat::Pdf), at(9))
            .expect("queued");
        assert_eq!(record.status, ReportStatus::Generating);
        assert_eq!(record.content, "New budget report - January 2024");

        let defaulted = store
            .request_report(
                NewReport {
                    kind: ReportKind::Votes,
                    format: ReportFormat::Csv,
                    period: None,
                },
                at(9),
            )
            .expect("queued");
        assert_eq!(defaulted.period, "January 2024");

        let blank = NewReport {
            period: Some("  ".to_string()),
            ..request(ReportKind::Budget, ReportFormat::Pdf)
        };
        assert!(store.request_report(blank, at(9)).is_err());
    }

    #[test]
    fn completion_renders_from_ledger() {
        let mut store = store();
        let budget = store
            .request_report(request(ReportKind::Budget, ReportFormat::Pdf), at(9))
            .unwrap()
            .id;
        let treasury = store
            .request_report(request(ReportKind::Treasury, ReportFormat::Excel), at(9))
            .unwrap()
            .id;

        let completed = store.complete_reports(at(10));
        assert_eq!(completed, vec![budget, treasury]);

        let budget = store.report(budget).unwrap();
        assert_eq!(budget.status, ReportStatus::Generated);
        assert_eq!(budget.content, "Budget report January 2024: 0 spent of 2000000");

        let treasury = store.report(treasury).unwrap();
        assert_eq!(treasury.status, ReportStatus::Error);

        let notices = store.notifications(None);
        assert_eq!(notices.len(), 2);
        assert!(notices.iter().all(|notice| notice.event == "report_generated"));

        assert!(store.complete_reports(at(11)).is_empty());
    }

    #[test]
    fn treasury_report_with_movements() {
        let mut store = store();
        store
            .record_transaction(
                NewTransaction {
                    kind: TransactionKind::Receipt,
                    amount: 50_000,
                    counterparty: "Regional council".to_string(),
                    description: "Annual grant".to_string(),
                },
                at(8),
            )
            .unwrap();
        let id = store
            .request_report(request(ReportKind::Treasury, ReportFormat::Excel), at(9))
            .unwrap()
            .id;
        store.complete_reports(at(9));
        let record = store.report(id).unwrap();
        assert_eq!(record.status, ReportStatus::Generated);
        assert!(record.content.contains("1 pending"));
    }

    #[test]
    fn listing_filters_and_stats() {
        let mut store = store();
        store.request_report(request(ReportKind::Budget, ReportFormat::Pdf), at(9)).unwrap();
        store.request_report(request(ReportKind::Budget, ReportFormat::Csv), at(9)).unwrap();
        let latest = store
            .request_report(request(ReportKind::Votes, ReportFormat::Pdf), at(9))
            .unwrap()
            .id;

        let pdfs = store.reports(None, Some(ReportFormat::Pdf));
        assert_eq!(pdfs.len(), 2);
        assert_eq!(pdfs[0].id, latest);
        assert_eq!(store.reports(Some(ReportKind::Budget), Some(ReportFormat::Csv)).len(), 1);
        assert!(store.reports(Some(ReportKind::Forecasts), None).is_empty());

        let stats = store.report_stats();
        assert_eq!(
            stats,
            ReportStats { total: 3, budget: 2, treasury: 0, votes: 1, forecasts: 0, generating: 3 }
        );
        assert_eq!(store.report(999).unwrap_err(), StoreError::ReportNotFound(999));
    }
}
