use serde::{Deserialize, Serialize};

use crate::store::{ReportFormat, ReportKind, ReportRecord, ReportStats};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub kind: ReportKind,
    pub format: ReportFormat,
    /// Free-form label such as `Q4 2023`; defaults to the current month.
    #[serde(default)]
    pub period: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportListView {
    pub reports: Vec<ReportRecord>,
    pub stats: ReportStats,
}
