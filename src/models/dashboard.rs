use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub budget_max: i64,
    pub spent: i64,
    pub remaining: i64,
    pub spent_percent: f64,
    pub balance: i64,
    pub pending_transactions: usize,
    pub open_propositions: usize,
    pub pending_notifications: usize,
    pub forecast_net: i64,
}
