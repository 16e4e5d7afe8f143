use serde::Serialize;

use crate::store::{ForecastRecord, ForecastTotals};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastListView {
    pub forecasts: Vec<ForecastRecord>,
    pub totals: ForecastTotals,
}
