use serde::{Deserialize, Serialize};

use crate::store::{Review, TransactionKind, TransactionRecord, TreasurySummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCreateRequest {
    pub kind: TransactionKind,
    pub amount: i64,
    pub counterparty: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReviewRequest {
    pub decision: Review,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionReviewResponse {
    pub transaction: TransactionRecord,
    pub summary: TreasurySummary,
}
