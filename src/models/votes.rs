use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::store::{BudgetKind, PropositionRecord};
use crate::tally::{PropositionStatus, TallyEngine};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropositionView {
    pub id: i64,
    pub description: String,
    pub amount: i64,
    pub kind: BudgetKind,
    pub status: PropositionStatus,
    pub result: Option<bool>,
    pub votes_for: u32,
    pub votes_against: u32,
    pub total_voters: u32,
    pub quorum: u32,
    pub participation_rate: f64,
    pub approval_rate: f64,
    pub opened_on: NaiveDate,
    pub expires_on: NaiveDate,
    pub has_voted: Option<bool>,
    pub user_vote: Option<bool>,
}

impl PropositionView {
    /// `voter` fills `has_voted` / `user_vote` when the caller asks for it.
    pub fn from_record(record: &PropositionRecord, engine: TallyEngine, voter: Option<&str>) -> Self {
        let tally = &record.tally;
        let (has_voted, user_vote) = match voter {
            Some(voter) => {
                let ballot = record.ballots.get(voter.trim()).copied();
                (Some(ballot.is_some()), ballot)
            }
            None => (None, None),
        };

        Self {
            id: tally.id,
            description: record.description.clone(),
            amount: record.amount,
            kind: record.kind,
            status: tally.status,
            result: tally.result,
            votes_for: tally.votes_for,
            votes_against: tally.votes_against,
            total_voters: tally.total_voters,
            quorum: engine.quorum(tally.total_voters),
            participation_rate: tally.participation_rate(),
            approval_rate: tally.approval_rate(),
            opened_on: record.opened_on,
            expires_on: record.expires_on,
            has_voted,
            user_vote,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropositionCreateRequest {
    pub description: String,
    pub amount: i64,
    pub kind: BudgetKind,
    pub total_voters: u32,
    pub expires_on: NaiveDate,
    #[serde(default)]
    pub votes_for: Option<u32>,
    #[serde(default)]
    pub votes_against: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotRequest {
    pub proposition_id: i64,
    pub voter: String,
    pub approve: Option<bool>,
    /// Used when `approve` is absent: `yes`/`for`/`approve` or `no`/`against`/`reject`.
    pub option: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotResponse {
    pub proposition_id: i64,
    pub status: PropositionStatus,
    pub result: Option<bool>,
    pub votes_for: u32,
    pub votes_against: u32,
    pub voter: String,
    pub approve: bool,
    pub accepted: bool,
    pub finalized: bool,
}
