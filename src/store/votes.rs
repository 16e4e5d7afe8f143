use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::{
    BUDGET_OFFICER, BudgetKind, LedgerStore, MAX_DESCRIPTION_LEN, MAX_PARTY_LEN, StoreError,
    require_amount, require_text,
};
use crate::store::{NewNotification, NotificationLevel};
use crate::tally::{Proposition, PropositionStatus};

pub const MAX_TOTAL_VOTERS: u32 = 100_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropositionRecord {
    pub tally: Proposition,
    pub description: String,
    pub amount: i64,
    pub kind: BudgetKind,
    pub opened_on: NaiveDate,
    pub expires_on: NaiveDate,
    /// Voter identity to ballot direction. Only ballots cast through the
    /// store are listed; seeded tallies have no voter attached.
    pub ballots: BTreeMap<String, bool>,
}

#[derive(Debug, Clone)]
pub struct NewProposition {
    pub description: String,
    pub amount: i64,
    pub kind: BudgetKind,
    pub total_voters: u32,
    pub expires_on: NaiveDate,
    pub votes_for: u32,
    pub votes_against: u32,
}

#[derive(Debug, Clone)]
pub struct BallotOutcome {
    pub proposition: PropositionRecord,
    pub accepted: bool,
    pub resolved: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VoteStats {
    pub total: usize,
    pub open: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl LedgerStore {
    /// Opens a proposition. Seeded tallies are kept as-is; resolution only
    /// ever happens on a ballot.
    pub fn create_proposition(
        &mut self,
        new: NewProposition,
        today: NaiveDate,
    ) -> Result<&PropositionRecord, StoreError> {
        let description = require_text("description", &new.description, MAX_DESCRIPTION_LEN)?;
        let amount = require_amount(new.amount)?;

        if new.total_voters == 0 {
            return Err(StoreError::Invalid(
                "total_voters must be positive".to_string(),
            ));
        }
        if new.total_voters > MAX_TOTAL_VOTERS {
            return Err(StoreError::Invalid(format!(
                "total_voters exceeds {MAX_TOTAL_VOTERS}"
            )));
        }
        // Seeds must leave the proposition short of quorum; it resolves on a ballot.
        let seeded = u64::from(new.votes_for) + u64::from(new.votes_against);
        let quorum = self.tally_engine().quorum(new.total_voters);
        if seeded >= u64::from(quorum) {
            return Err(StoreError::Invalid(format!(
                "seeded ballots must stay below the quorum of {quorum}"
            )));
        }
        if new.expires_on < today {
            return Err(StoreError::Invalid(
                "expires_on must not be in the past".to_string(),
            ));
        }

        let id = self.allocate_id();
        let tally = Proposition {
            votes_for: new.votes_for,
            votes_against: new.votes_against,
            ..Proposition::open(id, new.total_voters)
        };
        let record = PropositionRecord {
            tally,
            description,
            amount,
            kind: new.kind,
            opened_on: today,
            expires_on: new.expires_on,
            ballots: BTreeMap::new(),
        };

        info!(
            "Opened proposition {id} for {} voters ({amount})",
            new.total_voters
        );
        let record = self.propositions.entry(id).or_insert(record);
        Ok(&*record)
    }

    pub fn proposition(&self, id: i64) -> Result<&PropositionRecord, StoreError> {
        self.propositions
            .get(&id)
            .ok_or(StoreError::PropositionNotFound(id))
    }

    pub fn propositions(&self, status: Option<PropositionStatus>) -> Vec<&PropositionRecord> {
        self.propositions
            .values()
            .filter(|record| status.is_none_or(|wanted| record.tally.status == wanted))
            .collect()
    }

    /// Records one ballot from `voter`.
    ///
    /// A closed proposition is left untouched and the ballot reported as not
    /// accepted. A voter may cast at most one ballot per proposition.
    pub fn cast_ballot(
        &mut self,
        id: i64,
        voter: &str,
        approve: bool,
        now: DateTime<Utc>,
    ) -> Result<BallotOutcome, StoreError> {
        let voter = require_text("voter", voter, MAX_PARTY_LEN)?;
        let engine = self.tally_engine();

        let record = self
            .propositions
            .get_mut(&id)
            .ok_or(StoreError::PropositionNotFound(id))?;

        if record.tally.status.is_terminal() {
            debug!("Ignoring ballot on closed proposition {id}");
            return Ok(BallotOutcome {
                proposition: record.clone(),
                accepted: false,
                resolved: false,
            });
        }

        if record.ballots.contains_key(&voter) {
            return Err(StoreError::DuplicateBallot {
                proposition_id: id,
                voter,
            });
        }

        record.tally = engine.cast_ballot(record.tally.clone(), approve);
        record.ballots.insert(voter, approve);
        let resolved = record.tally.status.is_terminal();
        let snapshot = record.clone();

        if resolved {
            info!(
                "Proposition {id} resolved as {} ({} for, {} against)",
                snapshot.tally.status.as_str(),
                snapshot.tally.votes_for,
                snapshot.tally.votes_against
            );
            let (level, verdict) = if snapshot.tally.result == Some(true) {
                (NotificationLevel::Success, "approved")
            } else {
                (NotificationLevel::Warning, "rejected")
            };
            self.emit(
                NewNotification {
                    event: "vote_closed".to_string(),
                    message: format!("Vote {verdict}: {}", snapshot.description),
                    recipient: BUDGET_OFFICER.to_string(),
                    level,
                    awaiting_reply: false,
                },
                now,
            );
        }

        Ok(BallotOutcome {
            proposition: snapshot,
            accepted: true,
            resolved,
        })
    }

    pub fn vote_stats(&self) -> VoteStats {
        let mut stats = VoteStats {
            total: self.propositions.len(),
            ..VoteStats::default()
        };
        for record in self.propositions.values() {
            match record.tally.status {
                PropositionStatus::Open => stats.open += 1,
                PropositionStatus::Approved => stats.approved += 1,
                PropositionStatus::Rejected => stats.rejected += 1,
            }
        }
        stats
    }
}
