use serde::{Deserialize, Serialize};

pub const DEFAULT_QUORUM_PERCENT: u32 = 60;
pub const MIN_QUORUM_PERCENT: u32 = 50;
pub const MAX_QUORUM_PERCENT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropositionStatus {
    Open,
    Approved,
    Rejected,
}

impl PropositionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PropositionStatus::Open)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PropositionStatus::Open => "open",
            PropositionStatus::Approved => "approved",
            PropositionStatus::Rejected => "rejected",
        }
    }
}

/// Ballot counters and lifecycle state of a single proposition.
///
/// `result` is `None` while the proposition is open and mirrors the terminal
/// status afterwards: `Some(true)` for approved, `Some(false)` for rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposition {
    pub id: i64,
    pub votes_for: u32,
    pub votes_against: u32,
    pub total_voters: u32,
    pub status: PropositionStatus,
    pub result: Option<bool>,
}

impl Proposition {
    pub fn open(id: i64, total_voters: u32) -> Self {
        assert!(total_voters > 0, "Proposition needs at least one voter");
        Self {
            id,
            votes_for: 0,
            votes_against: 0,
            total_voters,
            status: PropositionStatus::Open,
            result: None,
        }
    }

    pub fn participation(&self) -> u32 {
        self.votes_for.saturating_add(self.votes_against)
    }

    pub fn participation_rate(&self) -> f64 {
        if self.total_voters == 0 {
            return 0.0;
        }
        f64::from(self.participation()) / f64::from(self.total_voters) * 100.0
    }

    pub fn approval_rate(&self) -> f64 {
        let participation = self.participation();
        if participation == 0 {
            return 0.0;
        }
        f64::from(self.votes_for) / f64::from(participation) * 100.0
    }
}

/// Applies ballots to propositions and resolves them once quorum is met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TallyEngine {
    quorum_percent: u32,
}

impl Default for TallyEngine {
    fn default() -> Self {
        Self {
            quorum_percent: DEFAULT_QUORUM_PERCENT,
        }
    }
}

impl TallyEngine {
    pub fn new(quorum_percent: u32) -> Self {
        assert!(
            (MIN_QUORUM_PERCENT..=MAX_QUORUM_PERCENT).contains(&quorum_percent),
            "Quorum percent outside supported range"
        );
        Self { quorum_percent }
    }

    pub fn quorum_percent(&self) -> u32 {
        self.quorum_percent
    }

    /// Minimum participation needed to resolve, rounded up.
    pub fn quorum(&self, total_voters: u32) -> u32 {
        let scaled = u64::from(total_voters) * u64::from(self.quorum_percent);
        let quorum = scaled.div_ceil(100);
        u32::try_from(quorum).unwrap_or(u32::MAX)
    }

    pub fn has_quorum(&self, proposition: &Proposition) -> bool {
        proposition.participation() >= self.quorum(proposition.total_voters)
    }

    /// Records one ballot and re-derives the lifecycle state.
    ///
    /// Closed propositions are returned untouched.
    pub fn cast_ballot(&self, mut proposition: Proposition, approve: bool) -> Proposition {
        if proposition.status.is_terminal() {
            return proposition;
        }

        if approve {
            proposition.votes_for = proposition.votes_for.saturating_add(1);
        } else {
            proposition.votes_against = proposition.votes_against.saturating_add(1);
        }

        if !self.has_quorum(&proposition) {
            return proposition;
        }

        if proposition.votes_for > proposition.votes_against {
            proposition.status = PropositionStatus::Approved;
            proposition.result = Some(true);
        } else {
            proposition.status = PropositionStatus::Rejected;
            proposition.result = Some(false);
        }

        debug_assert_eq!(
            proposition.result.is_some(),
            proposition.status.is_terminal(),
            "Result must be present exactly when closed"
        );
        proposition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cast_ballot(proposition: Proposition, approve: bool) -> Proposition {
        TallyEngine::default().cast_ballot(proposition, approve)
    }

    fn seeded(votes_for: u32, votes_against: u32, total_voters: u32) -> Proposition {
        Proposition {
            votes_for,
            votes_against,
            ..Proposition::open(1, total_voters)
        }
    }

    #[test]
    fn quorum_rounds_up() {
        let engine = TallyEngine::default();
        assert_eq!(engine.quorum(15), 9);
        assert_eq!(engine.quorum(10), 6);
        assert_eq!(engine.quorum(7), 5);
        assert_eq!(engine.quorum(1), 1);
    }

    #[test]
    fn approving_ballot_at_quorum_approves() {
        let updated = cast_ballot(seeded(5, 3, 15), true);
        assert_eq!(updated.votes_for, 6);
        assert_eq!(updated.votes_against, 3);
        assert_eq!(updated.status, PropositionStatus::Approved);
        assert_eq!(updated.result, Some(true));
    }

    #[test]
    fn tie_at_quorum_rejects() {
        let updated = cast_ballot(seeded(4, 4, 15), false);
        assert_eq!(updated.votes_for, 4);
        assert_eq!(updated.votes_against, 5);
        assert_eq!(updated.status, PropositionStatus::Rejected);
        assert_eq!(updated.result, Some(false));

        let tied = cast_ballot(seeded(4, 5, 16), true);
        assert_eq!(tied.participation(), 10);
        assert_eq!(tied.status, PropositionStatus::Rejected);
    }

    #[test]
    fn one_below_quorum_stays_open() {
        let updated = cast_ballot(seeded(4, 3, 15), true);
        assert_eq!(updated.participation(), 8);
        assert_eq!(updated.status, PropositionStatus::Open);
        assert_eq!(updated.result, None);
    }

    #[test]
    fn closed_propositions_ignore_ballots() {
        let approved = cast_ballot(seeded(5, 3, 15), true);
        let again = cast_ballot(approved.clone(), false);
        assert_eq!(again, approved);

        let rejected = cast_ballot(seeded(4, 4, 15), false);
        let again = cast_ballot(rejected.clone(), true);
        assert_eq!(again, rejected);
    }

    #[test]
    fn custom_quorum_percent() {
        let engine = TallyEngine::new(MAX_QUORUM_PERCENT);
        assert_eq!(engine.quorum(15), 15);
        let updated = engine.cast_ballot(seeded(10, 3, 15), true);
        assert_eq!(updated.status, PropositionStatus::Open);
    }

    #[test]
    fn rates_handle_empty_tallies() {
        let fresh = Proposition::open(7, 15);
        assert_eq!(fresh.approval_rate(), 0.0);
        assert_eq!(fresh.participation_rate(), 0.0);

        let busy = seeded(6, 3, 15);
        assert!((busy.participation_rate() - 60.0).abs() < f64::EPSILON);
        assert!((busy.approval_rate() - 200.0 / 3.0).abs() < 1e-9);
    }
}
