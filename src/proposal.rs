//! Proposal lifecycle — states, tiers, and the projected proposal record

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interpret::Interpretation;
use crate::league::{GovernorId, TeamId};

/// Approval tier 1–5. Higher tiers demand broader consensus and cost more
/// PROPOSE tokens to confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tier(pub u8);

impl Tier {
    /// Pass threshold for this tier. The ratio must strictly exceed it;
    /// equality always fails. Unmapped tiers get the strictest threshold.
    pub fn threshold(self) -> f64 {
        match self.0 {
            1 | 2 => 0.50,
            3 | 4 => 0.60,
            _ => 0.67,
        }
    }

    /// PROPOSE tokens spent at confirmation.
    pub fn propose_cost(self) -> u32 {
        match self.0 {
            1 | 2 => 1,
            3 | 4 => 2,
            _ => 3,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a proposal.
///
/// Drafting and revising resolve within a single command, so the projected
/// state after a draft/revision is either `Interpreting` (candidate rejected,
/// author may revise), `AwaitingConfirmation` (candidate accepted), or
/// `Cancelled` (shortfall the author cannot fix by revision).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalState {
    /// Last interpretation did not yield an acceptable candidate
    Interpreting,
    /// Candidate accepted; author sees interpretation, cost, and confidence
    AwaitingConfirmation,
    /// Confirmed onto the Floor; accepting votes until the next tally
    Open,
    Passed,
    Failed,
    /// Voting window closed with zero votes cast
    Expired,
    Cancelled,
}

impl ProposalState {
    pub fn accepts_votes(self) -> bool {
        self == ProposalState::Open
    }

    pub fn accepts_revision(self) -> bool {
        matches!(
            self,
            ProposalState::Interpreting | ProposalState::AwaitingConfirmation
        )
    }

    pub fn accepts_amendment(self) -> bool {
        self == ProposalState::Open
    }

    pub fn is_resolved(self) -> bool {
        matches!(
            self,
            ProposalState::Passed
                | ProposalState::Failed
                | ProposalState::Expired
                | ProposalState::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProposalState::Interpreting => "interpreting",
            ProposalState::AwaitingConfirmation => "awaiting_confirmation",
            ProposalState::Open => "open",
            ProposalState::Passed => "passed",
            ProposalState::Failed => "failed",
            ProposalState::Expired => "expired",
            ProposalState::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Yes,
    No,
}

/// A cast vote. Immutable once appended; the weight is computed at cast time
/// from the voter's team roster (doubled when boosted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub choice: VoteChoice,
    pub boosted: bool,
    pub weight: f64,
}

/// Projection of one proposal over the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub id: Uuid,
    pub author: GovernorId,
    pub team: TeamId,
    pub tier: Tier,
    pub state: ProposalState,
    pub raw_text: String,
    pub sanitized_text: String,
    /// Latest interpretation (draft, revision, or amendment)
    pub interpretation: Interpretation,
    /// Rule space version the candidate was validated against at confirmation
    pub rule_space_version: Option<u32>,
    pub votes: HashMap<GovernorId, VoteRecord>,
    pub created_ms: u64,
    pub resolved_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_thresholds_match_bands() {
        assert_eq!(Tier(1).threshold(), 0.50);
        assert_eq!(Tier(2).threshold(), 0.50);
        assert_eq!(Tier(3).threshold(), 0.60);
        assert_eq!(Tier(4).threshold(), 0.60);
        assert_eq!(Tier(5).threshold(), 0.67);
        // Unmapped tiers fall to the strictest band
        assert_eq!(Tier(0).threshold(), 0.67);
        assert_eq!(Tier(9).threshold(), 0.67);
    }

    #[test]
    fn tier_costs_scale() {
        assert_eq!(Tier(1).propose_cost(), 1);
        assert_eq!(Tier(3).propose_cost(), 2);
        assert_eq!(Tier(5).propose_cost(), 3);
    }

    #[test]
    fn state_gates() {
        assert!(ProposalState::Open.accepts_votes());
        assert!(!ProposalState::AwaitingConfirmation.accepts_votes());
        assert!(ProposalState::Interpreting.accepts_revision());
        assert!(ProposalState::AwaitingConfirmation.accepts_revision());
        assert!(!ProposalState::Open.accepts_revision());
        assert!(ProposalState::Open.accepts_amendment());
        assert!(!ProposalState::Passed.accepts_amendment());
        assert!(ProposalState::Expired.is_resolved());
        assert!(!ProposalState::Open.is_resolved());
    }
}
