//! Vote tally — normalized weights, tiered thresholds, strict pass rule
//!
//! Pure decision logic; the engine owns the snapshot discipline (one
//! consistent view of votes per boundary) and the event appends.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::proposal::{ProposalRecord, VoteChoice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    /// Window closed with zero votes cast
    Expired,
}

/// Resolution of one proposal at a tally boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyDecision {
    pub proposal_id: Uuid,
    pub outcome: Outcome,
    pub yes_weight: f64,
    pub no_weight: f64,
    /// YES / (YES + NO); `None` when no votes were cast
    pub ratio: Option<f64>,
    pub threshold: f64,
}

/// Decide one open proposal from its vote snapshot.
///
/// The ratio must strictly exceed the tier threshold; equality is always a
/// failure. A proposal with no votes resolves as Expired.
pub fn decide(proposal: &ProposalRecord) -> TallyDecision {
    let threshold = proposal.tier.threshold();

    let mut yes_weight = 0.0;
    let mut no_weight = 0.0;
    for vote in proposal.votes.values() {
        match vote.choice {
            VoteChoice::Yes => yes_weight += vote.weight,
            VoteChoice::No => no_weight += vote.weight,
        }
    }

    let total = yes_weight + no_weight;
    if total == 0.0 {
        return TallyDecision {
            proposal_id: proposal.id,
            outcome: Outcome::Expired,
            yes_weight,
            no_weight,
            ratio: None,
            threshold,
        };
    }

    let ratio = yes_weight / total;
    let outcome = if ratio > threshold {
        Outcome::Passed
    } else {
        Outcome::Failed
    };

    TallyDecision {
        proposal_id: proposal.id,
        outcome,
        yes_weight,
        no_weight,
        ratio: Some(ratio),
        threshold,
    }
}
