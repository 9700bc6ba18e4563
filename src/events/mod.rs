//! Governance events — the sole source of truth
//!
//! Every state change is an append of one of these payloads to the ordered
//! log. Projections (proposals, balances, trades, the current rule-set
//! version) are folds over the sequence and carry no authority of their own.

pub mod projection;
pub mod store;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interpret::{Candidate, Interpretation};
use crate::league::GovernorId;
use crate::ledger::{SpendReason, TokenKind};
use crate::proposal::{Tier, VoteChoice};
use crate::tally::Outcome;

pub use projection::Projections;
pub use store::EventStore;

/// How a draft or revision resolved inside its command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DraftOutcome {
    /// Candidate accepted; proposal awaits the author's confirmation
    Accepted,
    /// The interpretation service declined; author may revise
    InterpreterRejected { reason: String },
    /// The validator declined; fatal shortfalls cancel the proposal,
    /// anything else leaves it revisable
    ValidationFailed { reason: String, fatal: bool },
}

/// One record in the append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceEvent {
    /// Strictly increasing, gap-free sequence number
    pub seq: u64,
    pub timestamp_ms: u64,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    ProposalDrafted {
        proposal_id: Uuid,
        governor: GovernorId,
        team: String,
        tier: Tier,
        /// Raw text is retained alongside the sanitized text for audit
        raw_text: String,
        sanitized_text: String,
        interpretation: Interpretation,
        outcome: DraftOutcome,
    },
    ProposalRevised {
        proposal_id: Uuid,
        governor: GovernorId,
        /// Tier re-resolved against the replacement candidate
        tier: Tier,
        raw_text: String,
        sanitized_text: String,
        interpretation: Interpretation,
        outcome: DraftOutcome,
    },
    ProposalConfirmed {
        proposal_id: Uuid,
        governor: GovernorId,
        /// Rule space version the candidate was validated against
        rule_space_version: u32,
        round: u64,
    },
    ProposalCancelled {
        proposal_id: Uuid,
        governor: GovernorId,
    },
    ProposalAmended {
        proposal_id: Uuid,
        governor: GovernorId,
        raw_text: String,
        sanitized_text: String,
        interpretation: Interpretation,
    },
    VoteCast {
        proposal_id: Uuid,
        governor: GovernorId,
        choice: VoteChoice,
        boosted: bool,
        weight: f64,
    },
    TokensGranted {
        governor: GovernorId,
        propose: u32,
        amend: u32,
        boost: u32,
        round: u64,
    },
    TokensSpent {
        governor: GovernorId,
        token: TokenKind,
        amount: u32,
        reason: SpendReason,
        proposal_id: Option<Uuid>,
    },
    TallyResolved {
        season_id: String,
        round: u64,
        proposal_id: Uuid,
        outcome: Outcome,
        yes_weight: f64,
        no_weight: f64,
        ratio: Option<f64>,
        threshold: f64,
    },
    RuleEnacted {
        proposal_id: Uuid,
        /// Version number of the rule set produced by this enactment
        version: u64,
        round: u64,
        candidate: Candidate,
    },
    TradeOffered {
        offer_id: Uuid,
        from: GovernorId,
        to: GovernorId,
        token: TokenKind,
        amount: u32,
    },
    TradeResolved {
        offer_id: Uuid,
        accepted: bool,
    },
}

impl EventPayload {
    /// Kind tag, denormalized into its own column for log queries.
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::ProposalDrafted { .. } => "proposal_drafted",
            EventPayload::ProposalRevised { .. } => "proposal_revised",
            EventPayload::ProposalConfirmed { .. } => "proposal_confirmed",
            EventPayload::ProposalCancelled { .. } => "proposal_cancelled",
            EventPayload::ProposalAmended { .. } => "proposal_amended",
            EventPayload::VoteCast { .. } => "vote_cast",
            EventPayload::TokensGranted { .. } => "tokens_granted",
            EventPayload::TokensSpent { .. } => "tokens_spent",
            EventPayload::TallyResolved { .. } => "tally_resolved",
            EventPayload::RuleEnacted { .. } => "rule_enacted",
            EventPayload::TradeOffered { .. } => "trade_offered",
            EventPayload::TradeResolved { .. } => "trade_resolved",
        }
    }
}
