//! Engine error taxonomy
//!
//! Every command surfaces errors synchronously with a machine-readable kind
//! and a human-readable reason. A rejected command never appends a partial
//! event.

use uuid::Uuid;

use crate::ledger::TokenKind;

/// Validation failures reported verbatim to the author. All of these are
/// recoverable by revising the proposal text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("malformed candidate: {0}")]
    Malformed(String),

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("value out of range for {param}: {detail}")]
    OutOfRange { param: String, detail: String },

    #[error("tier {claimed} cannot target this change (requires tier {required})")]
    TierMismatch { claimed: u8, required: u8 },

    #[error("effect chain depth {depth} exceeds maximum {max}")]
    EffectDepthExceeded { depth: usize, max: usize },

    #[error("proposal carries {count} mutations, maximum is {max}")]
    TooManyMutations { count: usize, max: usize },
}

/// Errors surfaced by governance commands.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The interpretation service declined or could not produce a
    /// schema-conformant candidate. Recoverable by revision.
    #[error("interpreter rejected the proposal: {reason}")]
    InterpreterRejection { reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("insufficient {kind} tokens: need {needed}, have {available}")]
    TokenInsufficient {
        kind: TokenKind,
        needed: u32,
        available: u32,
    },

    #[error("governor {governor} already voted on proposal {proposal}")]
    DuplicateVote { proposal: Uuid, governor: String },

    #[error("voting on proposal {proposal} closed at the tally boundary")]
    VoteAfterClose { proposal: Uuid },

    #[error("enactment conflict: {reason}")]
    EnactmentConflict { reason: String },

    #[error("unknown proposal: {0}")]
    UnknownProposal(Uuid),

    #[error("unknown governor: {0}")]
    UnknownGovernor(String),

    #[error("governor {governor} is not the author of proposal {proposal}")]
    NotAuthor { proposal: Uuid, governor: String },

    #[error("proposal {proposal} is {actual}, expected {expected}")]
    InvalidState {
        proposal: Uuid,
        expected: &'static str,
        actual: String,
    },

    #[error("unknown trade offer: {0}")]
    UnknownTrade(Uuid),

    #[error("trade offer {0} is already resolved")]
    TradeClosed(Uuid),

    #[error("event store error: {0}")]
    Store(String),
}

impl EngineError {
    /// Stable machine-readable kind, used by the API layer.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InterpreterRejection { .. } => "interpreter_rejection",
            EngineError::Validation(ValidationError::Malformed(_)) => "malformed_candidate",
            EngineError::Validation(ValidationError::UnknownParameter(_)) => "unknown_parameter",
            EngineError::Validation(ValidationError::OutOfRange { .. }) => "out_of_range",
            EngineError::Validation(ValidationError::TierMismatch { .. }) => "tier_mismatch",
            EngineError::Validation(ValidationError::EffectDepthExceeded { .. }) => {
                "effect_depth_exceeded"
            }
            EngineError::Validation(ValidationError::TooManyMutations { .. }) => {
                "too_many_mutations"
            }
            EngineError::TokenInsufficient { .. } => "token_insufficient",
            EngineError::DuplicateVote { .. } => "duplicate_vote",
            EngineError::VoteAfterClose { .. } => "vote_after_close",
            EngineError::EnactmentConflict { .. } => "enactment_conflict",
            EngineError::UnknownProposal(_) => "unknown_proposal",
            EngineError::UnknownGovernor(_) => "unknown_governor",
            EngineError::NotAuthor { .. } => "not_author",
            EngineError::InvalidState { .. } => "invalid_state",
            EngineError::UnknownTrade(_) => "unknown_trade",
            EngineError::TradeClosed(_) => "trade_closed",
            EngineError::Store(_) => "store_error",
        }
    }
}
