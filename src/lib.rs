//! floor-engine: governance engine for the Hooper League simulation
//!
//! Turns untrusted natural-language rule proposals into validated, versioned
//! mutations of the live simulation's parameter set:
//! - Sanitizer strips hostile text before anything else sees it
//! - An isolated interpretation service maps text to a closed candidate schema
//! - A deterministic validator checks the candidate against the rule space
//! - Confirmed proposals are voted on with normalized per-team weights
//! - Every state change is an append to an ordered event log; all reads are
//!   projections folded over that log
//! - Passing proposals enact a new immutable rule-set version consumed by the
//!   simulation at round boundaries
//!
//! See README.md and DESIGN.md for details.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod interpret;
pub mod league;
pub mod ledger;
pub mod proposal;
pub mod registry;
pub mod ruleset;
pub mod sanitize;
pub mod tally;
pub mod validate;

pub mod api;

pub use config::Config;
pub use engine::{GovernanceEngine, ProposeReceipt, SeasonCtx};
pub use error::EngineError;
pub use interpret::{Candidate, Interpretation, Interpreter};
pub use league::{GovernorId, League, Team, TeamId};
pub use proposal::{ProposalState, Tier};
pub use ruleset::RuleSetVersion;
pub use tally::{Outcome, TallyDecision};
