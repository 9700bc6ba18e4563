//! Interpretation trust boundary
//!
//! The engine never trusts the reasoning service. The service receives only
//! the sanitized text and the current rule space snapshot — no game state, no
//! player identity, no prior proposals — and its output is constrained to the
//! closed [`Candidate`] schema. Anything that cannot be expressed in that
//! schema (timeouts, malformed output, explicit refusal) becomes a
//! [`Rejection`]; there is no freeform channel and no unstructured fault.

pub mod client;
pub mod stub;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::registry::{ParamValue, RuleSpace};

pub use client::HttpInterpreter;
pub use stub::ScriptedInterpreter;

/// Hard ceiling on effect chain nesting.
pub const MAX_EFFECT_DEPTH: usize = 3;

/// Where an effect applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Game,
    League,
}

/// How long an effect stays active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectDuration {
    /// Active for this many rounds after enactment
    Rounds(u32),
    Indefinite,
}

/// One parameter mutation within a rule change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamMutation {
    pub param: String,
    pub value: ParamValue,
}

/// A direct mutation of one or more governable parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleChange {
    pub mutations: Vec<ParamMutation>,
}

/// A conditional/temporary gameplay modifier. Chains nest through `then`,
/// bounded by [`MAX_EFFECT_DEPTH`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    pub trigger: String,
    pub condition: String,
    pub action: String,
    pub magnitude: f64,
    pub scope: Scope,
    pub duration: EffectDuration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then: Option<Box<EffectSpec>>,
}

impl EffectSpec {
    /// Nesting depth of this chain, counting this effect as 1.
    pub fn chain_depth(&self) -> usize {
        1 + self.then.as_ref().map_or(0, |e| e.chain_depth())
    }

    /// Number of links in the chain.
    pub fn chain_len(&self) -> usize {
        self.chain_depth()
    }
}

/// The service declined, or could not produce a conformant candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: String,
}

/// The closed output schema of the interpretation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Candidate {
    RuleChange(RuleChange),
    Effect(EffectSpec),
    Rejection(Rejection),
}

impl Candidate {
    pub fn rejection(reason: impl Into<String>) -> Self {
        Candidate::Rejection(Rejection {
            reason: reason.into(),
        })
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, Candidate::Rejection(_))
    }
}

/// An interpreted candidate plus the service's confidence in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub candidate: Candidate,
    pub confidence: f64,
}

impl Interpretation {
    pub fn rejection(reason: impl Into<String>) -> Self {
        Self {
            candidate: Candidate::rejection(reason),
            confidence: 1.0,
        }
    }
}

/// The capability injected at engine construction. Stateless and
/// idempotent-by-contract; implementations must map every failure mode to a
/// `Rejection` candidate rather than raising.
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn interpret(&self, sanitized: &str, rule_space: &RuleSpace) -> Interpretation;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_schema_is_tagged_and_closed() {
        let change = Candidate::RuleChange(RuleChange {
            mutations: vec![ParamMutation {
                param: "shot_clock_secs".into(),
                value: ParamValue::Integer(14),
            }],
        });
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["kind"], "rule_change");
        assert_eq!(json["mutations"][0]["param"], "shot_clock_secs");
        assert_eq!(json["mutations"][0]["value"], 14);

        let back: Candidate = serde_json::from_value(json).unwrap();
        assert_eq!(back, change);

        // Unknown kinds never deserialize into the schema
        let err = serde_json::from_str::<Candidate>(r#"{"kind":"free_text","text":"hi"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn effect_chain_depth_counts_nesting() {
        let leaf = EffectSpec {
            trigger: "steal".into(),
            condition: "always".into(),
            action: "boost_stamina".into(),
            magnitude: 1.0,
            scope: Scope::Game,
            duration: EffectDuration::Rounds(2),
            then: None,
        };
        assert_eq!(leaf.chain_depth(), 1);

        let mut chained = leaf.clone();
        chained.then = Some(Box::new(EffectSpec {
            then: Some(Box::new(leaf.clone())),
            ..leaf.clone()
        }));
        assert_eq!(chained.chain_depth(), 3);
    }

    #[test]
    fn duration_serde_shape() {
        let d = EffectDuration::Rounds(5);
        assert_eq!(serde_json::to_string(&d).unwrap(), r#"{"rounds":5}"#);
        let d = EffectDuration::Indefinite;
        assert_eq!(serde_json::to_string(&d).unwrap(), r#""indefinite""#);
    }
}
