//! Rule-set versions and the enactment applier
//!
//! A [`RuleSetVersion`] is an immutable snapshot of every parameter's current
//! value plus the active effects, tagged with a monotonically increasing
//! version number. Enactment builds the next version from the previous one;
//! the simulation only ever observes fully constructed versions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::interpret::{Candidate, EffectDuration, EffectSpec};
use crate::registry::{ParamValue, RuleSpace};

/// An enacted effect with its expiry bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub proposal_id: Uuid,
    pub spec: EffectSpec,
    pub enacted_round: u64,
    /// Last round this effect is active for; `None` means indefinite
    pub expires_after_round: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetVersion {
    pub number: u64,
    pub values: BTreeMap<String, ParamValue>,
    pub effects: Vec<ActiveEffect>,
}

impl RuleSetVersion {
    /// Version 0: every parameter at its default, no effects.
    pub fn genesis(rule_space: &RuleSpace) -> Self {
        Self {
            number: 0,
            values: rule_space
                .params
                .values()
                .map(|p| (p.name.clone(), p.default.clone()))
                .collect(),
            effects: Vec::new(),
        }
    }

    /// Apply a passed candidate, producing the next version in place.
    ///
    /// Fails without mutating anything when the candidate no longer lines up
    /// with the current value set (registry drift between confirmation and
    /// enactment). The caller marks the proposal Failed in that case.
    pub fn enact(
        &mut self,
        candidate: &Candidate,
        proposal_id: Uuid,
        round: u64,
    ) -> Result<(), String> {
        match candidate {
            Candidate::RuleChange(change) => {
                for mutation in &change.mutations {
                    if !self.values.contains_key(&mutation.param) {
                        return Err(format!(
                            "parameter '{}' is no longer governable",
                            mutation.param
                        ));
                    }
                }
                for mutation in &change.mutations {
                    self.values
                        .insert(mutation.param.clone(), mutation.value.clone());
                }
            }
            Candidate::Effect(spec) => {
                let expires_after_round = match spec.duration {
                    EffectDuration::Rounds(n) => Some(round + n as u64),
                    EffectDuration::Indefinite => None,
                };
                self.effects.push(ActiveEffect {
                    proposal_id,
                    spec: spec.clone(),
                    enacted_round: round,
                    expires_after_round,
                });
            }
            Candidate::Rejection(r) => {
                return Err(format!("rejection cannot be enacted: {}", r.reason));
            }
        }
        self.number += 1;
        Ok(())
    }

    /// Drop effects whose duration ended before `round`. Returns how many
    /// were retired; the version number bumps only when something changed.
    pub fn retire_expired(&mut self, round: u64) -> usize {
        let before = self.effects.len();
        self.effects
            .retain(|e| e.expires_after_round.map_or(true, |last| round <= last));
        let retired = before - self.effects.len();
        if retired > 0 {
            self.number += 1;
        }
        retired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::{ParamMutation, RuleChange, Scope};

    fn genesis() -> RuleSetVersion {
        RuleSetVersion::genesis(&RuleSpace::builtin())
    }

    fn effect_spec(duration: EffectDuration) -> EffectSpec {
        EffectSpec {
            trigger: "made_three".into(),
            condition: "always".into(),
            action: "double_points".into(),
            magnitude: 2.0,
            scope: Scope::Game,
            duration,
            then: None,
        }
    }

    #[test]
    fn genesis_carries_defaults_at_version_zero() {
        let v = genesis();
        assert_eq!(v.number, 0);
        assert_eq!(v.values["shot_clock_secs"], ParamValue::Integer(24));
        assert!(v.effects.is_empty());
    }

    #[test]
    fn enacting_a_change_bumps_the_version() {
        let mut v = genesis();
        let candidate = Candidate::RuleChange(RuleChange {
            mutations: vec![ParamMutation {
                param: "shot_clock_secs".into(),
                value: ParamValue::Integer(14),
            }],
        });
        v.enact(&candidate, Uuid::new_v4(), 4).unwrap();
        assert_eq!(v.number, 1);
        assert_eq!(v.values["shot_clock_secs"], ParamValue::Integer(14));
    }

    #[test]
    fn unknown_parameter_is_a_conflict_and_mutates_nothing() {
        let mut v = genesis();
        let candidate = Candidate::RuleChange(RuleChange {
            mutations: vec![
                ParamMutation {
                    param: "shot_clock_secs".into(),
                    value: ParamValue::Integer(14),
                },
                ParamMutation {
                    param: "vanished_param".into(),
                    value: ParamValue::Integer(1),
                },
            ],
        });
        assert!(v.enact(&candidate, Uuid::new_v4(), 4).is_err());
        assert_eq!(v.number, 0);
        assert_eq!(v.values["shot_clock_secs"], ParamValue::Integer(24));
    }

    #[test]
    fn effects_expire_by_duration() {
        let mut v = genesis();
        let candidate = Candidate::Effect(effect_spec(EffectDuration::Rounds(2)));
        v.enact(&candidate, Uuid::new_v4(), 4).unwrap();
        assert_eq!(v.effects.len(), 1);
        assert_eq!(v.effects[0].expires_after_round, Some(6));

        // Still active through round 6
        assert_eq!(v.retire_expired(6), 0);
        assert_eq!(v.number, 1);

        // Gone at round 7, with a version bump
        assert_eq!(v.retire_expired(7), 1);
        assert!(v.effects.is_empty());
        assert_eq!(v.number, 2);
    }

    #[test]
    fn indefinite_effects_never_expire() {
        let mut v = genesis();
        let candidate = Candidate::Effect(effect_spec(EffectDuration::Indefinite));
        v.enact(&candidate, Uuid::new_v4(), 1).unwrap();
        assert_eq!(v.retire_expired(1_000_000), 0);
        assert_eq!(v.effects.len(), 1);
    }
}
