//! Schema/range/tier validator
//!
//! Pure, deterministic, in-process. This is the only hard backstop between
//! interpreter output and the event log — nothing the interpreter emits may
//! bypass it. Acceptance is all-or-nothing per proposal; the first failed
//! check wins and is reported verbatim.

use crate::error::ValidationError;
use crate::interpret::{Candidate, EffectSpec, RuleChange, Scope, MAX_EFFECT_DEPTH};
use crate::proposal::Tier;
use crate::registry::{ParamType, RuleSpace};

/// Lowest tier entitled to enact a given candidate.
pub fn required_tier(candidate: &Candidate, rule_space: &RuleSpace) -> Tier {
    match candidate {
        Candidate::RuleChange(change) => {
            let max = change
                .mutations
                .iter()
                .filter_map(|m| rule_space.parameter(&m.param))
                .map(|p| p.tier)
                .max()
                .unwrap_or(1);
            Tier(max)
        }
        Candidate::Effect(effect) => Tier(effect_tier(effect)),
        Candidate::Rejection(_) => Tier(1),
    }
}

fn effect_tier(effect: &EffectSpec) -> u8 {
    let base = match effect.scope {
        Scope::Game => 2,
        Scope::League => 4,
    };
    let base = match effect.duration {
        crate::interpret::EffectDuration::Indefinite => base.max(4),
        crate::interpret::EffectDuration::Rounds(_) => base,
    };
    match &effect.then {
        Some(next) => base.max(effect_tier(next)),
        None => base,
    }
}

/// Validate a candidate against a rule space snapshot.
///
/// Checks, in order: structural conformance, registry membership, numeric
/// ranges, effect chain depth and vocabulary, tier entitlement, and the
/// mutation-count ceiling. `Rejection` candidates are not validatable and
/// must be handled before this call.
pub fn validate(
    candidate: &Candidate,
    rule_space: &RuleSpace,
    claimed_tier: Tier,
    max_mutations: usize,
) -> Result<(), ValidationError> {
    match candidate {
        Candidate::Rejection(r) => Err(ValidationError::Malformed(format!(
            "rejection is not an enactable candidate: {}",
            r.reason
        ))),
        Candidate::RuleChange(change) => {
            validate_rule_change(change, rule_space)?;
            check_tier(candidate, rule_space, claimed_tier)?;
            check_mutation_count(change.mutations.len(), max_mutations)
        }
        Candidate::Effect(effect) => {
            validate_effect(effect, rule_space)?;
            check_tier(candidate, rule_space, claimed_tier)?;
            check_mutation_count(effect.chain_len(), max_mutations)
        }
    }
}

fn validate_rule_change(change: &RuleChange, rule_space: &RuleSpace) -> Result<(), ValidationError> {
    if change.mutations.is_empty() {
        return Err(ValidationError::Malformed(
            "rule change carries no mutations".into(),
        ));
    }

    for mutation in &change.mutations {
        let param = rule_space
            .parameter(&mutation.param)
            .ok_or_else(|| ValidationError::UnknownParameter(mutation.param.clone()))?;

        // Declared type must match the supplied value. An integer is
        // acceptable where a real is declared; nothing else coerces.
        let supplied = mutation.value.type_of();
        let type_ok = supplied == param.kind
            || (param.kind == ParamType::Real && supplied == ParamType::Integer);
        if !type_ok {
            return Err(ValidationError::OutOfRange {
                param: param.name.clone(),
                detail: format!("expected {:?} value, got {:?}", param.kind, supplied),
            });
        }

        match param.kind {
            ParamType::Integer | ParamType::Real => {
                let v = mutation.value.as_number().ok_or_else(|| {
                    ValidationError::OutOfRange {
                        param: param.name.clone(),
                        detail: "expected a numeric value".into(),
                    }
                })?;
                if !v.is_finite() {
                    return Err(ValidationError::OutOfRange {
                        param: param.name.clone(),
                        detail: "value is not finite".into(),
                    });
                }
                if let Some(min) = param.min {
                    if v < min {
                        return Err(ValidationError::OutOfRange {
                            param: param.name.clone(),
                            detail: format!("{} is below minimum {}", v, min),
                        });
                    }
                }
                if let Some(max) = param.max {
                    if v > max {
                        return Err(ValidationError::OutOfRange {
                            param: param.name.clone(),
                            detail: format!("{} is above maximum {}", v, max),
                        });
                    }
                }
            }
            ParamType::Boolean => {}
            ParamType::Enum => {
                let choice = match &mutation.value {
                    crate::registry::ParamValue::Choice(c) => c,
                    _ => unreachable!("type checked above"),
                };
                if !param.choices.contains(choice) {
                    return Err(ValidationError::OutOfRange {
                        param: param.name.clone(),
                        detail: format!(
                            "'{}' is not one of [{}]",
                            choice,
                            param.choices.join(", ")
                        ),
                    });
                }
            }
        }
    }

    Ok(())
}

fn validate_effect(effect: &EffectSpec, rule_space: &RuleSpace) -> Result<(), ValidationError> {
    let depth = effect.chain_depth();
    if depth > MAX_EFFECT_DEPTH {
        return Err(ValidationError::EffectDepthExceeded {
            depth,
            max: MAX_EFFECT_DEPTH,
        });
    }

    let vocab = &rule_space.vocabulary;
    let mut link = Some(effect);
    while let Some(e) = link {
        if !vocab.triggers.contains(&e.trigger) {
            return Err(ValidationError::UnknownParameter(format!(
                "trigger '{}'",
                e.trigger
            )));
        }
        if !vocab.conditions.contains(&e.condition) {
            return Err(ValidationError::UnknownParameter(format!(
                "condition '{}'",
                e.condition
            )));
        }
        if !vocab.actions.contains(&e.action) {
            return Err(ValidationError::UnknownParameter(format!(
                "action '{}'",
                e.action
            )));
        }
        if !e.magnitude.is_finite() || e.magnitude <= 0.0 || e.magnitude > vocab.max_magnitude {
            return Err(ValidationError::OutOfRange {
                param: format!("action '{}' magnitude", e.action),
                detail: format!(
                    "{} is outside (0, {}]",
                    e.magnitude, vocab.max_magnitude
                ),
            });
        }
        link = e.then.as_deref();
    }

    Ok(())
}

fn check_tier(
    candidate: &Candidate,
    rule_space: &RuleSpace,
    claimed: Tier,
) -> Result<(), ValidationError> {
    let required = required_tier(candidate, rule_space);
    if claimed < required {
        return Err(ValidationError::TierMismatch {
            claimed: claimed.0,
            required: required.0,
        });
    }
    Ok(())
}

fn check_mutation_count(count: usize, max: usize) -> Result<(), ValidationError> {
    if count > max {
        return Err(ValidationError::TooManyMutations { count, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::{EffectDuration, ParamMutation};
    use crate::registry::ParamValue;

    fn space() -> RuleSpace {
        RuleSpace::builtin()
    }

    fn change(param: &str, value: ParamValue) -> Candidate {
        Candidate::RuleChange(RuleChange {
            mutations: vec![ParamMutation {
                param: param.into(),
                value,
            }],
        })
    }

    fn effect(trigger: &str, condition: &str, action: &str) -> EffectSpec {
        EffectSpec {
            trigger: trigger.into(),
            condition: condition.into(),
            action: action.into(),
            magnitude: 2.0,
            scope: Scope::Game,
            duration: EffectDuration::Rounds(3),
            then: None,
        }
    }

    #[test]
    fn accepts_a_well_formed_rule_change() {
        let c = change("shot_clock_secs", ParamValue::Integer(14));
        assert!(validate(&c, &space(), Tier(2), 3).is_ok());
    }

    #[test]
    fn unknown_parameter_is_reported() {
        let c = change("dunk_gravity", ParamValue::Integer(1));
        let err = validate(&c, &space(), Tier(5), 3).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownParameter(_)));
    }

    #[test]
    fn out_of_range_value_is_reported() {
        let c = change("shot_clock_secs", ParamValue::Integer(99));
        let err = validate(&c, &space(), Tier(5), 3).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));

        let c = change("shot_clock_secs", ParamValue::Integer(5));
        let err = validate(&c, &space(), Tier(5), 3).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn boundary_values_are_inclusive() {
        assert!(validate(&change("shot_clock_secs", ParamValue::Integer(6)), &space(), Tier(5), 3).is_ok());
        assert!(validate(&change("shot_clock_secs", ParamValue::Integer(48)), &space(), Tier(5), 3).is_ok());
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let c = change("shot_clock_secs", ParamValue::Boolean(true));
        let err = validate(&c, &space(), Tier(5), 3).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn enum_choice_must_be_known() {
        let c = change("default_defense_scheme", ParamValue::Choice("zone".into()));
        assert!(validate(&c, &space(), Tier(1), 3).is_ok());

        let c = change("default_defense_scheme", ParamValue::Choice("triangle".into()));
        let err = validate(&c, &space(), Tier(5), 3).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn tier_must_cover_the_change() {
        // three_point_value requires tier 3
        let c = change("three_point_value", ParamValue::Integer(4));
        let err = validate(&c, &space(), Tier(1), 3).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TierMismatch {
                claimed: 1,
                required: 3
            }
        ));
        assert!(validate(&c, &space(), Tier(3), 3).is_ok());
        // Claiming higher than required is a deliberate choice, not an error
        assert!(validate(&c, &space(), Tier(5), 3).is_ok());
    }

    #[test]
    fn effect_vocabulary_is_closed() {
        let e = Candidate::Effect(effect("made_three", "always", "double_points"));
        assert!(validate(&e, &space(), Tier(2), 3).is_ok());

        let e = Candidate::Effect(effect("full_moon", "always", "double_points"));
        let err = validate(&e, &space(), Tier(5), 3).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownParameter(_)));
    }

    #[test]
    fn effect_chain_depth_is_capped() {
        let mut e = effect("steal", "always", "boost_stamina");
        e.then = Some(Box::new(effect("steal", "always", "boost_stamina")));
        e.then.as_mut().unwrap().then = Some(Box::new(effect("steal", "always", "boost_stamina")));
        // Depth 3 passes but counts as 3 mutations
        assert!(validate(&Candidate::Effect(e.clone()), &space(), Tier(2), 3).is_ok());

        let mut four = e.clone();
        four.then
            .as_mut()
            .unwrap()
            .then
            .as_mut()
            .unwrap()
            .then = Some(Box::new(effect("steal", "always", "boost_stamina")));
        let err = validate(&Candidate::Effect(four), &space(), Tier(5), 9).unwrap_err();
        assert!(matches!(err, ValidationError::EffectDepthExceeded { depth: 4, max: 3 }));
    }

    #[test]
    fn magnitude_is_bounded() {
        let mut e = effect("made_three", "always", "double_points");
        e.magnitude = 100.0;
        let err = validate(&Candidate::Effect(e), &space(), Tier(5), 3).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn mutation_count_is_capped() {
        let c = Candidate::RuleChange(RuleChange {
            mutations: vec![
                ParamMutation {
                    param: "shot_clock_secs".into(),
                    value: ParamValue::Integer(20),
                },
                ParamMutation {
                    param: "foul_out_limit".into(),
                    value: ParamValue::Integer(5),
                },
                ParamMutation {
                    param: "overtime_length_minutes".into(),
                    value: ParamValue::Integer(4),
                },
                ParamMutation {
                    param: "free_throw_value".into(),
                    value: ParamValue::Integer(2),
                },
            ],
        });
        let err = validate(&c, &space(), Tier(5), 3).unwrap_err();
        assert!(matches!(err, ValidationError::TooManyMutations { count: 4, max: 3 }));
    }

    #[test]
    fn league_scope_and_indefinite_effects_demand_higher_tiers() {
        let mut e = effect("made_three", "always", "double_points");
        e.scope = Scope::League;
        let err = validate(&Candidate::Effect(e.clone()), &space(), Tier(2), 3).unwrap_err();
        assert!(matches!(err, ValidationError::TierMismatch { required: 4, .. }));

        let mut e = effect("made_three", "always", "double_points");
        e.duration = EffectDuration::Indefinite;
        assert_eq!(required_tier(&Candidate::Effect(e), &space()), Tier(4));
    }

    #[test]
    fn empty_rule_change_is_malformed() {
        let c = Candidate::RuleChange(RuleChange { mutations: vec![] });
        let err = validate(&c, &space(), Tier(1), 3).unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }
}
