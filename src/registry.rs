//! Rule space registry — the catalog of governable parameters and effect
//! vocabularies
//!
//! Pure data: no validation logic lives here. The validator checks candidates
//! against a snapshot of this catalog; snapshots are versioned so a later
//! catalog change never retroactively invalidates a historical decision.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Declared type of a governable parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Integer,
    Real,
    Boolean,
    Enum,
}

/// A parameter value, as it appears in candidates and rule-set versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Choice(String),
}

impl ParamValue {
    pub fn type_of(&self) -> ParamType {
        match self {
            ParamValue::Boolean(_) => ParamType::Boolean,
            ParamValue::Integer(_) => ParamType::Integer,
            ParamValue::Real(_) => ParamType::Real,
            ParamValue::Choice(_) => ParamType::Enum,
        }
    }

    /// Numeric view for range checks; booleans and choices have none.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Integer(v) => Some(*v as f64),
            ParamValue::Real(v) => Some(*v),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Boolean(v) => write!(f, "{}", v),
            ParamValue::Integer(v) => write!(f, "{}", v),
            ParamValue::Real(v) => write!(f, "{}", v),
            ParamValue::Choice(v) => write!(f, "{}", v),
        }
    }
}

/// Definition of one governable parameter. Immutable; the current value
/// lives in the rule-set version, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleParameter {
    pub name: String,
    pub kind: ParamType,
    pub default: ParamValue,

    /// Inclusive numeric range, for integer/real parameters
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,

    /// Allowed values, for enum parameters
    #[serde(default)]
    pub choices: Vec<String>,

    /// Minimum approval tier required to change this parameter
    #[serde(default = "default_param_tier")]
    pub tier: u8,
}

fn default_param_tier() -> u8 {
    1
}

/// Effect vocabulary: the closed sets of trigger/condition/action terms an
/// interpreted effect may reference, plus the action magnitude bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectVocabulary {
    pub triggers: BTreeSet<String>,
    pub conditions: BTreeSet<String>,
    pub actions: BTreeSet<String>,

    #[serde(default = "default_max_magnitude")]
    pub max_magnitude: f64,
}

fn default_max_magnitude() -> f64 {
    4.0
}

/// A versioned snapshot of the governable rule space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpace {
    pub version: u32,
    pub params: BTreeMap<String, RuleParameter>,
    pub vocabulary: EffectVocabulary,
}

impl RuleSpace {
    /// Load a catalog from a YAML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading rule space catalog {}", path))?;
        let space: RuleSpace =
            serde_yaml::from_str(&content).with_context(|| format!("parsing catalog {}", path))?;
        info!(
            path,
            version = space.version,
            params = space.params.len(),
            "Loaded rule space catalog"
        );
        Ok(space)
    }

    /// Load from a file when configured, otherwise the built-in catalog.
    pub fn load_or_builtin(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) if Path::new(p).exists() => Self::load(p),
            Some(p) => anyhow::bail!("rule space catalog not found: {}", p),
            None => Ok(Self::builtin()),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&RuleParameter> {
        self.params.get(name)
    }

    /// The built-in catalog for the possession simulation.
    pub fn builtin() -> Self {
        let mut params = BTreeMap::new();
        let mut add = |p: RuleParameter| {
            params.insert(p.name.clone(), p);
        };

        add(RuleParameter {
            name: "shot_clock_secs".into(),
            kind: ParamType::Integer,
            default: ParamValue::Integer(24),
            min: Some(6.0),
            max: Some(48.0),
            choices: vec![],
            tier: 2,
        });
        add(RuleParameter {
            name: "quarter_length_minutes".into(),
            kind: ParamType::Integer,
            default: ParamValue::Integer(12),
            min: Some(4.0),
            max: Some(20.0),
            choices: vec![],
            tier: 3,
        });
        add(RuleParameter {
            name: "three_point_value".into(),
            kind: ParamType::Integer,
            default: ParamValue::Integer(3),
            min: Some(1.0),
            max: Some(5.0),
            choices: vec![],
            tier: 3,
        });
        add(RuleParameter {
            name: "free_throw_value".into(),
            kind: ParamType::Integer,
            default: ParamValue::Integer(1),
            min: Some(1.0),
            max: Some(3.0),
            choices: vec![],
            tier: 2,
        });
        add(RuleParameter {
            name: "foul_out_limit".into(),
            kind: ParamType::Integer,
            default: ParamValue::Integer(6),
            min: Some(3.0),
            max: Some(10.0),
            choices: vec![],
            tier: 1,
        });
        add(RuleParameter {
            name: "overtime_length_minutes".into(),
            kind: ParamType::Integer,
            default: ParamValue::Integer(5),
            min: Some(2.0),
            max: Some(10.0),
            choices: vec![],
            tier: 1,
        });
        add(RuleParameter {
            name: "stamina_drain_rate".into(),
            kind: ParamType::Real,
            default: ParamValue::Real(1.0),
            min: Some(0.25),
            max: Some(3.0),
            choices: vec![],
            tier: 2,
        });
        add(RuleParameter {
            name: "home_court_bonus".into(),
            kind: ParamType::Real,
            default: ParamValue::Real(0.02),
            min: Some(0.0),
            max: Some(0.10),
            choices: vec![],
            tier: 2,
        });
        add(RuleParameter {
            name: "goaltending_enforced".into(),
            kind: ParamType::Boolean,
            default: ParamValue::Boolean(true),
            min: None,
            max: None,
            choices: vec![],
            tier: 4,
        });
        add(RuleParameter {
            name: "default_defense_scheme".into(),
            kind: ParamType::Enum,
            default: ParamValue::Choice("man".into()),
            min: None,
            max: None,
            choices: vec!["man".into(), "zone".into(), "switch_all".into()],
            tier: 1,
        });

        let vocabulary = EffectVocabulary {
            triggers: [
                "made_three",
                "made_dunk",
                "steal",
                "block",
                "buzzer_beater",
                "fourth_quarter_start",
                "overtime_start",
                "lead_change",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            conditions: [
                "always",
                "home_team",
                "away_team",
                "clutch_time",
                "score_margin_over_10",
                "score_margin_under_5",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            actions: [
                "double_points",
                "bonus_free_throw",
                "shorten_shot_clock",
                "extend_shot_clock",
                "boost_stamina",
                "drain_stamina",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_magnitude: default_max_magnitude(),
        };

        Self {
            version: 1,
            params,
            vocabulary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_coherent() {
        let space = RuleSpace::builtin();
        assert!(space.params.len() >= 8);

        for (name, p) in &space.params {
            assert_eq!(name, &p.name);
            assert_eq!(p.default.type_of(), p.kind, "default type for {}", name);
            if let Some(v) = p.default.as_number() {
                assert!(v >= p.min.unwrap(), "{} default below min", name);
                assert!(v <= p.max.unwrap(), "{} default above max", name);
            }
            if p.kind == ParamType::Enum {
                match &p.default {
                    ParamValue::Choice(c) => assert!(p.choices.contains(c)),
                    other => panic!("enum default for {} is {:?}", name, other),
                }
            }
            assert!((1..=5).contains(&p.tier));
        }
    }

    #[test]
    fn catalog_roundtrips_through_yaml() {
        let space = RuleSpace::builtin();
        let yaml = serde_yaml::to_string(&space).unwrap();
        let back: RuleSpace = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.version, space.version);
        assert_eq!(back.params.len(), space.params.len());
        assert_eq!(back.vocabulary.triggers, space.vocabulary.triggers);
    }

    #[test]
    fn param_value_untagged_serde() {
        let v: ParamValue = serde_json::from_str("24").unwrap();
        assert_eq!(v, ParamValue::Integer(24));
        let v: ParamValue = serde_json::from_str("0.5").unwrap();
        assert_eq!(v, ParamValue::Real(0.5));
        let v: ParamValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, ParamValue::Boolean(true));
        let v: ParamValue = serde_json::from_str("\"zone\"").unwrap();
        assert_eq!(v, ParamValue::Choice("zone".into()));
    }
}
