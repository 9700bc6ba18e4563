//! League roster — teams and their governors
//!
//! A governor belongs to exactly one team per season. Vote weight is
//! normalized per team: each governor on a team of n carries 1/n, so every
//! team's total weight is exactly 1.0 regardless of roster size.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Unique identifier for a governor
pub type GovernorId = String;

/// Unique identifier for a team
pub type TeamId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub governors: Vec<GovernorId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct League {
    pub teams: Vec<Team>,
}

impl League {
    /// Load a league roster from a YAML file.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading league file {}", path))?;
        let league: League =
            serde_yaml::from_str(&content).with_context(|| format!("parsing league {}", path))?;
        info!(path, teams = league.teams.len(), "Loaded league roster");
        Ok(league)
    }

    pub fn load_or_demo(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                info!("No league file configured, using demo league");
                Ok(Self::demo())
            }
        }
    }

    /// The team a governor plays for, if any.
    pub fn team_of(&self, governor: &str) -> Option<&Team> {
        self.teams
            .iter()
            .find(|t| t.governors.iter().any(|g| g == governor))
    }

    /// Base vote weight for a governor: 1 / (roster size of their team).
    pub fn vote_weight(&self, governor: &str) -> Option<f64> {
        self.team_of(governor)
            .map(|t| 1.0 / t.governors.len() as f64)
    }

    /// All governors across all teams.
    pub fn governors(&self) -> impl Iterator<Item = &GovernorId> {
        self.teams.iter().flat_map(|t| t.governors.iter())
    }

    /// Four-team demo league for local runs.
    pub fn demo() -> Self {
        let team = |id: &str, name: &str, governors: &[&str]| Team {
            id: id.to_string(),
            name: name.to_string(),
            governors: governors.iter().map(|g| g.to_string()).collect(),
        };
        Self {
            teams: vec![
                team("thorns", "Thorns", &["ava", "ben", "cora"]),
                team("breakers", "Breakers", &["dev", "esi"]),
                team("foxes", "Foxes", &["finn"]),
                team("wolves", "Wolves", &["gia", "hugo"]),
            ],
        }
    }
}
