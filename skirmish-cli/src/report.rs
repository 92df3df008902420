//! Shared loading and output helpers
//!
//! Level 4 - Utilities

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use skirmish_core::{Action, EngineConfig, Evaluation, Hex, TileScore};

/// Engine configuration from a file, or the defaults
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load engine config: {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// JSON form of an action
#[derive(Clone, Debug, Serialize)]
pub struct ActionRecord {
    pub unit: u32,
    pub kind: String,
    pub tile: Hex,
    pub target: Option<u32>,
    pub skill: Option<u32>,
}

impl From<&Action> for ActionRecord {
    fn from(action: &Action) -> Self {
        Self {
            unit: action.unit.0,
            kind: format!("{:?}", action.kind),
            tile: action.tile,
            target: action.target.map(|t| t.0),
            skill: action.skill.map(|s| s.0),
        }
    }
}

/// JSON form of a scored tile
#[derive(Clone, Debug, Serialize)]
pub struct TileRecord {
    pub tile: Hex,
    pub final_score: f32,
    pub utility: f32,
    pub safety: f32,
    pub distance: f32,
}

impl From<&TileScore> for TileRecord {
    fn from(t: &TileScore) -> Self {
        Self {
            tile: t.tile,
            final_score: t.final_score,
            utility: t.utility_score,
            safety: t.safety_score,
            distance: t.distance_score,
        }
    }
}

/// Short outcome name and the ready score, if any
pub fn outcome(evaluation: &Evaluation) -> (String, Option<f32>) {
    match evaluation {
        Evaluation::Ready { score } => ("Ready".to_string(), Some(*score)),
        Evaluation::TurnEnded(reason) => (format!("TurnEnded({:?})", reason), None),
        other => (format!("{:?}", other), None),
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}
