//! SKIRMISH Core - Utility-based tactical AI
//!
//! This crate provides the per-unit decision engine:
//! - Board geometry (hex grid with axial coordinates) and cover levels
//! - Units, skills and role weights
//! - Tile-scoring criteria and candidate-action behaviors
//! - The agent pipeline that turns them into one chosen action
//! - A sandbox battlefield implementing the `World` seam

pub mod agent;
pub mod battlefield;
pub mod behavior;
pub mod board;
pub mod config;
pub mod context;
pub mod criterion;
pub mod error;
pub mod role;
pub mod skill;
pub mod tile;
pub mod unit;
pub mod world;

// Re-exports for convenient access
pub use agent::{Agent, AgentState, Evaluation, TurnEndReason};
pub use battlefield::{Battlefield, CoverEntry, Scenario};
pub use behavior::{Action, Behavior, BehaviorKind, DedupKey};
pub use board::{CoverLevel, Hex, DIRECTIONS, MAX_BOARD_RADIUS};
pub use config::EngineConfig;
pub use context::EvalContext;
pub use criterion::{Criterion, CriterionKind, CriterionRegistry};
pub use error::{RuleError, ScenarioError};
pub use role::RoleData;
pub use skill::{HitChance, Skill, SkillId, SkillTag, SkillType};
pub use tile::{Contribution, TileMap, TileScore};
pub use unit::{selection_multiplier, FactionId, Suppression, Unit, UnitId};
pub use world::{KnownOpponent, World};
