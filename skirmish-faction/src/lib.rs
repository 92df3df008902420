//! SKIRMISH Faction - Pooled decisions across a faction's agents
//!
//! This crate schedules the agents of one faction:
//! - Concurrent evaluation of every agent
//! - Pooled selection of the best adjusted score
//! - Turn loop applying actions to the sandbox battlefield
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: Faction::run_turn (orchestration)
//! - Level 2: evaluate_all, pick_next (phases)
//! - Level 3: step (single action)
//! - Level 4: configuration

mod config;
mod faction;

pub use config::FactionConfig;
pub use faction::{Faction, TurnReport};
