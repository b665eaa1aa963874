//! # Lane Core
//!
//! Deterministic combat and movement simulation for lane battles.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless batch runs
//! - Snapshot and restore
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`agent`] - Melee and ranged agents
//! - [`projectile`] - Projectiles fired by ranged agents
//! - [`structure`] - Faction bases
//! - [`spawner`] - Periodic agent spawners
//! - [`edge`] - Screen-edge base detection
//! - [`spatial`] - Lane-bucketed proximity queries
//! - [`systems`] - Detection and resolution queries
//! - [`simulation`] - Core simulation loop
//! - [`economy`] - Economy collaborator seam
//! - [`events`] - Simulation events and listeners
//! - [`data`] - Unit templates and battle configuration
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod agent;
pub mod components;
pub mod data;
pub mod economy;
pub mod edge;
pub mod error;
pub mod events;
pub mod factions;
pub mod math;
pub mod projectile;
pub mod simulation;
pub mod spatial;
pub mod spawner;
pub mod structure;
pub mod systems;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{Agent, AgentView};
    pub use crate::components::*;
    pub use crate::data::{BattleConfig, LaneConfig, UnitData, UnitRoster};
    pub use crate::economy::{Economy, RewardPolicy, Wallet};
    pub use crate::error::{GameError, Result, SpawnError};
    pub use crate::events::{SimEvent, SimListener, Subject, TickEvents};
    pub use crate::factions::Faction;
    pub use crate::math::{ratio, Fixed, Vec2Fixed};
    pub use crate::simulation::{MatchOutcome, Simulation, TICK_RATE};
}
