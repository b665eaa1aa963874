//! Data-driven definitions: unit templates and battle configuration.
//!
//! **Note:** This module contains no IO. It parses RON text handed to it;
//! reading files is the job of `lane_headless`.

mod battle_config;
mod unit_data;

pub use battle_config::{
    BattleConfig, DetectionTuning, LaneConfig, ProjectileTuning, MAX_VIEWPORT_PX,
};
pub use unit_data::{CombatData, UnitData, UnitRoster};
