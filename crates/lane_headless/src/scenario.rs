//! Scenario loading and configuration.
//!
//! A scenario bundles a battle configuration, an optional roster override
//! and the scripted player orders the runner issues as the clock advances.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lane_core::data::{BattleConfig, UnitData, UnitRoster};
use lane_core::error::GameError;
use lane_core::math::{decimal_serde, Fixed};
use lane_core::simulation::TICK_RATE;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The scenario does not describe a playable battle.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
    /// The core rejected the battle.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// A player spawn issued at a fixed point in the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnOrder {
    /// Seconds into the match.
    #[serde(with = "decimal_serde")]
    pub at_seconds: Fixed,
    /// Unit id.
    pub unit: String,
    /// Lane index.
    pub lane: usize,
}

impl SpawnOrder {
    /// Create an order.
    #[must_use]
    pub fn new(at_seconds: Fixed, unit: impl Into<String>, lane: usize) -> Self {
        Self {
            at_seconds,
            unit: unit.into(),
            lane,
        }
    }

    /// Tick on which the order is issued.
    #[must_use]
    pub fn tick(&self) -> u64 {
        let ticks = self
            .at_seconds
            .max(Fixed::ZERO)
            .saturating_mul(Fixed::from_num(TICK_RATE));
        ticks.round().to_num::<u64>()
    }
}

fn default_max_seconds() -> u32 {
    300
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Battle layout and tuning.
    #[serde(default)]
    pub battle: BattleConfig,
    /// Unit definitions replacing the builtin roster.
    #[serde(default)]
    pub units: Option<Vec<UnitData>>,
    /// Scripted player spawns.
    #[serde(default)]
    pub orders: Vec<SpawnOrder>,
    /// Match time limit in simulated seconds.
    #[serde(default = "default_max_seconds")]
    pub max_seconds: u32,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario = Self::from_ron_str(&contents)?;
        tracing::info!(name = %scenario.name, path = %path.display(), "Scenario loaded");
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// The roster this scenario plays with.
    pub fn roster(&self) -> Result<UnitRoster, ScenarioError> {
        let Some(units) = &self.units else {
            return Ok(UnitRoster::builtin());
        };
        let mut roster = UnitRoster::new();
        for unit in units {
            unit.validate()?;
            roster.insert(unit.clone());
        }
        Ok(roster)
    }

    /// Check the battle, roster and orders fit together.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.battle.validate()?;
        let roster = self.roster()?;
        if self.max_seconds == 0 {
            return Err(ScenarioError::Invalid("max_seconds must be positive".to_string()));
        }
        for spawner in &self.battle.enemy_spawners {
            roster.require(&spawner.unit)?;
        }
        for order in &self.orders {
            roster.require(&order.unit)?;
            if order.at_seconds < Fixed::ZERO {
                return Err(ScenarioError::Invalid(format!(
                    "order for '{}' is scheduled before the match starts",
                    order.unit
                )));
            }
        }
        Ok(())
    }

    /// Time limit in ticks.
    #[must_use]
    pub fn max_ticks(&self) -> u64 {
        u64::from(self.max_seconds) * u64::from(TICK_RATE)
    }

    /// Stock three-lane skirmish: enemy raider waves against a scripted
    /// mix of footmen and archers.
    #[must_use]
    pub fn skirmish() -> Self {
        let orders = [
            (0, "footman", 1),
            (1, "archer", 1),
            (4, "footman", 0),
            (6, "footman", 2),
            (10, "archer", 0),
            (14, "footman", 1),
            (18, "archer", 2),
            (24, "footman", 1),
            (30, "footman", 0),
            (36, "footman", 2),
        ]
        .into_iter()
        .map(|(at, unit, lane)| SpawnOrder::new(Fixed::from_num(at), unit, lane))
        .collect();

        Self {
            name: "Skirmish".to_string(),
            description: "Three lanes, raider waves, scripted defence".to_string(),
            battle: BattleConfig::default(),
            units: None,
            orders,
            max_seconds: default_max_seconds(),
        }
    }
}
