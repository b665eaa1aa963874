//! Unit data structures for data-driven unit definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::CombatMode;
use crate::error::{GameError, Result};
use crate::math::{decimal_serde, ratio, Fixed, WORLD_LIMIT};

/// Combat section of a unit definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatData {
    /// Contact-range fighter.
    Melee,
    /// Projectile-firing fighter.
    Ranged {
        /// Detection and firing radius.
        #[serde(with = "decimal_serde")]
        range: Fixed,
        /// Projectile speed in world units per second.
        #[serde(with = "decimal_serde")]
        projectile_speed: Fixed,
    },
}

/// Data-driven unit definition.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     id: "footman",
///     name: "Footman",
///     cost: 30,
///     health: 25,
///     speed: "2",
///     damage: 5,
///     attack_interval: "0.5",
///     combat: Melee,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitData {
    /// Unique string identifier for this unit type.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Spawn price. Also drives the kill reward for enemy units.
    pub cost: u32,

    /// Maximum health points.
    pub health: u32,

    /// Movement speed in world units per second.
    #[serde(with = "decimal_serde")]
    pub speed: Fixed,

    /// Damage per attack.
    pub damage: u32,

    /// Seconds between attacks.
    #[serde(with = "decimal_serde")]
    pub attack_interval: Fixed,

    /// Melee or ranged combat.
    pub combat: CombatData,
}

impl UnitData {
    /// Runtime combat mode for agents built from this definition.
    #[must_use]
    pub fn combat_mode(&self) -> CombatMode {
        match self.combat {
            CombatData::Melee => CombatMode::Melee,
            CombatData::Ranged {
                range,
                projectile_speed,
            } => CombatMode::Ranged {
                range,
                projectile_speed,
            },
        }
    }

    /// Check that the definition can drive a simulation.
    pub fn validate(&self) -> Result<()> {
        let fail = |what: &str| {
            Err(GameError::InvalidConfig(format!(
                "unit '{}': {}",
                self.id, what
            )))
        };

        if self.id.is_empty() {
            return Err(GameError::InvalidConfig("unit id is empty".to_string()));
        }
        if self.health == 0 {
            return fail("health must be positive");
        }
        if self.speed < Fixed::ZERO || self.speed > WORLD_LIMIT {
            return fail("speed must be in range");
        }
        if self.attack_interval <= Fixed::ZERO {
            return fail("attack_interval must be positive");
        }
        if let CombatData::Ranged {
            range,
            projectile_speed,
        } = self.combat
        {
            if range <= Fixed::ZERO || range > WORLD_LIMIT {
                return fail("ranged units need a positive range");
            }
            if projectile_speed <= Fixed::ZERO || projectile_speed > WORLD_LIMIT {
                return fail("ranged units need a positive projectile_speed");
            }
        }
        Ok(())
    }

    /// Sword infantry. Marches right at 2 u/s.
    #[must_use]
    pub fn footman() -> Self {
        Self {
            id: "footman".to_string(),
            name: "Footman".to_string(),
            cost: 30,
            health: 25,
            speed: Fixed::from_num(2),
            damage: 5,
            attack_interval: ratio(1, 2),
            combat: CombatData::Melee,
        }
    }

    /// Fast-hitting, fragile attacker used by the enemy waves.
    #[must_use]
    pub fn raider() -> Self {
        Self {
            id: "raider".to_string(),
            name: "Raider".to_string(),
            cost: 20,
            health: 15,
            speed: ratio(3, 2),
            damage: 10,
            attack_interval: ratio(7, 10),
            combat: CombatData::Melee,
        }
    }

    /// Bow unit that fires arrows over friendly lines.
    #[must_use]
    pub fn archer() -> Self {
        Self {
            id: "archer".to_string(),
            name: "Archer".to_string(),
            cost: 40,
            health: 15,
            speed: ratio(3, 2),
            damage: 4,
            attack_interval: Fixed::ONE,
            combat: CombatData::Ranged {
                range: Fixed::from_num(5),
                projectile_speed: Fixed::from_num(10),
            },
        }
    }
}

/// Registry of unit definitions keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRoster {
    units: BTreeMap<String, UnitData>,
}

impl UnitRoster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Roster with the stock footman, raider and archer.
    #[must_use]
    pub fn builtin() -> Self {
        let mut roster = Self::new();
        roster.insert(UnitData::footman());
        roster.insert(UnitData::raider());
        roster.insert(UnitData::archer());
        roster
    }

    /// Parse a RON list of [`UnitData`] and validate every entry.
    pub fn from_ron_str(source_name: &str, ron_text: &str) -> Result<Self> {
        let units: Vec<UnitData> =
            ron::from_str(ron_text).map_err(|e| GameError::DataParseError {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;

        let mut roster = Self::new();
        for unit in units {
            unit.validate()?;
            roster.insert(unit);
        }
        Ok(roster)
    }

    /// Add or replace a definition.
    pub fn insert(&mut self, unit: UnitData) {
        self.units.insert(unit.id.clone(), unit);
    }

    /// Look up a definition.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&UnitData> {
        self.units.get(id)
    }

    /// Look up a definition or report it as unknown.
    pub fn require(&self, id: &str) -> Result<&UnitData> {
        self.get(id)
            .ok_or_else(|| GameError::UnknownUnitType(id.to_string()))
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterate definitions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitData> {
        self.units.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_roster_is_valid() {
        let roster = UnitRoster::builtin();
        assert_eq!(roster.len(), 3);
        for unit in roster.iter() {
            unit.validate().unwrap();
        }
        assert!(roster.require("archer").unwrap().combat_mode().is_ranged());
        assert!(!roster.require("footman").unwrap().combat_mode().is_ranged());
    }

    #[test]
    fn test_unknown_unit_is_reported() {
        let roster = UnitRoster::builtin();
        let err = roster.require("catapult").unwrap_err();
        assert!(matches!(err, GameError::UnknownUnitType(ref id) if id == "catapult"));
    }

    #[test]
    fn test_roster_from_ron() {
        let text = r#"[
            UnitData(
                id: "pikeman",
                name: "Pikeman",
                cost: 35,
                health: 30,
                speed: "1.75",
                damage: 6,
                attack_interval: "0.6",
                combat: Melee,
            ),
            UnitData(
                id: "slinger",
                name: "Slinger",
                cost: 25,
                health: 10,
                speed: "2",
                damage: 3,
                attack_interval: "0.8",
                combat: Ranged(range: "4", projectile_speed: "8"),
            ),
        ]"#;

        let roster = UnitRoster::from_ron_str("inline", text).unwrap();
        assert_eq!(roster.len(), 2);
        let pikeman = roster.require("pikeman").unwrap();
        assert_eq!(pikeman.speed, ratio(7, 4));
        assert!(roster.require("slinger").unwrap().combat_mode().is_ranged());
    }

    #[test]
    fn test_roster_rejects_invalid_interval() {
        let text = r#"[
            UnitData(
                id: "statue",
                name: "Statue",
                cost: 0,
                health: 10,
                speed: "0",
                damage: 1,
                attack_interval: "0",
                combat: Melee,
            ),
        ]"#;

        let err = UnitRoster::from_ron_str("inline", text).unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn test_oversized_range_and_speed_rejected() {
        let mut archer = UnitData::archer();
        archer.combat = CombatData::Ranged {
            range: Fixed::MAX,
            projectile_speed: Fixed::from_num(10),
        };
        assert!(matches!(archer.validate(), Err(GameError::InvalidConfig(_))));

        let mut footman = UnitData::footman();
        footman.speed = Fixed::MAX;
        assert!(matches!(footman.validate(), Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn test_roster_reports_parse_errors() {
        let err = UnitRoster::from_ron_str("broken.ron", "[ UnitData( id: ").unwrap_err();
        assert!(matches!(
            err,
            GameError::DataParseError { ref source_name, .. } if source_name == "broken.ron"
        ));
    }
}
