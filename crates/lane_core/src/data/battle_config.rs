//! Battle configuration.
//!
//! Everything that shapes an encounter, from lane layout and base health
//! to detection tuning and enemy waves, lives in [`BattleConfig`]. Files
//! are RON with every field optional; omitted fields take the stock values.

use serde::{Deserialize, Serialize};

use crate::economy::RewardPolicy;
use crate::edge::Viewport;
use crate::error::{GameError, Result};
use crate::factions::Faction;
use crate::math::{decimal_serde, ratio, Fixed, WORLD_LIMIT};
use crate::spawner::{LanePolicy, SpawnInterval, SpawnerConfig};

/// Widest screen the edge mapping accepts, in pixels.
pub const MAX_VIEWPORT_PX: u32 = 1 << 16;

/// One horizontal lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneConfig {
    /// World y every agent in this lane is pinned to.
    #[serde(with = "decimal_serde")]
    pub y: Fixed,
    /// World x where player agents appear.
    #[serde(with = "decimal_serde")]
    pub player_spawn_x: Fixed,
    /// World x where enemy agents appear.
    #[serde(with = "decimal_serde")]
    pub enemy_spawn_x: Fixed,
}

impl LaneConfig {
    /// Spawn x for a faction.
    #[must_use]
    pub const fn spawn_x(&self, faction: Faction) -> Fixed {
        match faction {
            Faction::Player => self.player_spawn_x,
            Faction::Enemy => self.enemy_spawn_x,
        }
    }
}

/// Proximity query tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionTuning {
    /// How far ahead of a melee agent its probe circle is centred.
    #[serde(with = "decimal_serde")]
    pub probe_distance: Fixed,
    /// Radius of the melee probe circle.
    #[serde(with = "decimal_serde")]
    pub probe_radius: Fixed,
    /// Minimum alignment for a friendly to block a melee agent.
    #[serde(with = "decimal_serde")]
    pub block_alignment: Fixed,
    /// Minimum alignment for a ranged agent to consider a target.
    #[serde(with = "decimal_serde")]
    pub ranged_cone_alignment: Fixed,
    /// Half-width of each base's collider along the movement axis.
    #[serde(with = "decimal_serde")]
    pub structure_half_width: Fixed,
}

impl Default for DetectionTuning {
    fn default() -> Self {
        Self {
            probe_distance: ratio(1, 2),
            probe_radius: ratio(3, 10),
            block_alignment: ratio(1, 2),
            ranged_cone_alignment: ratio(3, 10),
            structure_half_width: ratio(1, 2),
        }
    }
}

/// Projectile tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Distance to the aim point that counts as arrival.
    #[serde(with = "decimal_serde")]
    pub arrival_threshold: Fixed,
    /// Radius searched for a victim on arrival.
    #[serde(with = "decimal_serde")]
    pub impact_radius: Fixed,
    /// Radius of in-flight contact with hostile agents.
    #[serde(with = "decimal_serde")]
    pub contact_radius: Fixed,
    /// Seconds before an unresolved projectile expires.
    #[serde(with = "decimal_serde")]
    pub lifetime: Fixed,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            arrival_threshold: ratio(1, 5),
            impact_radius: ratio(3, 10),
            contact_radius: ratio(1, 5),
            lifetime: Fixed::from_num(5),
        }
    }
}

/// Complete encounter definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Seed for every spawner's generator.
    pub seed: u64,
    /// Visible battlefield.
    pub viewport: Viewport,
    /// Distance past each edge where the bases sit, and the edge
    /// detection margin.
    #[serde(with = "decimal_serde")]
    pub edge_margin: Fixed,
    /// Player base health.
    pub player_base_health: u32,
    /// Enemy base health.
    pub enemy_base_health: u32,
    /// Lane layout, indexed from zero.
    pub lanes: Vec<LaneConfig>,
    /// Funds given to a freshly created wallet.
    pub starting_funds: i64,
    /// Maximum simultaneously alive player agents.
    pub player_unit_cap: usize,
    /// Kill reward rule.
    pub reward: RewardPolicy,
    /// Proximity tuning.
    pub detection: DetectionTuning,
    /// Projectile tuning.
    pub projectiles: ProjectileTuning,
    /// Automatic spawners, usually the enemy waves.
    pub enemy_spawners: Vec<SpawnerConfig>,
}

impl Default for BattleConfig {
    fn default() -> Self {
        let lanes = [2, 0, -2]
            .into_iter()
            .map(|y| LaneConfig {
                y: Fixed::from_num(y),
                player_spawn_x: Fixed::from_num(-8),
                enemy_spawn_x: Fixed::from_num(8),
            })
            .collect();

        Self {
            seed: 0,
            viewport: Viewport::new(Fixed::from_num(-9), Fixed::from_num(9), 1920),
            edge_margin: ratio(1, 2),
            player_base_health: 200,
            enemy_base_health: 200,
            lanes,
            starting_funds: 100,
            player_unit_cap: 12,
            reward: RewardPolicy::default(),
            detection: DetectionTuning::default(),
            projectiles: ProjectileTuning::default(),
            enemy_spawners: vec![SpawnerConfig {
                unit: "raider".to_string(),
                faction: Faction::Enemy,
                interval: SpawnInterval::Jittered {
                    min: Fixed::from_num(2),
                    max: Fixed::from_num(4),
                },
                lanes: LanePolicy::Random(vec![0, 1, 2]),
                cap: 8,
                initial_delay: Fixed::from_num(2),
            }],
        }
    }
}

impl BattleConfig {
    /// Parse a RON document and validate it.
    pub fn from_ron_str(source_name: &str, ron_text: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron_text).map_err(|e| GameError::DataParseError {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Lane by index.
    #[must_use]
    pub fn lane(&self, index: usize) -> Option<&LaneConfig> {
        self.lanes.get(index)
    }

    /// Base health for a faction.
    #[must_use]
    pub const fn base_health(&self, faction: Faction) -> u32 {
        match faction {
            Faction::Player => self.player_base_health,
            Faction::Enemy => self.enemy_base_health,
        }
    }

    /// Check the configuration can drive a battle.
    pub fn validate(&self) -> Result<()> {
        let fail = |what: String| Err(GameError::InvalidConfig(what));

        let within_world = |value: Fixed| value.abs() <= WORLD_LIMIT;

        if !within_world(self.viewport.left) || !within_world(self.viewport.right) {
            return fail(format!("viewport edges must lie within +/-{WORLD_LIMIT}"));
        }
        if self.viewport.right <= self.viewport.left {
            return fail("viewport right edge must be right of left edge".to_string());
        }
        if self.viewport.width_px == 0 || self.viewport.width_px > MAX_VIEWPORT_PX {
            return fail(format!("viewport width_px must be in 1..={MAX_VIEWPORT_PX}"));
        }
        if self.edge_margin < Fixed::ZERO || self.edge_margin > WORLD_LIMIT {
            return fail(format!("edge_margin must be in 0..={WORLD_LIMIT}"));
        }
        if self.player_base_health == 0 || self.enemy_base_health == 0 {
            return fail("base health must be positive".to_string());
        }
        if self.lanes.is_empty() {
            return fail("at least one lane is required".to_string());
        }
        for (index, lane) in self.lanes.iter().enumerate() {
            if !within_world(lane.y) {
                return fail(format!("lane {index}: y {} is outside +/-{WORLD_LIMIT}", lane.y));
            }
            for faction in Faction::ALL {
                let x = lane.spawn_x(faction);
                if x < self.viewport.left || x > self.viewport.right {
                    return fail(format!(
                        "lane {index}: {faction} spawn x {x} is outside the viewport"
                    ));
                }
            }
        }

        let detection = &self.detection;
        if detection.probe_radius <= Fixed::ZERO || detection.structure_half_width < Fixed::ZERO {
            return fail("detection radii must be positive".to_string());
        }
        let extents = [
            detection.probe_distance,
            detection.probe_radius,
            detection.structure_half_width,
        ];
        if !extents.into_iter().all(within_world) {
            return fail(format!("detection extents must lie within +/-{WORLD_LIMIT}"));
        }
        for alignment in [detection.block_alignment, detection.ranged_cone_alignment] {
            if alignment < Fixed::NEG_ONE || alignment > Fixed::ONE {
                return fail(format!("alignment threshold {alignment} outside [-1, 1]"));
            }
        }

        let projectiles = &self.projectiles;
        if projectiles.arrival_threshold <= Fixed::ZERO || projectiles.lifetime <= Fixed::ZERO {
            return fail("projectile arrival threshold and lifetime must be positive".to_string());
        }

        for spawner in &self.enemy_spawners {
            spawner.validate()?;
            let lanes: &[usize] = match spawner.lanes {
                LanePolicy::Fixed(ref lane) => std::slice::from_ref(lane),
                LanePolicy::Random(ref lanes) => lanes,
            };
            if let Some(lane) = lanes.iter().find(|&&lane| lane >= self.lanes.len()) {
                return Err(GameError::UnknownLane(*lane));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = BattleConfig::default();
        config.validate().unwrap();
        assert_eq!(config.lanes.len(), 3);
        assert_eq!(config.base_health(Faction::Enemy), 200);
        assert_eq!(config.lane(1).unwrap().spawn_x(Faction::Player), Fixed::from_num(-8));
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = BattleConfig::from_ron_str(
            "partial",
            r#"(
                seed: 9,
                player_base_health: 50,
                detection: (probe_radius: "0.4"),
            )"#,
        )
        .unwrap();

        assert_eq!(config.seed, 9);
        assert_eq!(config.player_base_health, 50);
        assert_eq!(config.enemy_base_health, 200);
        assert_eq!(config.detection.probe_radius, ratio(2, 5));
        assert_eq!(config.detection.probe_distance, ratio(1, 2));
    }

    #[test]
    fn test_spawner_lane_out_of_range_is_rejected() {
        let mut config = BattleConfig::default();
        if let Some(spawner) = config.enemy_spawners.first_mut() {
            spawner.lanes = LanePolicy::Fixed(7);
        }
        assert!(matches!(config.validate(), Err(GameError::UnknownLane(7))));
    }

    #[test]
    fn test_inverted_viewport_is_rejected() {
        let mut config = BattleConfig::default();
        config.viewport = Viewport::new(Fixed::from_num(5), Fixed::from_num(-5), 100);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_geometry_is_rejected() {
        let mut config = BattleConfig::default();
        config.viewport.width_px = u32::MAX;
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));

        let mut config = BattleConfig::default();
        config.viewport = Viewport::new(Fixed::from_num(-20_000), Fixed::from_num(20_000), 1920);
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));

        let mut config = BattleConfig::default();
        config.lanes[0].y = Fixed::from_num(1_000_000);
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));

        let mut config = BattleConfig::default();
        config.detection.probe_distance = Fixed::MAX;
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));

        let mut config = BattleConfig::default();
        config.edge_margin = Fixed::MAX;
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn test_widest_accepted_screen_is_valid() {
        let mut config = BattleConfig::default();
        config.viewport.width_px = MAX_VIEWPORT_PX;
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_lanes_rejected() {
        let config = BattleConfig {
            lanes: Vec::new(),
            ..BattleConfig::default()
        };
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));
    }
}
