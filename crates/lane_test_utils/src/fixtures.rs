//! Test fixtures and helpers.
//!
//! Pre-built battle layouts, unit templates and simulations for consistent
//! testing. Lanes are laid out so that agents start exactly where a test
//! wants them; nothing spawns on its own unless a fixture says so.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

use lane_core::data::{BattleConfig, CombatData, LaneConfig, UnitData, UnitRoster};
use lane_core::economy::Wallet;
use lane_core::factions::Faction;
use lane_core::math::ratio;
use lane_core::simulation::Simulation;
use lane_core::spawner::{LanePolicy, SpawnInterval, SpawnerConfig};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// A lane at height `y` with explicit spawn points.
#[must_use]
pub fn lane(y: i32, player_spawn_x: I32F32, enemy_spawn_x: I32F32) -> LaneConfig {
    LaneConfig {
        y: fixed(y),
        player_spawn_x,
        enemy_spawn_x,
    }
}

/// Default battle without any automatic spawners.
#[must_use]
pub fn quiet_config() -> BattleConfig {
    BattleConfig {
        enemy_spawners: Vec::new(),
        ..BattleConfig::default()
    }
}

/// Quiet battle using the given lane layout.
#[must_use]
pub fn config_with_lanes(lanes: Vec<LaneConfig>) -> BattleConfig {
    BattleConfig {
        lanes,
        ..quiet_config()
    }
}

/// Spawner that places a unit in one lane at a fixed cadence.
#[must_use]
pub fn steady_spawner(unit: &str, lane: usize, every: I32F32, cap: usize) -> SpawnerConfig {
    SpawnerConfig {
        unit: unit.to_string(),
        faction: Faction::Enemy,
        interval: SpawnInterval::Every(every),
        lanes: LanePolicy::Fixed(lane),
        cap,
        initial_delay: I32F32::ZERO,
    }
}

/// Immobile melee unit with a lot of health. Never reaches anything.
#[must_use]
pub fn dummy() -> UnitData {
    UnitData {
        id: "dummy".to_string(),
        name: "Training Dummy".to_string(),
        cost: 0,
        health: 1000,
        speed: I32F32::ZERO,
        damage: 1,
        attack_interval: I32F32::ONE,
        combat: CombatData::Melee,
    }
}

/// Slow melee unit with a lot of health that keeps walking.
#[must_use]
pub fn tank() -> UnitData {
    UnitData {
        id: "tank".to_string(),
        name: "Tank".to_string(),
        cost: 50,
        health: 1000,
        speed: ratio(3, 2),
        damage: 1,
        attack_interval: I32F32::from_num(2),
        combat: CombatData::Melee,
    }
}

/// Parse one unit definition written in RON.
///
/// # Panics
///
/// Panics if the text is not a valid [`UnitData`].
#[must_use]
pub fn unit_from_ron(text: &str) -> UnitData {
    ron::from_str(text).unwrap_or_else(|e| panic!("bad unit fixture: {e}"))
}

/// Builtin roster plus [`dummy`] and [`tank`].
#[must_use]
pub fn test_roster() -> UnitRoster {
    let mut roster = UnitRoster::builtin();
    roster.insert(dummy());
    roster.insert(tank());
    roster
}

/// Create a simulation over [`test_roster`].
///
/// # Panics
///
/// Panics if the configuration is invalid.
#[must_use]
pub fn battle(config: BattleConfig) -> Simulation {
    Simulation::new(config, test_roster()).unwrap_or_else(|e| panic!("bad battle fixture: {e}"))
}

/// Same as [`battle`] with a wallet holding `funds`.
#[must_use]
pub fn battle_with_funds(config: BattleConfig, funds: i64) -> Simulation {
    battle(config).with_economy(Box::new(Wallet::new(funds)))
}

/// A unit placed at the start of a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Unit id.
    pub unit: String,
    /// Owning faction.
    pub faction: Faction,
    /// Lane index.
    pub lane: usize,
}

impl Placement {
    /// Player unit in `lane`.
    #[must_use]
    pub fn player(unit: &str, lane: usize) -> Self {
        Self {
            unit: unit.to_string(),
            faction: Faction::Player,
            lane,
        }
    }

    /// Enemy unit in `lane`.
    #[must_use]
    pub fn enemy(unit: &str, lane: usize) -> Self {
        Self {
            unit: unit.to_string(),
            faction: Faction::Enemy,
            lane,
        }
    }
}

/// Spawn every placement in order.
///
/// # Panics
///
/// Panics if a placement names an unknown unit or lane.
pub fn place_all(sim: &mut Simulation, placements: &[Placement]) -> Vec<u64> {
    placements
        .iter()
        .map(|p| {
            sim.spawn_agent(&p.unit, p.faction, p.lane)
                .unwrap_or_else(|e| panic!("bad placement {p:?}: {e}"))
        })
        .collect()
}

/// Two melee units half a unit apart in a single lane at `y = 0`.
///
/// Returns the simulation and the ids of the player and enemy unit.
#[must_use]
pub fn duel(player_unit: &str, enemy_unit: &str) -> (Simulation, u64, u64) {
    let mut sim = battle(config_with_lanes(vec![lane(0, fixed(0), fixed_f(0.5))]));
    let ids = place_all(
        &mut sim,
        &[
            Placement::player(player_unit, 0),
            Placement::enemy(enemy_unit, 0),
        ],
    );
    (sim, ids[0], ids[1])
}

/// Default three-lane battle with enemy waves and a squad already fielded.
#[must_use]
pub fn crowded_battle(seed: u64) -> Simulation {
    let config = BattleConfig {
        seed,
        ..BattleConfig::default()
    };
    let mut sim = battle_with_funds(config, 1000);
    let mut placements = Vec::new();
    for lane in 0..3 {
        placements.push(Placement::player("footman", lane));
        placements.push(Placement::player("archer", lane));
        placements.push(Placement::enemy("raider", lane));
        placements.push(Placement::enemy("footman", lane));
    }
    place_all(&mut sim, &placements);
    sim
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duel_places_units_half_a_unit_apart() {
        let (sim, player, enemy) = duel("footman", "raider");
        let p = sim.agent(player).unwrap().position();
        let e = sim.agent(enemy).unwrap().position();
        assert_eq!(e.x - p.x, fixed_f(0.5));
        assert_eq!(p.y, e.y);
    }

    #[test]
    fn test_unit_from_ron() {
        let unit = unit_from_ron(
            r#"UnitData(
                id: "pikeman",
                name: "Pikeman",
                cost: 35,
                health: 30,
                speed: "1.25",
                damage: 6,
                attack_interval: "0.8",
                combat: Melee,
            )"#,
        );
        assert_eq!(unit.speed, fixed_f(1.25));
        unit.validate().unwrap();
    }

    #[test]
    fn test_crowded_battle_fields_both_sides() {
        let sim = crowded_battle(3);
        assert_eq!(sim.agent_count(Faction::Player), 6);
        assert_eq!(sim.agent_count(Faction::Enemy), 6);
        assert_eq!(sim.funds(), Some(1000));
    }
}
