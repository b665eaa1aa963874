//! Scenario files on disk through to match reports.

use lane_core::error::GameError;
use lane_core::factions::Faction;
use lane_core::math::Fixed;
use lane_headless::{run_match, MatchEnd, MatchOverrides, Scenario, ScenarioError, SpawnOrder};
use lane_test_utils::fixtures::{quiet_config, test_roster};

fn tank_push() -> Scenario {
    let mut battle = quiet_config();
    battle.enemy_base_health = 10;
    Scenario {
        name: "Tank push".to_string(),
        description: "One tank against an undefended base".to_string(),
        battle,
        units: Some(test_roster().iter().cloned().collect()),
        orders: vec![SpawnOrder::new(Fixed::ZERO, "tank", 1)],
        max_seconds: 60,
    }
}

fn write_scenario(dir: &tempfile::TempDir, scenario: &Scenario) -> std::path::PathBuf {
    let path = dir.path().join("scenario.ron");
    let text = ron::ser::to_string_pretty(scenario, ron::ser::PrettyConfig::default()).unwrap();
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn scenario_with_custom_roster_runs_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_scenario(&dir, &tank_push());

    let scenario = Scenario::load(&path).unwrap();
    assert_eq!(scenario.name, "Tank push");
    assert_eq!(scenario.roster().unwrap().len(), 5);

    let report = run_match(&scenario, MatchOverrides::default()).unwrap();
    assert_eq!(report.winner, Some(Faction::Player));
    assert_eq!(report.end, MatchEnd::BaseDestroyed);
    assert_eq!(report.funds, 50);
    assert_eq!(report.stats.player.units_spawned["tank"], 1);
    assert!(report.rejected_orders.is_empty());
}

#[test]
fn order_for_unknown_unit_is_rejected_on_load() {
    let mut scenario = tank_push();
    scenario.orders.push(SpawnOrder::new(Fixed::from_num(3), "knight", 0));

    let dir = tempfile::tempdir().unwrap();
    let path = write_scenario(&dir, &scenario);

    assert!(matches!(
        Scenario::load(&path),
        Err(ScenarioError::Game(GameError::UnknownUnitType(unit))) if unit == "knight"
    ));
}

#[test]
fn malformed_file_reports_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.ron");
    std::fs::write(&path, "Scenario(name: ").unwrap();

    assert!(matches!(
        Scenario::load(&path),
        Err(ScenarioError::ParseError(_))
    ));
}

#[test]
fn order_for_missing_lane_is_recorded_not_fatal() {
    let mut scenario = tank_push();
    scenario.orders.push(SpawnOrder::new(Fixed::ZERO, "footman", 7));

    let report = run_match(&scenario, MatchOverrides::default()).unwrap();
    assert_eq!(report.rejected_orders.len(), 1);
    assert_eq!(report.rejected_orders[0].lane, 7);
    assert_eq!(report.winner, Some(Faction::Player));
}

#[test]
fn shipped_scenarios_load() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenarios");

    let skirmish = Scenario::load(dir.join("skirmish.ron")).unwrap();
    assert_eq!(skirmish.orders, Scenario::skirmish().orders);
    assert_eq!(skirmish.battle, Scenario::skirmish().battle);

    let archers = Scenario::load(dir.join("archer_line.ron")).unwrap();
    let roster = archers.roster().unwrap();
    assert_eq!(roster.len(), 2);
    assert_eq!(roster.get("raider").unwrap().health, 30);
    assert_eq!(archers.max_ticks(), 2400);
}
