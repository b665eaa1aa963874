//! Property tests for battle invariants.
//!
//! Random lineups and seeds are run for a few hundred ticks; the state
//! checks must hold between every pair of ticks.

use lane_core::components::{AgentState, Target};
use lane_core::data::BattleConfig;
use lane_core::events::{SimEvent, Subject};
use lane_core::factions::Faction;
use lane_test_utils::determinism::strategies::{arb_damage_amount, arb_lineup, arb_seed};
use lane_test_utils::fixtures::{battle, battle_with_funds, place_all, quiet_config};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn battle_invariants_hold_every_tick(
        lineup in arb_lineup(12),
        seed in arb_seed(),
    ) {
        let mut sim = battle_with_funds(BattleConfig { seed, ..BattleConfig::default() }, 200);
        place_all(&mut sim, &lineup);

        for _ in 0..300 {
            let events = sim.step();
            prop_assert!(sim.check_invariants().is_ok(), "{:?}", sim.check_invariants());

            for agent in sim.agents().iter_sorted() {
                let health = agent.health();
                prop_assert!(health.current <= health.max);
                prop_assert!(health.current > 0);
                prop_assert_eq!(agent.position().y, agent.lane_y());
                prop_assert_ne!(agent.state(), AgentState::Dead);
                if let Some(Target::Unit(id)) = agent.target() {
                    prop_assert_ne!(id, agent.id());
                }
            }
            for faction in Faction::ALL {
                let health = sim.structure(faction).health();
                prop_assert!(health.current <= health.max);
            }
            for id in events.deaths() {
                prop_assert!(sim.agent(id).is_none());
            }
        }
    }

    #[test]
    fn non_positive_damage_changes_nothing(
        amount in -50i32..=0,
    ) {
        let mut sim = battle(quiet_config());
        let id = sim.spawn_agent("footman", Faction::Player, 0).unwrap();
        let before = sim.state_hash();

        prop_assert_eq!(sim.take_damage(Subject::Agent(id), amount).unwrap(), 0);
        prop_assert_eq!(
            sim.take_damage(Subject::Structure(Faction::Enemy), amount).unwrap(),
            0
        );
        prop_assert_eq!(sim.state_hash(), before);
        let events = sim.step();
        let health_changed = events
            .iter()
            .any(|e| matches!(e, SimEvent::HealthChanged { .. }));
        prop_assert!(!health_changed);
    }

    #[test]
    fn damage_never_overshoots_health(
        amounts in proptest::collection::vec(arb_damage_amount(), 1..20),
    ) {
        let mut sim = battle(quiet_config());
        let base = Subject::Structure(Faction::Player);
        let mut expected: i64 = 200;
        let mut destroyed = 0;

        for amount in amounts {
            let dealt = sim.take_damage(base, amount).unwrap();
            let want = i64::from(amount.max(0)).min(expected);
            prop_assert_eq!(i64::from(dealt), want);
            expected -= want;
            destroyed += sim
                .step()
                .iter()
                .filter(|e| matches!(e, SimEvent::StructureDestroyed { .. }))
                .count();
        }

        prop_assert_eq!(i64::from(sim.structure(Faction::Player).health().current), expected);
        prop_assert_eq!(destroyed, usize::from(expected == 0));
    }
}

#[test]
fn agents_never_change_lane() {
    let mut sim = battle_with_funds(quiet_config(), 1000);
    for lane in 0..3 {
        sim.request_spawn("footman", lane).unwrap();
        sim.request_spawn("archer", lane).unwrap();
        sim.spawn_agent("raider", Faction::Enemy, lane).unwrap();
    }
    let lanes: Vec<_> = sim
        .agents()
        .iter_sorted()
        .map(|a| (a.id(), a.lane(), a.lane_y()))
        .collect();

    for _ in 0..400 {
        sim.step();
        for (id, lane, y) in &lanes {
            if let Some(agent) = sim.agent(*id) {
                assert_eq!(agent.lane(), *lane);
                assert_eq!(agent.position().y, *y);
            }
        }
    }
}
