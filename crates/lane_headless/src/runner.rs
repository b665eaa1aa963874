//! Single-match runner.
//!
//! Drives a [`Simulation`] at the fixed tick rate, issuing the scenario's
//! scripted player orders on their tick, until a base falls or the time
//! limit is reached.

use serde::{Deserialize, Serialize};

use lane_core::agent::AgentView;
use lane_core::economy::Wallet;
use lane_core::factions::Faction;
use lane_core::simulation::{Simulation, TICK_RATE};

use crate::metrics::{MatchRecorder, MatchStats};
use crate::scenario::{Scenario, ScenarioError, SpawnOrder};

/// Command-line overrides applied on top of a scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOverrides {
    /// Replace the battle seed.
    pub seed: Option<u64>,
    /// Replace the time limit.
    pub max_seconds: Option<u32>,
}

/// How a match finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEnd {
    /// A base was destroyed.
    BaseDestroyed,
    /// The time limit ran out first.
    TimeLimit,
}

/// A scripted order the simulation refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedOrder {
    /// Tick the order was issued on.
    pub tick: u64,
    /// Unit id.
    pub unit: String,
    /// Lane index.
    pub lane: usize,
    /// Why it was refused.
    pub reason: String,
}

/// Outcome and statistics of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Scenario name.
    pub scenario: String,
    /// Battle seed.
    pub seed: u64,
    /// Ticks simulated.
    pub ticks: u64,
    /// Simulated seconds.
    pub seconds: f64,
    /// Winning side, if a base fell.
    pub winner: Option<Faction>,
    /// How the match ended.
    pub end: MatchEnd,
    /// Player base health at the end.
    pub player_base_health: u32,
    /// Enemy base health at the end.
    pub enemy_base_health: u32,
    /// Final balance.
    pub funds: i64,
    /// Orders the simulation refused.
    pub rejected_orders: Vec<RejectedOrder>,
    /// Event tallies.
    pub stats: MatchStats,
    /// Agents still on the field.
    pub survivors: Vec<AgentView>,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

/// Run one match to completion.
pub fn run_match(
    scenario: &Scenario,
    overrides: MatchOverrides,
) -> Result<MatchReport, ScenarioError> {
    let mut battle = scenario.battle.clone();
    if let Some(seed) = overrides.seed {
        battle.seed = seed;
    }
    let seed = battle.seed;
    let max_ticks = overrides.max_seconds.map_or_else(
        || scenario.max_ticks(),
        |seconds| u64::from(seconds) * u64::from(TICK_RATE),
    );

    let recorder = MatchRecorder::new();
    let wallet = Wallet::new(battle.starting_funds);
    let mut sim = Simulation::new(battle, scenario.roster()?)?.with_economy(Box::new(wallet));
    sim.subscribe(Box::new(recorder.clone()));

    let mut orders: Vec<&SpawnOrder> = scenario.orders.iter().collect();
    orders.sort_by_key(|order| order.tick());
    let mut pending = orders.into_iter().peekable();
    let mut rejected_orders = Vec::new();

    tracing::info!(scenario = %scenario.name, seed, max_ticks, "Match started");

    while sim.outcome().is_none() && sim.current_tick() < max_ticks {
        let tick = sim.current_tick();
        while let Some(order) = pending.next_if(|order| order.tick() <= tick) {
            if let Err(error) = sim.request_spawn(&order.unit, order.lane) {
                rejected_orders.push(RejectedOrder {
                    tick,
                    unit: order.unit.clone(),
                    lane: order.lane,
                    reason: error.to_string(),
                });
            }
        }
        sim.step();
    }

    let outcome = sim.outcome();
    let report = MatchReport {
        scenario: scenario.name.clone(),
        seed,
        ticks: sim.current_tick(),
        seconds: sim.elapsed().to_num::<f64>(),
        winner: outcome.map(|o| o.winner),
        end: if outcome.is_some() {
            MatchEnd::BaseDestroyed
        } else {
            MatchEnd::TimeLimit
        },
        player_base_health: sim.structure(Faction::Player).health().current,
        enemy_base_health: sim.structure(Faction::Enemy).health().current,
        funds: sim.funds().unwrap_or_default(),
        rejected_orders,
        stats: recorder.stats(),
        survivors: sim.agent_views(),
        final_state_hash: sim.state_hash(),
    };

    tracing::info!(
        scenario = %report.scenario,
        seed,
        ticks = report.ticks,
        winner = ?report.winner,
        "Match finished"
    );
    Ok(report)
}
