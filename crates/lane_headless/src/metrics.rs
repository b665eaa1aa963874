//! Match metrics collection.
//!
//! [`MatchRecorder`] is a passive simulation listener that tallies spawns,
//! deaths, damage and rewards per side. [`BatchSummary`] aggregates many
//! finished matches.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use lane_core::events::{SimEvent, SimListener, Subject};
use lane_core::factions::Faction;

use crate::runner::MatchReport;

/// Per-side tallies for one match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionStats {
    /// Agents spawned by unit id.
    pub units_spawned: BTreeMap<String, u32>,
    /// Agents lost by unit id.
    pub units_lost: BTreeMap<String, u32>,
    /// Agents that wandered out of the world.
    pub units_strayed: u32,
    /// Health removed from the opposing base.
    pub structure_damage_dealt: u64,
    /// Projectiles fired.
    pub projectiles_fired: u32,
    /// Projectiles that hit something.
    pub projectiles_hit: u32,
    /// Kill rewards credited.
    pub rewards_earned: u64,
}

impl FactionStats {
    /// Total agents spawned.
    #[must_use]
    pub fn total_spawned(&self) -> u32 {
        self.units_spawned.values().sum()
    }

    /// Total agents lost.
    #[must_use]
    pub fn total_lost(&self) -> u32 {
        self.units_lost.values().sum()
    }
}

/// Everything the recorder has seen so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    /// Player tallies.
    pub player: FactionStats,
    /// Enemy tallies.
    pub enemy: FactionStats,
    /// Total events observed.
    pub events_seen: u64,
}

impl MatchStats {
    /// Tallies for one side.
    #[must_use]
    pub const fn faction(&self, faction: Faction) -> &FactionStats {
        match faction {
            Faction::Player => &self.player,
            Faction::Enemy => &self.enemy,
        }
    }

    fn faction_mut(&mut self, faction: Faction) -> &mut FactionStats {
        match faction {
            Faction::Player => &mut self.player,
            Faction::Enemy => &mut self.enemy,
        }
    }

    /// Fold one event into the tallies.
    pub fn record(&mut self, event: &SimEvent, owners: &mut BTreeMap<u64, Faction>) {
        self.events_seen += 1;
        match event {
            SimEvent::AgentSpawned {
                id, unit, faction, ..
            } => {
                owners.insert(*id, *faction);
                *self
                    .faction_mut(*faction)
                    .units_spawned
                    .entry(unit.clone())
                    .or_default() += 1;
            }
            SimEvent::AgentDied { id, faction, unit } => {
                owners.remove(id);
                *self
                    .faction_mut(*faction)
                    .units_lost
                    .entry(unit.clone())
                    .or_default() += 1;
            }
            SimEvent::AgentLeftWorld { id, faction } => {
                owners.remove(id);
                self.faction_mut(*faction).units_strayed += 1;
            }
            SimEvent::HealthChanged {
                subject: Subject::Structure(owner),
                current,
                max,
            } => {
                // Structure damage is attributed to the owner's opponent.
                let attacker = self.faction_mut(owner.opponent());
                let lost = u64::from(max.saturating_sub(*current));
                attacker.structure_damage_dealt = attacker.structure_damage_dealt.max(lost);
            }
            SimEvent::ProjectileFired { source, .. } => {
                if let Some(faction) = owners.get(source).copied() {
                    self.faction_mut(faction).projectiles_fired += 1;
                }
            }
            SimEvent::ProjectileHit { victim, .. } => {
                let shooter = match victim {
                    Subject::Agent(id) => owners.get(id).map(|f| f.opponent()),
                    Subject::Structure(owner) => Some(owner.opponent()),
                };
                if let Some(faction) = shooter {
                    self.faction_mut(faction).projectiles_hit += 1;
                }
            }
            SimEvent::RewardGranted { amount, .. } => {
                self.player.rewards_earned += u64::from(*amount);
            }
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
struct RecorderState {
    stats: MatchStats,
    owners: BTreeMap<u64, Faction>,
}

/// Listener that collects [`MatchStats`] while a match runs.
///
/// Clones share the same tallies, so one clone can be boxed into the
/// simulation while another is kept to read the results.
#[derive(Debug, Clone, Default)]
pub struct MatchRecorder {
    state: Arc<Mutex<RecorderState>>,
}

impl MatchRecorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the tallies so far.
    #[must_use]
    pub fn stats(&self) -> MatchStats {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats
            .clone()
    }
}

impl SimListener for MatchRecorder {
    fn on_event(&mut self, event: &SimEvent) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let RecorderState { stats, owners } = &mut *state;
        stats.record(event, owners);
    }
}

/// Aggregate results over a batch of matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total matches played.
    pub total_games: u32,
    /// Matches won by each side.
    pub wins_by_faction: BTreeMap<String, u32>,
    /// Matches that hit the time limit.
    pub timeouts: u32,
    /// Average match length in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest match.
    pub min_duration_ticks: u64,
    /// Longest match.
    pub max_duration_ticks: u64,
    /// Average agents spawned per match by side.
    pub avg_units_spawned: BTreeMap<String, f64>,
    /// Average agents lost per match by side.
    pub avg_units_lost: BTreeMap<String, f64>,
    /// Player spawn orders the economy or caps rejected, per match.
    pub avg_rejected_orders: f64,
}

impl BatchSummary {
    /// Calculate summary from a list of match reports.
    #[must_use]
    pub fn from_reports(reports: &[MatchReport]) -> Self {
        if reports.is_empty() {
            return Self::default();
        }

        let count = reports.len() as f64;
        let mut summary = Self {
            total_games: u32::try_from(reports.len()).unwrap_or(u32::MAX),
            min_duration_ticks: u64::MAX,
            ..Default::default()
        };

        let mut duration_sum = 0u64;
        let mut rejected_sum = 0usize;
        for report in reports {
            duration_sum += report.ticks;
            summary.min_duration_ticks = summary.min_duration_ticks.min(report.ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(report.ticks);
            rejected_sum += report.rejected_orders.len();

            match report.winner {
                Some(winner) => {
                    *summary
                        .wins_by_faction
                        .entry(winner.display_name().to_string())
                        .or_default() += 1;
                }
                None => summary.timeouts += 1,
            }

            for faction in Faction::ALL {
                let stats = report.stats.faction(faction);
                let name = faction.display_name().to_string();
                *summary.avg_units_spawned.entry(name.clone()).or_default() +=
                    f64::from(stats.total_spawned());
                *summary.avg_units_lost.entry(name).or_default() += f64::from(stats.total_lost());
            }
        }

        summary.avg_duration_ticks = duration_sum as f64 / count;
        summary.avg_rejected_orders = rejected_sum as f64 / count;
        for value in summary
            .avg_units_spawned
            .values_mut()
            .chain(summary.avg_units_lost.values_mut())
        {
            *value /= count;
        }

        summary
    }

    /// Win rate for a side in `0.0..=1.0`.
    #[must_use]
    pub fn win_rate(&self, faction: Faction) -> f64 {
        if self.total_games == 0 {
            return 0.0;
        }
        let wins = self
            .wins_by_faction
            .get(faction.display_name())
            .copied()
            .unwrap_or(0);
        f64::from(wins) / f64::from(self.total_games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawned(id: u64, unit: &str, faction: Faction) -> SimEvent {
        SimEvent::AgentSpawned {
            id,
            unit: unit.to_string(),
            faction,
            lane: 0,
        }
    }

    #[test]
    fn test_recorder_tallies_per_side() {
        let recorder = MatchRecorder::new();
        let mut listener = recorder.clone();

        listener.on_event(&spawned(1, "archer", Faction::Player));
        listener.on_event(&spawned(2, "raider", Faction::Enemy));
        listener.on_event(&SimEvent::ProjectileFired {
            projectile: 3,
            source: 1,
            target_point: lane_core::math::Vec2Fixed::ZERO,
        });
        listener.on_event(&SimEvent::ProjectileHit {
            projectile: 3,
            victim: Subject::Agent(2),
            damage: 4,
        });
        listener.on_event(&SimEvent::AgentDied {
            id: 2,
            faction: Faction::Enemy,
            unit: "raider".to_string(),
        });
        listener.on_event(&SimEvent::RewardGranted {
            victim: 2,
            amount: 23,
        });

        let stats = recorder.stats();
        assert_eq!(stats.events_seen, 6);
        assert_eq!(stats.player.units_spawned["archer"], 1);
        assert_eq!(stats.player.projectiles_fired, 1);
        assert_eq!(stats.player.projectiles_hit, 1);
        assert_eq!(stats.player.rewards_earned, 23);
        assert_eq!(stats.enemy.total_lost(), 1);
    }

    #[test]
    fn test_structure_damage_attributed_to_attacker() {
        let mut recorder = MatchRecorder::new();
        for current in [190, 180, 175] {
            recorder.on_event(&SimEvent::HealthChanged {
                subject: Subject::Structure(Faction::Enemy),
                current,
                max: 200,
            });
        }
        let stats = recorder.stats();
        assert_eq!(stats.player.structure_damage_dealt, 25);
        assert_eq!(stats.enemy.structure_damage_dealt, 0);
    }

    #[test]
    fn test_empty_batch_summary() {
        let summary = BatchSummary::from_reports(&[]);
        assert_eq!(summary.total_games, 0);
        assert_eq!(summary.win_rate(Faction::Player), 0.0);
    }
}
