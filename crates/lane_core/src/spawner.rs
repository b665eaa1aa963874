//! Periodic agent spawners.
//!
//! A [`Spawner`] decides *when* and *where* a new agent appears; the
//! simulation performs the actual creation and hands the new id back for
//! tracking. Before every decision the spawner prunes ids whose agents no
//! longer exist, so the population cap counts only live instances.
//!
//! Jitter and random lane choice draw from [`SpawnRng`], a small seeded
//! generator. No system randomness is involved.

use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::error::{GameError, Result};
use crate::factions::Faction;
use crate::math::{decimal_serde, fixed_serde, Fixed, TIME_EPSILON};

/// Time between spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnInterval {
    /// Always the same delay.
    Every(#[serde(with = "decimal_serde")] Fixed),
    /// Uniformly drawn in `min..=max` after every spawn.
    Jittered {
        /// Shortest delay.
        #[serde(with = "decimal_serde")]
        min: Fixed,
        /// Longest delay.
        #[serde(with = "decimal_serde")]
        max: Fixed,
    },
}

impl SpawnInterval {
    fn sample(&self, rng: &mut SpawnRng) -> Fixed {
        match *self {
            Self::Every(delay) => delay,
            Self::Jittered { min, max } => min + (max - min) * rng.next_unit(),
        }
    }

    fn shortest(&self) -> Fixed {
        match *self {
            Self::Every(delay) => delay,
            Self::Jittered { min, .. } => min,
        }
    }
}

/// Which lane a spawner places agents in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanePolicy {
    /// Always the same lane.
    Fixed(usize),
    /// A lane drawn from the list on every spawn.
    Random(Vec<usize>),
}

/// Data-driven spawner definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnerConfig {
    /// Unit id from the roster.
    pub unit: String,
    /// Side the spawned agents fight for.
    pub faction: Faction,
    /// Delay between spawns.
    pub interval: SpawnInterval,
    /// Lane selection.
    pub lanes: LanePolicy,
    /// Maximum simultaneously alive agents from this spawner.
    pub cap: usize,
    /// Seconds before the first spawn.
    #[serde(with = "decimal_serde", default = "zero")]
    pub initial_delay: Fixed,
}

const fn zero() -> Fixed {
    Fixed::ZERO
}

impl SpawnerConfig {
    /// Check the definition is usable.
    pub fn validate(&self) -> Result<()> {
        let fail = |what: &str| {
            Err(GameError::InvalidConfig(format!(
                "spawner for '{}': {}",
                self.unit, what
            )))
        };

        if self.cap == 0 {
            return fail("cap must be at least 1");
        }
        if self.interval.shortest() <= Fixed::ZERO {
            return fail("interval must be positive");
        }
        if let SpawnInterval::Jittered { min, max } = self.interval {
            if max < min {
                return fail("jittered interval has max < min");
            }
        }
        if let LanePolicy::Random(ref lanes) = self.lanes {
            if lanes.is_empty() {
                return fail("random lane policy needs at least one lane");
            }
        }
        if self.initial_delay < Fixed::ZERO {
            return fail("initial_delay must not be negative");
        }
        Ok(())
    }
}

/// What a spawner wants created this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Unit id from the roster.
    pub unit: String,
    /// Owning faction.
    pub faction: Faction,
    /// Lane index.
    pub lane: usize,
}

/// Runtime spawner state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spawner {
    config: SpawnerConfig,
    tracked: Vec<EntityId>,
    #[serde(with = "fixed_serde")]
    countdown: Fixed,
    rng: SpawnRng,
}

impl Spawner {
    /// Create a spawner from its definition and a seed.
    #[must_use]
    pub fn new(config: SpawnerConfig, seed: u64) -> Self {
        Self {
            countdown: config.initial_delay,
            config,
            tracked: Vec::new(),
            rng: SpawnRng::new(seed),
        }
    }

    /// The spawner definition.
    #[must_use]
    pub const fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    /// Ids of agents this spawner still tracks.
    #[must_use]
    pub fn tracked(&self) -> &[EntityId] {
        &self.tracked
    }

    /// Seconds until the next spawn attempt.
    #[must_use]
    pub const fn countdown(&self) -> Fixed {
        self.countdown
    }

    /// Drop tracked ids for which `is_alive` returns false.
    pub fn prune(&mut self, mut is_alive: impl FnMut(EntityId) -> bool) {
        self.tracked.retain(|&id| is_alive(id));
    }

    /// Whether another agent may be spawned under the cap.
    #[must_use]
    pub fn has_capacity(&self) -> bool {
        self.tracked.len() < self.config.cap
    }

    /// Advance the timer and decide whether to spawn.
    ///
    /// Call [`prune`](Self::prune) first. When the timer elapses while the
    /// cap is full, the attempt is skipped and the timer restarts.
    pub fn tick(&mut self, dt: Fixed) -> Option<SpawnRequest> {
        let due = self.countdown <= TIME_EPSILON;
        if due {
            self.countdown += self.config.interval.sample(&mut self.rng);
            if self.countdown < Fixed::ZERO {
                self.countdown = Fixed::ZERO;
            }
        }
        self.countdown -= dt;

        if !due {
            return None;
        }
        if !self.has_capacity() {
            tracing::debug!(
                unit = %self.config.unit,
                cap = self.config.cap,
                "Spawner at capacity, skipping"
            );
            return None;
        }

        Some(SpawnRequest {
            unit: self.config.unit.clone(),
            faction: self.config.faction,
            lane: self.pick_lane(),
        })
    }

    /// Start tracking a freshly created agent.
    pub fn track(&mut self, id: EntityId) {
        self.tracked.push(id);
    }

    fn pick_lane(&mut self) -> usize {
        match self.config.lanes {
            LanePolicy::Fixed(lane) => lane,
            LanePolicy::Random(ref lanes) => {
                let index = self.rng.next_index(lanes.len());
                lanes.get(index).copied().unwrap_or_default()
            }
        }
    }
}

/// Simple deterministic RNG for spawn decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRng {
    state: u64,
}

impl SpawnRng {
    /// Create a generator from a seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Next raw value (splitmix64).
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform value in `[0, 1)` with 32 fractional bits.
    pub fn next_unit(&mut self) -> Fixed {
        let bits = (self.next_u64() >> 32) as i64;
        Fixed::from_bits(bits)
    }

    /// Uniform index in `0..len`. Returns 0 for an empty range.
    pub fn next_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_u64() % len as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ratio;

    fn config(cap: usize) -> SpawnerConfig {
        SpawnerConfig {
            unit: "raider".to_string(),
            faction: Faction::Enemy,
            interval: SpawnInterval::Every(Fixed::from_num(2)),
            lanes: LanePolicy::Fixed(1),
            cap,
            initial_delay: Fixed::ZERO,
        }
    }

    #[test]
    fn test_first_spawn_after_initial_delay() {
        let mut cfg = config(5);
        cfg.initial_delay = Fixed::ONE;
        let mut spawner = Spawner::new(cfg, 7);

        assert!(spawner.tick(ratio(1, 2)).is_none());
        assert!(spawner.tick(ratio(1, 2)).is_none());
        let request = spawner.tick(ratio(1, 2)).unwrap();
        assert_eq!(request.lane, 1);
        assert_eq!(request.faction, Faction::Enemy);
    }

    #[test]
    fn test_fixed_interval_cadence() {
        let mut spawner = Spawner::new(config(5), 7);
        let dt = ratio(1, 2);

        let mut spawned_at = Vec::new();
        for step in 0..12 {
            if let Some(request) = spawner.tick(dt) {
                spawner.track(step);
                spawned_at.push((step, request.lane));
            }
        }
        // Ticks 0, 4, 8 at half-second steps
        assert_eq!(spawned_at, vec![(0, 1), (4, 1), (8, 1)]);
    }

    #[test]
    fn test_cap_blocks_until_pruned() {
        let mut spawner = Spawner::new(config(2), 1);
        let dt = Fixed::from_num(2);

        spawner.track(10);
        spawner.track(11);
        assert!(!spawner.has_capacity());
        assert!(spawner.tick(dt).is_none());

        spawner.prune(|id| id != 10);
        assert_eq!(spawner.tracked(), &[11]);
        assert!(spawner.tick(dt).is_some());
    }

    #[test]
    fn test_random_lane_policy_stays_in_list() {
        let mut cfg = config(100);
        cfg.lanes = LanePolicy::Random(vec![0, 2]);
        cfg.interval = SpawnInterval::Jittered {
            min: Fixed::ONE,
            max: Fixed::from_num(3),
        };
        let mut spawner = Spawner::new(cfg, 42);

        let mut lanes = Vec::new();
        for _ in 0..400 {
            if let Some(request) = spawner.tick(ratio(1, 4)) {
                lanes.push(request.lane);
            }
        }
        assert!(lanes.len() > 20);
        assert!(lanes.iter().all(|lane| *lane == 0 || *lane == 2));
        assert!(lanes.contains(&0) && lanes.contains(&2));
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let interval = SpawnInterval::Jittered {
            min: Fixed::ONE,
            max: Fixed::from_num(3),
        };
        let mut rng = SpawnRng::new(99);
        for _ in 0..200 {
            let delay = interval.sample(&mut rng);
            assert!(delay >= Fixed::ONE && delay <= Fixed::from_num(3));
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SpawnRng::new(5);
        let mut b = SpawnRng::new(5);
        for _ in 0..32 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        assert!(config(0).validate().is_err());

        let mut cfg = config(3);
        cfg.interval = SpawnInterval::Jittered {
            min: Fixed::from_num(3),
            max: Fixed::ONE,
        };
        assert!(cfg.validate().is_err());

        let mut cfg = config(3);
        cfg.lanes = LanePolicy::Random(Vec::new());
        assert!(cfg.validate().is_err());

        assert!(config(3).validate().is_ok());
    }
}
