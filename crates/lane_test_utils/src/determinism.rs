//! Replay checks for battle determinism.
//!
//! A battle is replayed from the same setup and its [`Simulation::state_hash`]
//! is recorded after every tick. Two replays must produce the same trace;
//! when they don't, the first diverging tick is reported so the failing
//! system can be bisected from there. Headless batches and snapshot restore
//! both depend on this.

use std::thread;

use lane_core::simulation::Simulation;

/// State hash after every tick of one replay. Index 0 is the hash before
/// the first step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashTrace(Vec<u64>);

impl HashTrace {
    /// Step `sim` for `ticks` ticks, hashing as it goes.
    #[must_use]
    pub fn record(mut sim: Simulation, ticks: u64) -> Self {
        let mut hashes = Vec::with_capacity(usize::try_from(ticks).unwrap_or(0) + 1);
        hashes.push(sim.state_hash());
        for _ in 0..ticks {
            sim.step();
            hashes.push(sim.state_hash());
        }
        Self(hashes)
    }

    /// Hash after the last recorded tick.
    #[must_use]
    pub fn final_hash(&self) -> Option<u64> {
        self.0.last().copied()
    }

    /// First tick at which `other` disagrees with this trace.
    #[must_use]
    pub fn first_divergence(&self, other: &Self) -> Option<u64> {
        let mismatch = self
            .0
            .iter()
            .zip(&other.0)
            .position(|(a, b)| a != b)
            .or_else(|| {
                let shorter = self.0.len().min(other.0.len());
                (self.0.len() != other.0.len()).then_some(shorter)
            });
        mismatch.map(|tick| u64::try_from(tick).unwrap_or(u64::MAX))
    }
}

/// Outcome of comparing several replays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayCheck {
    /// Every replay matched the first.
    Identical {
        /// Replays compared.
        runs: usize,
        /// Final state hash shared by all replays.
        final_hash: Option<u64>,
    },
    /// A replay drifted from the first.
    Diverged {
        /// Index of the drifting replay.
        run: usize,
        /// First tick whose hash differed.
        tick: u64,
    },
}

impl ReplayCheck {
    fn compare(traces: &[HashTrace]) -> Self {
        let Some(reference) = traces.first() else {
            return Self::Identical {
                runs: 0,
                final_hash: None,
            };
        };
        for (run, trace) in traces.iter().enumerate().skip(1) {
            if let Some(tick) = reference.first_divergence(trace) {
                tracing::debug!(run, tick, "Replay diverged");
                return Self::Diverged { run, tick };
            }
        }
        Self::Identical {
            runs: traces.len(),
            final_hash: reference.final_hash(),
        }
    }

    /// Whether every replay matched.
    #[must_use]
    pub const fn is_identical(&self) -> bool {
        matches!(self, Self::Identical { .. })
    }

    /// Panic with the diverging run and tick unless every replay matched.
    ///
    /// # Panics
    ///
    /// Panics on [`ReplayCheck::Diverged`].
    #[track_caller]
    pub fn assert_identical(&self) {
        if let Self::Diverged { run, tick } = self {
            panic!("replay {run} diverged from replay 0 at tick {tick}");
        }
    }
}

/// Replay a battle `runs` times in sequence and compare per-tick hashes.
///
/// ```
/// use lane_test_utils::determinism::replay;
/// use lane_test_utils::fixtures::crowded_battle;
///
/// replay(|| crowded_battle(7), 3, 100).assert_identical();
/// ```
pub fn replay<F>(setup: F, runs: usize, ticks: u64) -> ReplayCheck
where
    F: Fn() -> Simulation,
{
    let traces: Vec<_> = (0..runs)
        .map(|_| HashTrace::record(setup(), ticks))
        .collect();
    ReplayCheck::compare(&traces)
}

/// Same as [`replay`] with every run on its own scoped thread.
///
/// A replay whose thread panics is reported as diverging at tick 0.
pub fn replay_on_threads<F>(setup: F, runs: usize, ticks: u64) -> ReplayCheck
where
    F: Fn() -> Simulation + Sync,
{
    let traces = thread::scope(|s| {
        let handles: Vec<_> = (0..runs)
            .map(|_| s.spawn(|| HashTrace::record(setup(), ticks)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().ok())
            .collect::<Vec<_>>()
    });

    if let Some(run) = traces.iter().position(Option::is_none) {
        return ReplayCheck::Diverged { run, tick: 0 };
    }
    ReplayCheck::compare(&traces.into_iter().flatten().collect::<Vec<_>>())
}

/// Play `warmup` ticks, snapshot, restore into a fresh battle from the same
/// setup, then compare both for `after` more ticks.
///
/// Run 0 is the original and run 1 the restored battle. A snapshot that
/// fails to encode or restore diverges at tick 0.
pub fn snapshot_resumes<F>(setup: F, warmup: u64, after: u64) -> ReplayCheck
where
    F: Fn() -> Simulation,
{
    let mut original = setup();
    for _ in 0..warmup {
        original.step();
    }

    let mut restored = setup();
    let resumed = original
        .snapshot()
        .ok()
        .is_some_and(|bytes| restored.restore(&bytes).is_ok());
    if !resumed {
        return ReplayCheck::Diverged { run: 1, tick: 0 };
    }

    ReplayCheck::compare(&[
        HashTrace::record(original, after),
        HashTrace::record(restored, after),
    ])
}

/// Proptest strategies for battle inputs.
pub mod strategies {
    use proptest::prelude::*;

    use lane_core::factions::Faction;

    use crate::fixtures::Placement;

    /// Damage amounts, including zero and negative ones.
    pub fn arb_damage_amount() -> impl Strategy<Value = i32> {
        -50i32..200i32
    }

    /// A builtin unit id.
    pub fn arb_unit() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("footman"), Just("raider"), Just("archer")]
    }

    /// Either faction.
    pub fn arb_faction() -> impl Strategy<Value = Faction> {
        prop_oneof![Just(Faction::Player), Just(Faction::Enemy)]
    }

    /// A placement in one of the three default lanes.
    pub fn arb_placement() -> impl Strategy<Value = Placement> {
        (arb_unit(), arb_faction(), 0usize..3).prop_map(|(unit, faction, lane)| Placement {
            unit: unit.to_string(),
            faction,
            lane,
        })
    }

    /// Opening lineup of up to `max_len` placements.
    pub fn arb_lineup(max_len: usize) -> impl Strategy<Value = Vec<Placement>> {
        proptest::collection::vec(arb_placement(), 0..max_len)
    }

    /// Battle seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}
