//! Batch match runner for balance testing.
//!
//! Runs one scenario over a range of seeds in parallel using rayon and
//! aggregates the reports.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::BatchSummary;
use crate::runner::{run_match, MatchOverrides, MatchReport};
use crate::scenario::Scenario;

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of matches to run
    pub match_count: u32,
    /// Seed of the first match; later matches count up from it
    pub seed_start: u64,
    /// Worker threads (0 = use rayon default)
    pub parallel: usize,
    /// Time limit override
    pub max_seconds: Option<u32>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            match_count: 100,
            seed_start: 0,
            parallel: 0,
            max_seconds: None,
        }
    }
}

impl BatchConfig {
    /// Create config for a number of matches
    #[must_use]
    pub fn new(match_count: u32) -> Self {
        Self {
            match_count,
            ..Default::default()
        }
    }

    /// Set seed start
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set worker thread count
    #[must_use]
    pub const fn with_parallel(mut self, threads: usize) -> Self {
        self.parallel = threads;
        self
    }

    /// Set time limit
    #[must_use]
    pub const fn with_max_seconds(mut self, seconds: u32) -> Self {
        self.max_seconds = Some(seconds);
        self
    }

    fn seed_for(&self, index: u32) -> u64 {
        self.seed_start.wrapping_add(u64::from(index))
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Scenario name
    pub scenario: String,
    /// Configuration used
    pub config: BatchConfig,
    /// Individual match reports, in seed order
    pub matches: Vec<MatchReport>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total wall-clock runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index
    pub match_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

fn run_all(scenario: &Scenario, config: &BatchConfig) -> Vec<Result<MatchReport, BatchError>> {
    let completed = AtomicU32::new(0);
    (0..config.match_count)
        .into_par_iter()
        .map(|index| {
            let seed = config.seed_for(index);
            let overrides = MatchOverrides {
                seed: Some(seed),
                max_seconds: config.max_seconds,
            };
            let result = run_match(scenario, overrides).map_err(|e| {
                warn!("Match {} failed: {}", index, e);
                BatchError {
                    match_index: index,
                    seed,
                    message: e.to_string(),
                }
            });

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 10 == 0 {
                debug!("Progress: {}/{}", done, config.match_count);
            }
            result
        })
        .collect()
}

/// Run a batch of matches
pub fn run_batch(scenario: &Scenario, config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        "Starting batch run: {} matches of '{}'",
        config.match_count, scenario.name
    );

    let pool = (config.parallel > 0)
        .then(|| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.parallel)
                .build()
                .map_err(|e| warn!("Falling back to the global thread pool: {}", e))
                .ok()
        })
        .flatten();
    let results = match &pool {
        Some(pool) => pool.install(|| run_all(scenario, &config)),
        None => run_all(scenario, &config),
    };

    let mut matches = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(report) => matches.push(report),
            Err(error) => errors.push(error),
        }
    }

    let summary = BatchSummary::from_reports(&matches);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} matches in {:.1}s",
        matches.len(),
        duration_seconds
    );

    BatchResults {
        scenario: scenario.name.clone(),
        config,
        matches,
        summary,
        duration_seconds,
        errors,
    }
}

/// Verify determinism by running the same seed several times.
///
/// Returns `false` if any run disagrees with the first or fails.
pub fn verify_determinism(scenario: &Scenario, seed: u64, runs: u32) -> bool {
    let overrides = MatchOverrides {
        seed: Some(seed),
        max_seconds: None,
    };
    let mut first: Option<MatchReport> = None;
    for run in 0..runs {
        let report = match run_match(scenario, overrides) {
            Ok(report) => report,
            Err(e) => {
                warn!("Determinism run {} failed: {}", run, e);
                return false;
            }
        };
        match &first {
            None => first = Some(report),
            Some(expected) if *expected != report => {
                warn!(
                    "Run {} diverged: hash {:#x} vs {:#x}",
                    run, report.final_state_hash, expected.final_state_hash
                );
                return false;
            }
            Some(_) => {}
        }
    }
    true
}
