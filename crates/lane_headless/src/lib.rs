//! Headless runner for lane battles.
//!
//! Loads RON scenarios, plays them out on [`lane_core`] at the fixed tick
//! rate and reports the results as JSON. Used for balance testing and for
//! determinism checks in CI.
//!
//! - [`scenario`]: scenario files and scripted player orders
//! - [`runner`]: a single match to completion
//! - [`batch`]: many seeds in parallel with rayon
//! - [`metrics`]: event listener and aggregate statistics
//!
//! # Example
//!
//! ```
//! use lane_headless::{run_match, MatchOverrides, Scenario};
//!
//! let report = run_match(
//!     &Scenario::skirmish(),
//!     MatchOverrides { seed: Some(1), max_seconds: Some(5) },
//! )
//! .unwrap();
//! assert_eq!(report.ticks, 100);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod metrics;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, FactionStats, MatchRecorder, MatchStats};
pub use runner::{run_match, MatchEnd, MatchOverrides, MatchReport, RejectedOrder};
pub use scenario::{Scenario, ScenarioError, SpawnOrder};
