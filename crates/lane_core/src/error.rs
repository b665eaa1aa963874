//! Error types for the lane simulation.

use thiserror::Error;

use crate::components::EntityId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// No template registered under this unit id.
    #[error("Unknown unit type: {0}")]
    UnknownUnitType(String),

    /// Lane index outside the configured layout.
    #[error("Unknown lane: {0}")]
    UnknownLane(usize),

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Data file parsing error.
    #[error("Failed to parse data '{source_name}': {message}")]
    DataParseError {
        /// Name of the document that failed to parse.
        source_name: String,
        /// Error message.
        message: String,
    },

    /// Snapshot could not be encoded or decoded.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Simulation state broke one of its invariants.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

/// Why a player spawn request was turned down.
///
/// A rejected request changes nothing: no agent, no debit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    /// The economy cannot cover the unit's cost.
    #[error("Insufficient funds: need {cost}, have {funds}")]
    InsufficientFunds {
        /// Unit cost.
        cost: u32,
        /// Balance at the time of the request.
        funds: i64,
    },

    /// Too many player agents alive.
    #[error("Population cap of {cap} reached")]
    PopulationCap {
        /// Configured cap.
        cap: usize,
    },

    /// The lane has no spawn point.
    #[error("No spawn point for lane {0}")]
    NoSpawnPoint(usize),

    /// No template registered under this unit id.
    #[error("Unknown unit type: {0}")]
    UnknownUnit(String),

    /// The match is already decided.
    #[error("Match is already over")]
    MatchOver,
}
