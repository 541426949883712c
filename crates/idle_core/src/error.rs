//! Error types for the economy core.

use thiserror::Error;

use crate::persistence::ValidationError;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all economy core errors.
///
/// Expected purchase refusals (unaffordable, locked, max level) are *not*
/// represented here; they are ordinary [`PurchaseError`](crate::transaction::PurchaseError)
/// values returned by the transaction engine.
#[derive(Debug, Error)]
pub enum GameError {
    /// A catalog section declared the same id twice.
    #[error("Duplicate {kind} id in catalog: {id}")]
    DuplicateId {
        /// Which catalog section (resource, building, upgrade, achievement).
        kind: &'static str,
        /// The offending id.
        id: String,
    },

    /// A catalog entry references an id that is not defined.
    #[error("Catalog entry `{owner}` references unknown {kind} `{id}`")]
    UnknownReference {
        /// The entry holding the dangling reference.
        owner: String,
        /// The kind of id that was referenced.
        kind: &'static str,
        /// The referenced id.
        id: String,
    },

    /// A cost curve would not be strictly increasing.
    #[error("Catalog entry `{id}` must have cost multiplier > 1 (got {value})")]
    InvalidMultiplier {
        /// The offending entry.
        id: String,
        /// The rejected multiplier.
        value: f64,
    },

    /// A catalog entry carries an out-of-range numeric parameter.
    #[error("Catalog entry `{id}` is invalid: {message}")]
    InvalidDefinition {
        /// The offending entry.
        id: String,
        /// What is wrong with it.
        message: String,
    },

    /// The building upgrade path loops back on itself.
    #[error("Building upgrade path starting at `{0}` forms a cycle")]
    UpgradePathCycle(String),

    /// Catalog source text failed to parse.
    #[error("Failed to parse catalog: {0}")]
    CatalogParse(String),

    /// Data file reading error (headless host).
    #[error("Failed to read data file '{path}': {message}")]
    DataFile {
        /// Path to the file that failed to read.
        path: String,
        /// Error message.
        message: String,
    },

    /// A save blob failed validation; the in-memory ledger was left untouched.
    #[error("Invalid save data: {0}")]
    Validation(#[from] ValidationError),

    /// Save blob serialization failed.
    #[error("Failed to encode save blob: {0}")]
    Encode(String),

    /// The persistence medium is inaccessible.
    ///
    /// The simulation continues in memory only; callers are notified once,
    /// not per attempt.
    #[error("Save storage unavailable: {0}")]
    StorageUnavailable(String),
}
