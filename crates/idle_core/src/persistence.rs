//! Save-blob serialization, validation and the storage seam.
//!
//! The persisted shape is a versioned JSON blob:
//!
//! ```json
//! { "version": "1.0.0", "timestamp": 1700000000000,
//!   "ledger": { "resources": {}, "buildings": {}, "upgrades": {},
//!               "statistics": {}, "achievements": {"unlocked": []} } }
//! ```
//!
//! Validation is forward- and backward-compatible: unknown keys are ignored
//! and missing keys are filled from catalog defaults. Only missing required
//! top-level fields, structurally wrong types, or a different major version
//! cause rejection - and rejection never touches the caller's in-memory
//! ledger.
//!
//! # Save format changelog
//!
//! - 1.0.0: initial format.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::error::{GameError, Result};
use crate::ledger::{Ledger, LedgerSnapshot};

/// Current save format version.
pub const SAVE_VERSION: &str = "1.0.0";

/// Why a save blob was rejected.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The text is not valid JSON.
    #[error("save blob is not valid JSON: {0}")]
    Malformed(String),

    /// The top level is not a JSON object.
    #[error("save blob is not a JSON object")]
    NotAnObject,

    /// A required top-level field is absent.
    #[error("save blob missing required field `{0}`")]
    MissingField(&'static str),

    /// A required field holds the wrong JSON type.
    #[error("save blob field `{field}` has the wrong type (expected {expected})")]
    WrongType {
        /// The offending field.
        field: &'static str,
        /// The expected JSON type.
        expected: &'static str,
    },

    /// The blob was written by an incompatible major version.
    #[error("unsupported save version `{0}`")]
    UnsupportedVersion(String),

    /// The ledger section could not be decoded.
    #[error("save blob ledger section is invalid: {0}")]
    InvalidLedger(String),
}

/// A versioned, timestamped snapshot of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveBlob {
    /// Save format version that wrote this blob.
    pub version: String,
    /// Wall-clock time of the save, epoch milliseconds.
    pub timestamp: u64,
    /// The persisted ledger state (possibly partial, when written by an
    /// older or newer same-major version).
    pub ledger: LedgerSnapshot,
}

/// Serialize the ledger into a save blob stamped with the current version.
#[must_use]
pub fn save(ledger: &Ledger, now_ms: u64) -> SaveBlob {
    SaveBlob {
        version: SAVE_VERSION.to_string(),
        timestamp: now_ms,
        ledger: ledger.snapshot(),
    }
}

/// Encode a save blob as JSON text for storage or export.
///
/// # Errors
///
/// Returns [`GameError::Encode`] if serialization fails.
pub fn encode(blob: &SaveBlob) -> Result<String> {
    serde_json::to_string(blob).map_err(|e| GameError::Encode(e.to_string()))
}

/// The major component of a `MAJOR.MINOR.PATCH` version string.
fn major_version(version: &str) -> Option<u32> {
    version.split('.').next()?.parse().ok()
}

/// Decode and validate save blob text.
///
/// # Errors
///
/// Returns a [`ValidationError`] for malformed JSON, missing or
/// wrongly-typed required fields, an incompatible major version, or an
/// undecodable ledger section. Unknown keys anywhere are ignored.
pub fn decode(text: &str) -> std::result::Result<SaveBlob, ValidationError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    let object = value.as_object().ok_or(ValidationError::NotAnObject)?;

    let version_value = object
        .get("version")
        .ok_or(ValidationError::MissingField("version"))?;
    let version = version_value
        .as_str()
        .ok_or(ValidationError::WrongType {
            field: "version",
            expected: "string",
        })?
        .to_string();

    let supported = major_version(SAVE_VERSION);
    if major_version(&version).is_none() || major_version(&version) != supported {
        return Err(ValidationError::UnsupportedVersion(version));
    }

    let timestamp = object
        .get("timestamp")
        .ok_or(ValidationError::MissingField("timestamp"))?
        .as_u64()
        .ok_or(ValidationError::WrongType {
            field: "timestamp",
            expected: "non-negative integer",
        })?;

    let ledger_value = object
        .get("ledger")
        .ok_or(ValidationError::MissingField("ledger"))?;
    if !ledger_value.is_object() {
        return Err(ValidationError::WrongType {
            field: "ledger",
            expected: "object",
        });
    }
    let ledger: LedgerSnapshot = serde_json::from_value(ledger_value.clone())
        .map_err(|e| ValidationError::InvalidLedger(e.to_string()))?;

    Ok(SaveBlob {
        version,
        timestamp,
        ledger,
    })
}

/// Build a fresh ledger from a validated blob, defaulting what is missing.
///
/// The returned ledger starts from catalog defaults and overlays every
/// *known* id present in the blob; unknown ids are dropped, upgrade levels
/// are capped at their catalog maximum, and all values pass through the
/// usual clamps. The caller's existing ledger is never touched - apply the
/// result atomically or not at all.
#[must_use]
pub fn apply(blob: &SaveBlob, catalog: &Catalog) -> Ledger {
    let mut ledger = Ledger::from_catalog(catalog);

    for def in catalog.resources() {
        if let Some(value) = blob.ledger.resources.get(&def.id) {
            ledger.set_resource(&def.id, *value);
        }
    }
    for def in catalog.buildings() {
        if let Some(count) = blob.ledger.buildings.get(&def.id) {
            ledger.set_building_count(&def.id, *count);
        }
    }
    for def in catalog.upgrades() {
        if let Some(level) = blob.ledger.upgrades.get(&def.id) {
            ledger.set_upgrade_level(&def.id, (*level).min(def.max_level));
        }
    }
    ledger.set_statistics(blob.ledger.statistics.clone());
    for id in &blob.ledger.achievements.unlocked {
        if catalog.achievement(id).is_some() {
            ledger.unlock_achievement(id.clone());
        }
    }

    ledger
}

/// Decode, validate and apply save text in one step.
///
/// # Errors
///
/// Returns the [`ValidationError`] from [`decode`]; on error no ledger is
/// produced and the caller keeps its current state.
pub fn load(text: &str, catalog: &Catalog) -> std::result::Result<Ledger, ValidationError> {
    let blob = decode(text)?;
    Ok(apply(&blob, catalog))
}

/// Key-value persistence medium for save blobs.
///
/// Implementations are synchronous and fast (local storage). The core never
/// assumes a store exists; it is injected explicitly and the simulation
/// degrades to in-memory-only operation when the store fails.
pub trait SaveStore {
    /// Persist the payload, replacing any previous save.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::StorageUnavailable`] if the medium is
    /// inaccessible.
    fn put(&mut self, payload: &str) -> Result<()>;

    /// Fetch the current save payload, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::StorageUnavailable`] if the medium is
    /// inaccessible.
    fn get(&self) -> Result<Option<String>>;

    /// Remove any persisted save.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::StorageUnavailable`] if the medium is
    /// inaccessible.
    fn clear(&mut self) -> Result<()>;
}

/// In-memory save store; the graceful fallback when no durable medium is
/// available.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Option<String>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemoryStore {
    fn put(&mut self, payload: &str) -> Result<()> {
        self.slot = Some(payload.to_string());
        Ok(())
    }

    fn get(&self) -> Result<Option<String>> {
        Ok(self.slot.clone())
    }

    fn clear(&mut self) -> Result<()> {
        self.slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{well_known, AchievementId, BuildingId, ResourceId};

    fn coins() -> ResourceId {
        ResourceId::new(well_known::COINS)
    }

    #[test]
    fn test_round_trip_preserves_ledger() {
        let catalog = Catalog::standard();
        let mut ledger = Ledger::from_catalog(&catalog);
        ledger.set_resource(&coins(), 123.45);
        ledger.set_building_count(&BuildingId::new("cottage"), 7);
        ledger.set_upgrade_level(&"trade_routes".into(), 3);
        ledger.unlock_achievement(AchievementId::new("first_home"));

        let text = encode(&save(&ledger, 1_700_000_000_000)).unwrap();
        let restored = load(&text, &catalog).unwrap();

        assert_eq!(restored.snapshot(), ledger.snapshot());
        assert_eq!(restored.state_hash(), ledger.state_hash());
    }

    #[test]
    fn test_missing_top_level_field_rejected() {
        let err = decode(r#"{"timestamp": 1, "ledger": {}}"#).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField("version")));

        let err = decode(r#"{"version": "1.0.0", "ledger": {}}"#).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField("timestamp")));

        let err = decode(r#"{"version": "1.0.0", "timestamp": 1}"#).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField("ledger")));
    }

    #[test]
    fn test_wrong_types_rejected() {
        let err = decode(r#"{"version": 1, "timestamp": 1, "ledger": {}}"#).unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { field: "version", .. }));

        let err =
            decode(r#"{"version": "1.0.0", "timestamp": "soon", "ledger": {}}"#).unwrap_err();
        assert!(matches!(err, ValidationError::WrongType { field: "timestamp", .. }));

        let err = decode(
            r#"{"version": "1.0.0", "timestamp": 1,
                "ledger": {"resources": {"coins": "lots"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidLedger(_)));
    }

    #[test]
    fn test_unknown_and_missing_keys_are_merged() {
        let catalog = Catalog::standard();
        // Old blob: missing most sections, one unknown resource, one unknown
        // top-level key.
        let text = r#"{
            "version": "1.0.3",
            "timestamp": 42,
            "future_field": true,
            "ledger": {
                "resources": {"coins": 75.0, "mana": 9000.0},
                "buildings": {"cottage": 2, "wizard_tower": 5}
            }
        }"#;

        let ledger = load(text, &catalog).unwrap();
        assert_eq!(ledger.resource(&coins()), 75.0);
        assert_eq!(ledger.building_count(&BuildingId::new("cottage")), 2);
        // Unknown ids dropped, missing ids defaulted.
        assert_eq!(ledger.resource(&"mana".into()), 0.0);
        assert_eq!(ledger.building_count(&"wizard_tower".into()), 0);
        assert_eq!(
            ledger.resource(&ResourceId::new(well_known::HAPPINESS)),
            100.0
        );
    }

    #[test]
    fn test_other_major_version_rejected() {
        let err =
            decode(r#"{"version": "2.0.0", "timestamp": 1, "ledger": {}}"#).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedVersion(_)));

        let err =
            decode(r#"{"version": "latest", "timestamp": 1, "ledger": {}}"#).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedVersion(_)));
    }

    #[test]
    fn test_negative_and_out_of_range_values_repaired() {
        let catalog = Catalog::standard();
        let text = r#"{
            "version": "1.0.0",
            "timestamp": 1,
            "ledger": {
                "resources": {"coins": -50.0, "happiness": 250.0},
                "upgrades": {"city_charter": 99}
            }
        }"#;

        let ledger = load(text, &catalog).unwrap();
        assert_eq!(ledger.resource(&coins()), 0.0);
        assert_eq!(
            ledger.resource(&ResourceId::new(well_known::HAPPINESS)),
            100.0
        );
        // Levels cap at the catalog maximum.
        assert_eq!(ledger.upgrade_level(&"city_charter".into()), 1);
    }

    #[test]
    fn test_unknown_achievements_dropped() {
        let catalog = Catalog::standard();
        let text = r#"{
            "version": "1.0.0",
            "timestamp": 1,
            "ledger": {
                "achievements": {"unlocked": ["first_home", "time_traveller"]}
            }
        }"#;

        let ledger = load(text, &catalog).unwrap();
        assert!(ledger.is_unlocked(&AchievementId::new("first_home")));
        assert_eq!(ledger.achievements().len(), 1);
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get().unwrap(), None);

        store.put("payload").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("payload"));

        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }
}
