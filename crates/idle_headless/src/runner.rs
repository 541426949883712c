//! Timer-driven session runner.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use tracing::{info, warn};

use idle_core::catalog::Catalog;
use idle_core::error::{GameError, Result};
use idle_core::ledger::LedgerSnapshot;
use idle_core::persistence;
use idle_core::session::{Clock, GameSession, TickConfig};

use crate::store::FileStore;

/// Wall-clock time source for real hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// What to do when the existing save file fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnInvalidSave {
    /// Refuse to start, leaving the file for inspection.
    Abort,
    /// Log the rejection and start fresh. The rejected file is kept on disk
    /// until the first successful save overwrites it.
    Fresh,
}

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Save file driven by the session's autosave and final save.
    pub save_path: PathBuf,
    /// Optional RON catalog file; the standard catalog when absent.
    pub catalog_path: Option<PathBuf>,
    /// Wall-clock milliseconds per tick.
    pub tick_ms: u64,
    /// Stop after this many wall-clock seconds; run until killed when absent.
    pub duration_secs: Option<f64>,
    /// Seconds between progress log lines.
    pub status_every_secs: u64,
    /// Policy for a save file that fails validation.
    pub on_invalid_save: OnInvalidSave,
}

/// Load a catalog from a RON file, or the standard one when no path is
/// given.
///
/// # Errors
///
/// Returns [`GameError::DataFile`] if the file cannot be read, or a catalog
/// parse/validation error.
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        None => Ok(Catalog::standard()),
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| GameError::DataFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            Catalog::from_ron_str(&text)
        }
    }
}

/// Run a session until the duration elapses (or forever), autosaving on the
/// core's cadence and writing a final save on exit.
///
/// # Errors
///
/// Returns catalog errors, a validation error for a rejected save under
/// [`OnInvalidSave::Abort`], or a storage error from the final save.
pub fn run(config: &RunConfig) -> Result<LedgerSnapshot> {
    let catalog = load_catalog(config.catalog_path.as_deref())?;
    let mut session = GameSession::new(catalog, Box::new(SystemClock))
        .with_store(Box::new(FileStore::new(&config.save_path)))
        .with_tick_config(TickConfig {
            tick_seconds: config.tick_ms as f64 / 1000.0,
            ..TickConfig::default()
        });

    match session.load() {
        Ok(Some(grant)) if !grant.is_empty() => {
            info!(
                offline_seconds = grant.offline_seconds,
                efficiency = grant.efficiency,
                "Save loaded; offline progress granted"
            );
            for (resource, amount) in &grant.granted {
                info!(resource = %resource, amount = *amount, "Offline grant");
            }
        }
        Ok(Some(_)) => info!("Save loaded; no offline progress accrued"),
        Ok(None) => info!("No existing save; starting fresh"),
        Err(GameError::Validation(err)) => match config.on_invalid_save {
            OnInvalidSave::Abort => {
                warn!("Rerun with --on-invalid-save fresh to discard the save");
                return Err(GameError::Validation(err));
            }
            OnInvalidSave::Fresh => {
                warn!(error = %err, "Rejected save blob; starting fresh");
            }
        },
        Err(err) => return Err(err),
    }

    let tick_period = Duration::from_millis(config.tick_ms);
    let status_period = Duration::from_secs(config.status_every_secs.max(1));
    let started = Instant::now();
    let mut last_status = Instant::now();

    loop {
        std::thread::sleep(tick_period);
        let events = session.tick();

        for id in &events.unlocked {
            info!(achievement = %id, "Achievement unlocked");
        }
        if events.storage_lost {
            warn!("Save storage unavailable; progress is no longer persisted");
        }

        if last_status.elapsed() >= status_period {
            let ledger = session.ledger();
            info!(
                ticks = session.tick_count(),
                coins = ledger.resource_named("coins"),
                population = ledger.resource_named("population"),
                happiness = ledger.resource_named("happiness"),
                "Progress"
            );
            last_status = Instant::now();
        }

        if let Some(limit) = config.duration_secs {
            if started.elapsed().as_secs_f64() >= limit {
                break;
            }
        }
    }

    session.save()?;
    info!(path = %config.save_path.display(), "Final save written");
    Ok(session.snapshot())
}

/// Validate a RON catalog file and return a one-line summary.
///
/// # Errors
///
/// Returns the parse or validation error for a bad catalog.
pub fn validate_catalog(path: &Path) -> Result<String> {
    let catalog = load_catalog(Some(path))?;
    Ok(format!(
        "{}: {} resources, {} buildings, {} upgrades, {} achievements",
        path.display(),
        catalog.resources().len(),
        catalog.buildings().len(),
        catalog.upgrades().len(),
        catalog.achievements().len(),
    ))
}

/// Decode a save file and render its blob as pretty JSON.
///
/// # Errors
///
/// Returns [`GameError::DataFile`] if the file cannot be read, a validation
/// error for a rejected blob, or an encode error.
pub fn inspect_save(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path).map_err(|e| GameError::DataFile {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let blob = persistence::decode(&text).map_err(GameError::Validation)?;
    serde_json::to_string_pretty(&blob).map_err(|e| GameError::Encode(e.to_string()))
}
