//! The game session: tick scheduling and the host-facing interface.
//!
//! [`GameSession`] owns the [`Ledger`] exclusively and is the only place
//! mutation happens. The host (UI, headless runner) drives it through the
//! entry points here and renders from [`GameSession::snapshot`] - it never
//! holds a mutable reference into the core.
//!
//! # Scheduling
//!
//! The session is single-threaded and timer-driven by its host: the host
//! calls [`GameSession::tick`] at a fixed cadence (default 100 ms) and the
//! session advances the ledger by exactly one fixed step per call. Because
//! `tick` takes `&mut self`, at most one tick can ever be in flight - the
//! borrow checker enforces the reentrancy invariant. Periodic side effects
//! run on tick cadence: the achievement sweep every `sweep_every_ticks` and
//! the autosave every `autosave_every_ticks`.
//!
//! A failure in a periodic subsystem never aborts the tick: a failed
//! autosave degrades the session to in-memory-only operation, reported to
//! the host exactly once via [`TickEvents::storage_lost`].

use tracing::warn;

use crate::achievements;
use crate::catalog::{AchievementId, BuildingId, Catalog, ResourceId, UpgradeId};
use crate::error::Result;
use crate::ledger::{Ledger, LedgerSnapshot};
use crate::offline::{self, OfflineGrant, OfflineParams};
use crate::persistence::{self, SaveStore};
use crate::production::{self, ProductionParams, RateBreakdown};
use crate::transaction::{
    self, BuildingReceipt, PurchaseError, UpgradeReceipt,
};

/// Source of wall-clock time, injected so the core itself performs no IO.
///
/// Hosts provide a real clock; tests use a manual one.
pub trait Clock {
    /// Current wall-clock time in epoch milliseconds.
    fn now_ms(&self) -> u64;
}

/// A hand-advanced clock for tests and deterministic replays.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    ms: std::sync::Arc<std::sync::atomic::AtomicU64>,
}

impl ManualClock {
    /// Create a clock at the given epoch-millisecond instant.
    #[must_use]
    pub fn at(ms: u64) -> Self {
        let clock = Self::default();
        clock.set(ms);
        clock
    }

    /// Move the clock to an absolute instant.
    pub fn set(&self, ms: u64) {
        self.ms.store(ms, std::sync::atomic::Ordering::Relaxed);
    }

    /// Advance the clock by a relative amount.
    pub fn advance(&self, delta_ms: u64) {
        self.ms
            .fetch_add(delta_ms, std::sync::atomic::Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.ms.load(std::sync::atomic::Ordering::Relaxed)
    }
}

/// Fixed tick cadence configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickConfig {
    /// Simulated seconds each tick advances (default 0.1 = 10 Hz).
    pub tick_seconds: f64,
    /// Autosave every N ticks (default 100 ticks = 10 s).
    pub autosave_every_ticks: u64,
    /// Achievement sweep every M ticks (default 10 ticks = 1 s).
    pub sweep_every_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 0.1,
            autosave_every_ticks: 100,
            sweep_every_ticks: 10,
        }
    }
}

/// Events generated during a tick, for the host to react to.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Achievements newly unlocked by this tick's sweep.
    pub unlocked: Vec<AchievementId>,
    /// Whether this tick wrote an autosave.
    pub autosaved: bool,
    /// Set exactly once, on the tick where the save store first failed and
    /// the session degraded to in-memory-only operation.
    pub storage_lost: bool,
}

/// The economy simulation session.
///
/// Owns the catalog, the ledger, the tick cadence and the optional save
/// store. See the [module docs](self) for the scheduling model.
///
/// # Example
///
/// ```
/// use idle_core::catalog::Catalog;
/// use idle_core::session::{GameSession, ManualClock};
///
/// let mut session = GameSession::new(Catalog::standard(), Box::new(ManualClock::at(0)));
/// session.purchase_building(&"cottage".into()).unwrap();
/// let events = session.tick();
/// assert!(events.unlocked.is_empty()); // sweep has not come due yet
/// assert!(session.snapshot().resources["population"] > 0.0);
/// ```
pub struct GameSession {
    catalog: Catalog,
    ledger: Ledger,
    config: TickConfig,
    production: ProductionParams,
    offline: OfflineParams,
    clock: Box<dyn Clock>,
    store: Option<Box<dyn SaveStore>>,
    storage_degraded: bool,
    ticks: u64,
}

impl GameSession {
    /// Create a session with a fresh, catalog-defaulted ledger and no save
    /// store.
    #[must_use]
    pub fn new(catalog: Catalog, clock: Box<dyn Clock>) -> Self {
        let ledger = Ledger::from_catalog(&catalog);
        Self {
            catalog,
            ledger,
            config: TickConfig::default(),
            production: ProductionParams::default(),
            offline: OfflineParams::default(),
            clock,
            store: None,
            storage_degraded: false,
            ticks: 0,
        }
    }

    /// Attach a save store.
    #[must_use]
    pub fn with_store(mut self, store: Box<dyn SaveStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Override the tick cadence.
    #[must_use]
    pub fn with_tick_config(mut self, config: TickConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the production constants.
    #[must_use]
    pub fn with_production_params(mut self, params: ProductionParams) -> Self {
        self.production = params;
        self
    }

    /// Override the offline compensation constants.
    #[must_use]
    pub fn with_offline_params(mut self, params: OfflineParams) -> Self {
        self.offline = params;
        self
    }

    /// The catalog this session runs on.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Read-only view of the ledger.
    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Read-only copy of the ledger for rendering.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.ledger.snapshot()
    }

    /// Number of ticks advanced since the session (or its last loaded save)
    /// started.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Whether the session has degraded to in-memory-only operation.
    #[must_use]
    pub fn storage_degraded(&self) -> bool {
        self.storage_degraded
    }

    /// Advance the simulation by one fixed step.
    ///
    /// Advances game time, applies production, and on cadence runs the
    /// achievement sweep and the autosave. Neither periodic subsystem can
    /// abort the tick.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = TickEvents::default();
        let dt = self.config.tick_seconds;

        self.ledger.statistics_mut().game_seconds += dt;
        production::apply_tick(&mut self.ledger, &self.catalog, &self.production, dt);
        self.ticks += 1;

        if self.config.sweep_every_ticks > 0 && self.ticks % self.config.sweep_every_ticks == 0 {
            events.unlocked = achievements::sweep(&mut self.ledger, &self.catalog);
        }

        if self.config.autosave_every_ticks > 0
            && self.ticks % self.config.autosave_every_ticks == 0
        {
            self.autosave(&mut events);
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.ledger.state_hash();
            tracing::debug!(tick = self.ticks, state_hash = hash, "Ledger state hash");
        }

        events
    }

    fn autosave(&mut self, events: &mut TickEvents) {
        if self.storage_degraded {
            return;
        }
        match self.persist() {
            Ok(true) => events.autosaved = true,
            Ok(false) => {}
            Err(err) => {
                // One-shot degradation: keep simulating, stop retrying, and
                // tell the host exactly once.
                self.storage_degraded = true;
                events.storage_lost = true;
                warn!(error = %err, "Autosave failed; continuing in memory only");
            }
        }
    }

    /// Write the current ledger to the store, if one is attached.
    ///
    /// Returns whether a write happened.
    fn persist(&mut self) -> Result<bool> {
        let Some(store) = self.store.as_mut() else {
            return Ok(false);
        };
        let blob = persistence::save(&self.ledger, self.clock.now_ms());
        let text = persistence::encode(&blob)?;
        store.put(&text)?;
        Ok(true)
    }

    /// Purchase one instance of a building.
    ///
    /// # Errors
    ///
    /// Returns the [`PurchaseError`] refusal; the ledger is unchanged on
    /// every error path.
    pub fn purchase_building(
        &mut self,
        id: &BuildingId,
    ) -> std::result::Result<BuildingReceipt, PurchaseError> {
        transaction::purchase_building(&mut self.ledger, &self.catalog, id)
    }

    /// Purchase one level of an upgrade.
    ///
    /// # Errors
    ///
    /// Returns the [`PurchaseError`] refusal; the ledger is unchanged on
    /// every error path.
    pub fn purchase_upgrade(
        &mut self,
        id: &UpgradeId,
    ) -> std::result::Result<UpgradeReceipt, PurchaseError> {
        transaction::purchase_upgrade(&mut self.ledger, &self.catalog, id)
    }

    /// Player-triggered manual collection (click-to-earn).
    ///
    /// Bypasses production gating but not resource floors or percentage
    /// clamps. Returns the amount actually credited after clamping.
    pub fn collect_manually(&mut self, resource: &ResourceId, amount: f64) -> f64 {
        let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
        let applied = self.ledger.earn(resource, amount);
        self.ledger.round_resource(resource);
        self.ledger.statistics_mut().total_clicks += 1;
        applied
    }

    /// Net per-second production rate for a resource, itemised.
    #[must_use]
    pub fn rate_breakdown(&self, resource: &ResourceId) -> RateBreakdown {
        production::breakdown(resource, &self.ledger, &self.catalog, &self.production)
    }

    /// Progress toward an achievement in `[0, 1]`.
    #[must_use]
    pub fn achievement_progress(&self, id: &AchievementId) -> Option<f64> {
        achievements::progress(&self.ledger, &self.catalog, id)
    }

    /// Save the ledger to the attached store now.
    ///
    /// A successful explicit save clears a previous storage degradation
    /// (the medium evidently recovered).
    ///
    /// # Errors
    ///
    /// Returns [`GameError::StorageUnavailable`](crate::GameError::StorageUnavailable)
    /// if the store write fails; the session then degrades to
    /// in-memory-only operation.
    pub fn save(&mut self) -> Result<()> {
        match self.persist() {
            Ok(_) => {
                self.storage_degraded = false;
                Ok(())
            }
            Err(err) => {
                self.storage_degraded = true;
                Err(err)
            }
        }
    }

    /// Load the ledger from the attached store, then reconcile offline
    /// progress for the time since the save was written.
    ///
    /// Returns `Ok(None)` when no store is attached or no save exists.
    /// On validation failure the current ledger is left untouched and the
    /// error is surfaced so the host can offer a reset-to-fresh decision;
    /// the persisted blob is not overwritten until an explicit save
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Validation`](crate::GameError::Validation) for a
    /// rejected blob, or
    /// [`GameError::StorageUnavailable`](crate::GameError::StorageUnavailable)
    /// if the store read fails.
    pub fn load(&mut self) -> Result<Option<OfflineGrant>> {
        let Some(store) = self.store.as_ref() else {
            return Ok(None);
        };
        let Some(text) = store.get()? else {
            return Ok(None);
        };

        let blob = persistence::decode(&text)?;
        let mut ledger = persistence::apply(&blob, &self.catalog);
        let grant = offline::reconcile(
            blob.timestamp,
            self.clock.now_ms(),
            &mut ledger,
            &self.catalog,
            &self.production,
            &self.offline,
        );

        // All-or-nothing: the live ledger is only replaced once the blob
        // decoded, applied and reconciled.
        self.ledger = ledger;
        self.ticks = 0;
        Ok(Some(grant))
    }

    /// Export the current state as save-blob text for the player to keep.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Encode`](crate::GameError::Encode) if
    /// serialization fails.
    pub fn export_save(&self) -> Result<String> {
        let blob = persistence::save(&self.ledger, self.clock.now_ms());
        persistence::encode(&blob)
    }

    /// Import save-blob text, replacing the current state.
    ///
    /// Validates fully before committing: a failed import never partially
    /// mutates the ledger. Imports do not grant offline progress.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Validation`](crate::GameError::Validation) for a
    /// rejected blob.
    pub fn import_save(&mut self, text: &str) -> Result<()> {
        let blob = persistence::decode(text.trim())?;
        self.ledger = persistence::apply(&blob, &self.catalog);
        self.ticks = 0;
        Ok(())
    }

    /// Reset to a fresh ledger and clear persisted storage.
    ///
    /// Destroys all progress including achievements; hosts must obtain an
    /// explicit player confirmation before calling this.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::StorageUnavailable`](crate::GameError::StorageUnavailable)
    /// if clearing the store fails; the in-memory reset still happens.
    pub fn reset_all(&mut self) -> Result<()> {
        self.ledger = Ledger::from_catalog(&self.catalog);
        self.ticks = 0;
        if let Some(store) = self.store.as_mut() {
            store.clear()?;
        }
        Ok(())
    }
}
