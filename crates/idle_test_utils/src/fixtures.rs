//! Fixture builders for sessions, catalogs and save stores.

use std::sync::{Arc, Mutex};

use idle_core::catalog::{
    BuildingDef, Catalog, CatalogData, Category, ResourceDef,
};
use idle_core::error::{GameError, Result};
use idle_core::persistence::{MemoryStore, SaveStore};
use idle_core::session::{GameSession, ManualClock};

/// A minimal two-building catalog for focused unit tests.
///
/// One residential producer ("hut", population) and one commercial producer
/// ("stall", coins), no upgrades, no achievements.
#[must_use]
pub fn tiny_catalog() -> Catalog {
    let data = CatalogData {
        resources: vec![
            ResourceDef::new("coins", "Coins").with_initial(100.0),
            ResourceDef::new("population", "Population"),
            ResourceDef::new("happiness", "Happiness")
                .percentage()
                .with_initial(100.0),
        ],
        buildings: vec![
            BuildingDef::new("hut", "Hut", 10.0, 1.15, 0.1, "population", Category::Residential),
            BuildingDef::new("stall", "Stall", 20.0, 1.15, 1.0, "coins", Category::Commercial),
        ],
        upgrades: vec![],
        achievements: vec![],
    };
    Catalog::new(data).expect("tiny catalog must validate")
}

/// A standard-catalog session on a manual clock at t=0, no store attached.
#[must_use]
pub fn standard_session() -> GameSession {
    GameSession::new(Catalog::standard(), Box::new(ManualClock::at(0)))
}

/// A standard-catalog session with a manual clock and an in-memory store.
///
/// Returns the clock alongside the session so tests can advance time.
#[must_use]
pub fn stored_session() -> (GameSession, ManualClock) {
    let clock = ManualClock::at(0);
    let session = GameSession::new(Catalog::standard(), Box::new(clock.clone()))
        .with_store(Box::new(MemoryStore::new()));
    (session, clock)
}

/// Give a session spending money through its public interface.
///
/// Uses manual collection, so the click statistic advances by one.
pub fn fund(session: &mut GameSession, coins: f64) {
    session.collect_manually(&"coins".into(), coins);
}

/// A save store whose contents can be inspected from outside the session.
///
/// Cloning shares the same underlying slot.
#[derive(Debug, Clone, Default)]
pub struct SharedMemoryStore {
    inner: Arc<Mutex<MemoryStore>>,
}

impl SharedMemoryStore {
    /// Create an empty shared store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently persisted payload, if any.
    #[must_use]
    pub fn payload(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("store mutex")
            .get()
            .expect("memory store get")
    }
}

impl SaveStore for SharedMemoryStore {
    fn put(&mut self, payload: &str) -> Result<()> {
        self.inner.lock().expect("store mutex").put(payload)
    }

    fn get(&self) -> Result<Option<String>> {
        self.inner.lock().expect("store mutex").get()
    }

    fn clear(&mut self) -> Result<()> {
        self.inner.lock().expect("store mutex").clear()
    }
}

/// A save store that starts working and then fails every write.
///
/// Models a persistence medium going away mid-session, for degradation
/// tests.
#[derive(Debug, Default)]
pub struct FlakyStore {
    /// Writes to accept before the simulated outage.
    pub allow_puts: u32,
    puts: u32,
    inner: MemoryStore,
}

impl FlakyStore {
    /// A store that fails from the first write onward.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// A store that accepts `allow_puts` writes and then fails.
    #[must_use]
    pub fn failing_after(allow_puts: u32) -> Self {
        Self {
            allow_puts,
            puts: 0,
            inner: MemoryStore::new(),
        }
    }
}

impl SaveStore for FlakyStore {
    fn put(&mut self, payload: &str) -> Result<()> {
        if self.puts >= self.allow_puts {
            return Err(GameError::StorageUnavailable(
                "simulated storage outage".to_string(),
            ));
        }
        self.puts += 1;
        self.inner.put(payload)
    }

    fn get(&self) -> Result<Option<String>> {
        self.inner.get()
    }

    fn clear(&mut self) -> Result<()> {
        self.inner.clear()
    }
}
