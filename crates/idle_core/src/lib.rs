//! # Idle Core
//!
//! Deterministic economy simulation core for the idle city game.
//!
//! This crate contains **only** the economy logic:
//! - No rendering
//! - No timers (the host drives [`session::GameSession::tick`])
//! - No direct file IO (persistence goes through an injected
//!   [`persistence::SaveStore`])
//!
//! This separation enables:
//! - Headless hosts and CI verification
//! - Deterministic replay of operation sequences
//! - Save-state validation without a UI in the loop
//!
//! ## Crate Structure
//!
//! - [`catalog`] - static building/upgrade/achievement definitions
//! - [`ledger`] - the mutable economic state and its invariants
//! - [`production`] - per-second rates, gating, per-tick accrual
//! - [`transaction`] - atomic check-then-commit purchases
//! - [`offline`] - capped, efficiency-scaled offline progress
//! - [`persistence`] - versioned save blobs and the storage seam
//! - [`achievements`] - one-way unlocks with one-shot rewards
//! - [`session`] - the tick scheduler and host-facing interface

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod achievements;
pub mod catalog;
pub mod error;
pub mod ledger;
pub mod offline;
pub mod persistence;
pub mod production;
pub mod session;
pub mod transaction;

pub use error::{GameError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{
        AchievementDef, AchievementId, BuildingDef, BuildingId, Catalog, Category, Condition,
        ResourceDef, ResourceId, StatKind, Threshold, UpgradeDef, UpgradeId,
    };
    pub use crate::error::{GameError, Result};
    pub use crate::ledger::{Ledger, LedgerSnapshot, Statistics};
    pub use crate::offline::{OfflineGrant, OfflineParams};
    pub use crate::persistence::{MemoryStore, SaveBlob, SaveStore, ValidationError};
    pub use crate::production::ProductionParams;
    pub use crate::session::{Clock, GameSession, ManualClock, TickConfig, TickEvents};
    pub use crate::transaction::{BuildingReceipt, PurchaseError, UpgradeReceipt};
}
