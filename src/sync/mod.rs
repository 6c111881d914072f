//! Synchronization pipeline
//!
//! This module ties the stages together:
//! - `UpsertEngine`: freshness-gated scrape, extract and atomic write per URL
//! - `prune`: source-scoped removal of listings that disappeared
//! - `Coordinator`: one cycle over every active source
//! - `Scheduler`: fixed-delay loop around the coordinator

mod coordinator;
mod locks;
mod prune;
mod scheduler;
mod upsert;

pub use coordinator::Coordinator;
pub use locks::HashLocks;
pub use prune::{prune, PruneOutcome};
pub use scheduler::{shutdown_channel, wait_for_signal, Scheduler};
pub use upsert::{resolve_draft, UpsertEngine, UpsertResult};

use crate::storage::{SqliteStorage, StorageError};
use std::sync::{Arc, Mutex, MutexGuard};

/// Catalog handle shared by the pipeline stages
///
/// The lock is held only for the duration of a storage call, never across
/// an await point.
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Wraps storage for sharing between stages
pub fn share(storage: SqliteStorage) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Locks the shared catalog
pub fn lock_storage(storage: &SharedStorage) -> Result<MutexGuard<'_, SqliteStorage>, StorageError> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}
