//! Taskdeck Store
//!
//! In-memory relational store standing in for the persistence layer.
//!
//! # Overview
//!
//! - **Tables**: one ordered map per entity plus the grant and favorite pivots
//! - **Transaction**: exclusive write access with an undo log; dropped
//!   without `commit` it rolls every change back
//! - **KeyedLocks**: async per-key mutexes used to serialize work on one
//!   task group or one project's grants
//! - **Snapshot**: serde image of every table, for fixtures and the CLI
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use taskdeck_model::{Project, ProjectId};
//! use taskdeck_store::MemoryStore;
//!
//! let store = MemoryStore::new();
//! let mut tx = store.begin();
//! tx.put_project(Project::new(ProjectId(1), "Apollo", Utc::now()));
//! tx.commit();
//!
//! assert!(store.read().project(ProjectId(1)).is_some());
//! ```

#![allow(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod labels;
mod locks;
mod snapshot;
mod tables;
mod transaction;

pub use error::StoreError;
pub use labels::LabelReset;
pub use locks::KeyedLocks;
pub use snapshot::{Favorite, Grant, Snapshot};
pub use tables::Tables;
pub use transaction::Transaction;

use parking_lot::{RwLock, RwLockReadGuard};
use std::path::Path;

/// Shared in-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store from a snapshot
    ///
    /// # Errors
    /// `StoreError` when the snapshot has duplicate ids or dangling references.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        Ok(Self {
            tables: RwLock::new(Tables::from_snapshot(snapshot)?),
        })
    }

    /// Load a JSON snapshot file
    ///
    /// # Errors
    /// IO, JSON or integrity errors.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        Self::from_snapshot(snapshot)
    }

    /// Write the current state as a JSON snapshot file
    ///
    /// # Errors
    /// IO or JSON errors.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Image of every table
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.tables.read().to_snapshot()
    }

    /// Shared read access
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read()
    }

    /// Begin an exclusive transaction
    #[inline]
    pub fn begin(&self) -> Transaction<'_> {
        Transaction::new(self.tables.write())
    }

    /// Run `f` in a transaction, committing only if it returns `Ok`
    ///
    /// # Errors
    /// Whatever `f` returns; every change made before the error is undone.
    pub fn transaction<T, E>(
        &self,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut tx = self.begin();
        let out = f(&mut tx)?;
        tx.commit();
        Ok(out)
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
