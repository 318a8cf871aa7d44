//! Soft-archive state
//!
//! Archivable records are never hard-deleted: they carry a status and the
//! time they were archived, and default queries only see active rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Visible to default queries
    #[default]
    Active,
    /// Hidden until restored
    Archived,
}

/// Archive state of a record
///
/// `archived_at` is `Some` exactly when `status` is `Archived`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Archival {
    status: RecordStatus,
    archived_at: Option<DateTime<Utc>>,
}

impl Archival {
    /// Active record
    #[inline]
    #[must_use]
    pub fn active() -> Self {
        Self::default()
    }

    /// Current status
    #[inline]
    #[must_use]
    pub fn status(&self) -> RecordStatus {
        self.status
    }

    /// When the record was archived, if it is
    #[inline]
    #[must_use]
    pub fn archived_at(&self) -> Option<DateTime<Utc>> {
        self.archived_at
    }

    /// Whether the record is active
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }

    /// Archive at `now`. Archiving twice keeps the first timestamp.
    pub fn archive(&mut self, now: DateTime<Utc>) {
        if self.is_active() {
            self.status = RecordStatus::Archived;
            self.archived_at = Some(now);
        }
    }

    /// Restore to active
    pub fn restore(&mut self) {
        self.status = RecordStatus::Active;
        self.archived_at = None;
    }
}

/// Which archive states a query should return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFilter {
    /// Active records only
    #[default]
    Active,
    /// Archived records only
    Archived,
    /// Everything
    All,
}

impl ArchiveFilter {
    /// Whether a record with this archive state passes the filter
    #[inline]
    #[must_use]
    pub fn admits(self, archival: &Archival) -> bool {
        match self {
            ArchiveFilter::Active => archival.is_active(),
            ArchiveFilter::Archived => !archival.is_active(),
            ArchiveFilter::All => true,
        }
    }
}
