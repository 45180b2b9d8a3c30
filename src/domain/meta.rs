//! Aggregate Metadata
//!
//! Version, timestamps, soft-delete flag and change tracking shared by
//! every persisted aggregate.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

/// Versioned metadata embedded in an aggregate.
///
/// `F` identifies the aggregate's mutable fields; setters on the aggregate
/// record the field they touched so callers can detect no-op updates before
/// going to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta<F: Ord> {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    disabled: bool,
    changes: BTreeSet<F>,
}

impl<F: Ord + Copy> Meta<F> {
    /// Metadata for an aggregate that has never been stored
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            version: 0,
            created_at: now,
            updated_at: now,
            disabled: false,
            changes: BTreeSet::new(),
        }
    }

    /// Overwrite metadata with values loaded from storage.
    ///
    /// Does not record a change.
    pub fn hydrate(
        &mut self,
        version: u32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        disabled: bool,
    ) {
        self.version = version;
        self.created_at = created_at;
        self.updated_at = updated_at;
        self.disabled = disabled;
    }

    /// Record that `field` was assigned
    pub fn register_change(&mut self, field: F) {
        self.changes.insert(field);
    }

    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Fields changed since construction, hydration or the last clear
    pub fn changes(&self) -> impl Iterator<Item = F> + '_ {
        self.changes.iter().copied()
    }

    pub fn is_changed(&self, field: F) -> bool {
        self.changes.contains(&field)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}

impl<F: Ord + Copy> Default for Meta<F> {
    fn default() -> Self {
        Self::new()
    }
}
