use chrono::{DateTime, Utc};
use thiserror::Error;

/// Only the most recent snapshots are retained; older ones are evicted
/// from the front of the history on every save that exceeds the cap.
pub const MAX_SNAPSHOTS: usize = 20;

/// The subset of a post's fields whose change triggers a version snapshot.
/// The publication flag and view counter are deliberately excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFields {
    pub title: String,
    pub content: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub category: String,
}

/// The live record state the write path sees before applying a change.
/// `updated_at` is the timestamp of the previous update and becomes the
/// snapshot's `created_at` when this state is preserved.
#[derive(Debug, Clone)]
pub struct RecordState {
    pub fields: TrackedFields,
    pub author_id: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

/// An immutable copy of the tracked fields as they were before a save.
#[derive(Debug, Clone)]
pub struct VersionSnapshot {
    pub version_number: i64,
    pub fields: TrackedFields,
    pub author_id: Option<i64>,
    pub change_description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("version {0} not found")]
    NotFound(i64),
}

/// What a save did to the history, so the write path knows which rows to
/// insert and which to delete.
#[derive(Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// No tracked field differed; nothing was recorded.
    Unchanged,
    /// A snapshot of the previous state was appended and the version bumped.
    Recorded { new_version: i64, evicted: Vec<i64> },
}

impl SaveOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded { .. })
    }
}

/// In-memory view of a record's version history, snapshots ordered
/// oldest-first. The write path loads it, applies a save, and persists
/// the resulting appends and evictions.
#[derive(Debug, Clone)]
pub struct VersionHistory {
    pub current_version: i64,
    pub snapshots: Vec<VersionSnapshot>,
}

impl VersionHistory {
    pub fn new() -> Self {
        Self {
            current_version: 1,
            snapshots: Vec::new(),
        }
    }

    pub fn with(current_version: i64, snapshots: Vec<VersionSnapshot>) -> Self {
        Self {
            current_version,
            snapshots,
        }
    }

    /// Compares the tracked-field set only. If nothing differs this is a
    /// no-op; otherwise the previous state is appended as a snapshot, the
    /// version is bumped by exactly 1, and the history is truncated from
    /// the front down to `MAX_SNAPSHOTS` entries without reordering.
    pub fn record_if_changed(
        &mut self,
        previous: &RecordState,
        next: &TrackedFields,
        change_description: Option<&str>,
    ) -> SaveOutcome {
        if previous.fields == *next {
            return SaveOutcome::Unchanged;
        }

        self.snapshots.push(VersionSnapshot {
            version_number: self.current_version,
            fields: previous.fields.clone(),
            author_id: previous.author_id,
            change_description: change_description.unwrap_or_default().to_string(),
            created_at: previous.updated_at,
        });
        self.current_version += 1;

        let mut evicted = Vec::new();
        while self.snapshots.len() > MAX_SNAPSHOTS {
            evicted.push(self.snapshots.remove(0).version_number);
        }

        SaveOutcome::Recorded {
            new_version: self.current_version,
            evicted,
        }
    }

    /// A version older than the retention window is indistinguishable from
    /// one that never existed; both are `NotFound`.
    pub fn snapshot(&self, version_number: i64) -> Result<&VersionSnapshot, VersionError> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.version_number == version_number)
            .ok_or(VersionError::NotFound(version_number))
    }

    /// Rolls the tracked fields back to a stored snapshot by running the
    /// normal save path with the snapshot's values, so the pre-restore
    /// state is itself preserved as a new snapshot before the rollback
    /// takes effect. Existing snapshots are never mutated.
    pub fn restore(
        &mut self,
        previous: &RecordState,
        version_number: i64,
        change_description: Option<&str>,
    ) -> Result<(TrackedFields, SaveOutcome), VersionError> {
        let target = self.snapshot(version_number)?.fields.clone();
        let outcome = self.record_if_changed(previous, &target, change_description);
        Ok((target, outcome))
    }
}

impl Default for VersionHistory {
    fn default() -> Self {
        Self::new()
    }
}
