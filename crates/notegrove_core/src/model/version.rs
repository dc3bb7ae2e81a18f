//! Version snapshot domain model.
//!
//! # Responsibility
//! - Define the immutable point-in-time copy of a note's state.
//!
//! # Invariants
//! - `(note_uuid, version_number)` is unique; numbers start at 1 and grow
//!   monotonically per note.
//! - Snapshots are append-only; they are never edited, only created or
//!   cascade-deleted with their note.
//! - Tag and category associations are stored by literal name so a snapshot
//!   survives later renames or deletions of the referenced entities.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::note::{NoteId, UserId};

/// Stable identifier for a version snapshot row.
pub type VersionId = Uuid;

/// Change summary recorded for the implicit snapshot at note creation.
pub const INITIAL_VERSION_SUMMARY: &str = "initial version";

/// Change summary recorded when no caller-supplied summary is given.
pub const MANUAL_SNAPSHOT_SUMMARY: &str = "manual snapshot";

/// Immutable snapshot of a note's state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteVersion {
    /// Stable snapshot row ID.
    pub uuid: VersionId,
    /// Owning note; snapshots are exclusively owned by it.
    pub note_uuid: NoteId,
    /// Per-note sequence number starting at 1.
    pub version_number: i64,
    /// Title at capture time.
    pub title: String,
    /// Content at capture time.
    pub content: Option<String>,
    /// Tag names at capture time (names, not references).
    pub tags: Vec<String>,
    /// Category names at capture time (names, not references).
    pub categories: Vec<String>,
    /// Free-text description of what triggered this snapshot.
    pub change_summary: Option<String>,
    /// Epoch ms capture timestamp.
    pub created_at: i64,
    /// User whose mutation triggered the capture.
    pub created_by: UserId,
}

/// Builds the summary recorded before a restore overwrites the live note.
pub fn restore_summary(version_number: i64) -> String {
    format!("restored to version {version_number}")
}
