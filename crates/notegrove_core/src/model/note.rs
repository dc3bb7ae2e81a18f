//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record and its soft-delete lifecycle.
//! - Validate user-supplied note fields before persistence.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another note.
//! - `is_deleted` is the source of truth for trash state.
//! - A soft-deleted note keeps its content and version history intact.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a note.
pub type NoteId = Uuid;

/// Stable identifier for the owning user.
///
/// Owners arrive pre-authenticated from the calling layer; the core only
/// uses this value for scoping.
pub type UserId = Uuid;

/// Validation failures for note write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Title is empty or whitespace-only after trimming.
    EmptyTitle,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be blank"),
        }
    }
}

impl Error for NoteValidationError {}

/// Canonical note write model.
///
/// Timestamps are owned by storage defaults; the read model
/// (`repo::note_repo::NoteRecord`) carries them back out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Stable global ID used for linking and version ownership.
    pub uuid: NoteId,
    /// Owning user; every query is scoped by this value.
    pub user_uuid: UserId,
    /// Display title. Must be non-blank.
    pub title: String,
    /// Free-form body text. `None` means the note has no body yet.
    pub content: Option<String>,
    /// Soft delete tombstone; deleted notes live in the trash.
    pub is_deleted: bool,
}

impl Note {
    /// Creates a new live note with a generated stable ID.
    pub fn new(user_uuid: UserId, title: impl Into<String>, content: Option<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            user_uuid,
            title: title.into(),
            content,
            is_deleted: false,
        }
    }

    /// Checks write-path invariants.
    ///
    /// # Errors
    /// - `EmptyTitle` when the title is blank after trimming.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.title.trim().is_empty() {
            return Err(NoteValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Returns whether this note is visible in active views.
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

/// Partial update for a note.
///
/// Fields set to `None` are left untouched; `Some` replaces the current
/// value. Tag and category lists are full-set replacements, not merges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
}

impl NotePatch {
    /// Returns whether the patch carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.categories.is_none()
    }
}
