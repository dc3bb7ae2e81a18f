//! Note use-case service.
//!
//! # Responsibility
//! - Provide note create/update/get/list APIs and the trash lifecycle.
//! - Normalize tag and category name inputs before they reach storage.
//!
//! # Invariants
//! - Titles must be non-blank after trimming.
//! - Name lists are trimmed and deduplicated preserving first occurrence;
//!   blank names are rejected, not silently dropped.

use crate::model::note::{Note, NoteId, NotePatch, NoteValidationError, UserId};
use crate::repo::note_repo::{
    normalize_note_limit, NoteListQuery, NoteRecord, NoteRepoError, NoteRepository,
};
use crate::repo::tag_repo::{TagRegistry, TagUsage};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Title is blank after trimming.
    EmptyTitle,
    /// A tag or category name input is blank.
    InvalidName(String),
    /// Target note does not exist for this owner.
    NoteNotFound(NoteId),
    /// Operation requires the note to be in the trash.
    NotInTrash(NoteId),
    /// Persistence-layer failure.
    Repo(NoteRepoError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be empty"),
            Self::InvalidName(value) => write!(f, "invalid name: `{value}`"),
            Self::NoteNotFound(note_uuid) => write!(f, "note not found: {note_uuid}"),
            Self::NotInTrash(note_uuid) => {
                write!(f, "note is not in the trash: {note_uuid}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteRepoError> for NoteServiceError {
    fn from(value: NoteRepoError) -> Self {
        match value {
            NoteRepoError::Validation(NoteValidationError::EmptyTitle) => Self::EmptyTitle,
            NoteRepoError::NotFound(note_uuid) => Self::NoteNotFound(note_uuid),
            NoteRepoError::NotInTrash(note_uuid) => Self::NotInTrash(note_uuid),
            other => Self::Repo(other),
        }
    }
}

/// List result envelope used by service callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesListResult {
    /// List items, newest first.
    pub items: Vec<NoteRecord>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one note with initial tag/category links and its version 1.
    pub fn create_note(
        &mut self,
        user_uuid: UserId,
        title: impl Into<String>,
        content: Option<String>,
        tags: Vec<String>,
        categories: Vec<String>,
    ) -> Result<NoteRecord, NoteServiceError> {
        let note = Note::new(user_uuid, title, content);
        note.validate()
            .map_err(|NoteValidationError::EmptyTitle| NoteServiceError::EmptyTitle)?;
        let tag_names = normalize_names(tags)?;
        let category_names = normalize_names(categories)?;
        Ok(self.repo.create_note(&note, &tag_names, &category_names)?)
    }

    /// Gets one active note by stable ID.
    pub fn get_note(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
    ) -> Result<Option<NoteRecord>, NoteServiceError> {
        Ok(self.repo.get_note(user_uuid, note_uuid, false)?)
    }

    /// Gets one note including the trash partition.
    pub fn get_note_any_state(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
    ) -> Result<Option<NoteRecord>, NoteServiceError> {
        Ok(self.repo.get_note(user_uuid, note_uuid, true)?)
    }

    /// Lists the owner's active notes, newest first.
    pub fn list_active_notes(
        &self,
        user_uuid: UserId,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<NotesListResult, NoteServiceError> {
        self.list_partition(user_uuid, false, limit, offset)
    }

    /// Lists the owner's trashed notes, most recently deleted first.
    pub fn list_trash(
        &self,
        user_uuid: UserId,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<NotesListResult, NoteServiceError> {
        self.list_partition(user_uuid, true, limit, offset)
    }

    /// Applies a partial update; any effective change snapshots first.
    pub fn update_note(
        &mut self,
        user_uuid: UserId,
        note_uuid: NoteId,
        patch: NotePatch,
    ) -> Result<NoteRecord, NoteServiceError> {
        if let Some(title) = patch.title.as_deref() {
            if title.trim().is_empty() {
                return Err(NoteServiceError::EmptyTitle);
            }
        }
        let patch = NotePatch {
            title: patch.title,
            content: patch.content,
            tags: patch.tags.map(normalize_names).transpose()?,
            categories: patch.categories.map(normalize_names).transpose()?,
        };
        Ok(self.repo.update_note(user_uuid, note_uuid, &patch)?)
    }

    /// Moves one live note to the trash.
    pub fn trash_note(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
    ) -> Result<(), NoteServiceError> {
        Ok(self.repo.soft_delete_note(user_uuid, note_uuid)?)
    }

    /// Brings one trashed note back to the active set.
    pub fn restore_note(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
    ) -> Result<(), NoteServiceError> {
        Ok(self.repo.restore_from_trash(user_uuid, note_uuid)?)
    }

    /// Destroys one trashed note together with its version history.
    pub fn delete_note_permanently(
        &mut self,
        user_uuid: UserId,
        note_uuid: NoteId,
    ) -> Result<(), NoteServiceError> {
        Ok(self.repo.purge_note(user_uuid, note_uuid)?)
    }

    /// Destroys every trashed note for the owner; returns the purge count.
    pub fn empty_trash(&mut self, user_uuid: UserId) -> Result<u64, NoteServiceError> {
        Ok(self.repo.purge_trash(user_uuid)?)
    }

    fn list_partition(
        &self,
        user_uuid: UserId,
        deleted: bool,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<NotesListResult, NoteServiceError> {
        let applied_limit = normalize_note_limit(limit);
        let query = NoteListQuery {
            deleted,
            limit: Some(applied_limit),
            offset,
        };
        let items = self.repo.list_notes(user_uuid, &query)?;
        Ok(NotesListResult {
            items,
            applied_limit,
        })
    }
}

/// Tag listing facade over the registry trait.
pub struct TagService<T: TagRegistry> {
    registry: T,
}

impl<T: TagRegistry> TagService<T> {
    pub fn new(registry: T) -> Self {
        Self { registry }
    }

    /// Lists tags used by the owner's active notes with usage counts.
    pub fn list_tags(&self, user_uuid: UserId) -> Result<Vec<TagUsage>, NoteServiceError> {
        Ok(self.registry.list_for_user(user_uuid)?)
    }
}

/// Trims each name, rejects blanks, and deduplicates preserving the first
/// occurrence. Matching stays case-sensitive.
fn normalize_names(names: Vec<String>) -> Result<Vec<String>, NoteServiceError> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(names.len());
    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(NoteServiceError::InvalidName(name));
        }
        if seen.insert(trimmed.to_string()) {
            normalized.push(trimmed.to_string());
        }
    }
    Ok(normalized)
}
