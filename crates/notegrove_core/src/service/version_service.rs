//! Version timeline use-case service.
//!
//! # Responsibility
//! - Expose manual snapshots, history queries, and restore over the
//!   repository.
//!
//! # Invariants
//! - History queries work for trashed notes; restore requires a live note.
//! - Restore returns the pre-restore backup snapshot so callers can surface
//!   the undo point.

use crate::model::note::{NoteId, UserId};
use crate::model::version::NoteVersion;
use crate::repo::version_repo::{VersionRepoError, VersionRepository};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for version use-cases.
#[derive(Debug)]
pub enum VersionServiceError {
    /// Owning note does not exist for this owner.
    NoteNotFound(NoteId),
    /// Restore target is in the trash.
    NoteInTrash(NoteId),
    /// Requested version number does not exist.
    VersionNotFound {
        note_uuid: NoteId,
        version_number: i64,
    },
    /// Persistence-layer failure.
    Repo(VersionRepoError),
}

impl Display for VersionServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(note_uuid) => write!(f, "note not found: {note_uuid}"),
            Self::NoteInTrash(note_uuid) => {
                write!(f, "note {note_uuid} is in the trash; restore it first")
            }
            Self::VersionNotFound {
                note_uuid,
                version_number,
            } => write!(f, "note {note_uuid} has no version {version_number}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for VersionServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<VersionRepoError> for VersionServiceError {
    fn from(value: VersionRepoError) -> Self {
        match value {
            VersionRepoError::NoteNotFound(note_uuid) => Self::NoteNotFound(note_uuid),
            VersionRepoError::NoteNotActive(note_uuid) => Self::NoteInTrash(note_uuid),
            VersionRepoError::VersionNotFound {
                note_uuid,
                version_number,
            } => Self::VersionNotFound {
                note_uuid,
                version_number,
            },
            other => Self::Repo(other),
        }
    }
}

/// Version service facade over repository implementations.
pub struct VersionService<R: VersionRepository> {
    repo: R,
}

impl<R: VersionRepository> VersionService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Captures a manual snapshot of the note's current state.
    pub fn snapshot(
        &mut self,
        user_uuid: UserId,
        note_uuid: NoteId,
        summary: Option<&str>,
    ) -> Result<NoteVersion, VersionServiceError> {
        Ok(self.repo.capture_version(user_uuid, note_uuid, summary)?)
    }

    /// Lists the note's history, newest snapshot first.
    pub fn history(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
    ) -> Result<Vec<NoteVersion>, VersionServiceError> {
        Ok(self.repo.list_versions(user_uuid, note_uuid)?)
    }

    /// Gets one snapshot by its per-note number.
    pub fn version(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
        version_number: i64,
    ) -> Result<NoteVersion, VersionServiceError> {
        self.repo
            .get_version(user_uuid, note_uuid, version_number)?
            .ok_or(VersionServiceError::VersionNotFound {
                note_uuid,
                version_number,
            })
    }

    /// Gets the most recent snapshot, if any exist.
    pub fn latest(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
    ) -> Result<Option<NoteVersion>, VersionServiceError> {
        Ok(self.repo.latest_version(user_uuid, note_uuid)?)
    }

    /// Counts the note's snapshots.
    pub fn count(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
    ) -> Result<i64, VersionServiceError> {
        Ok(self.repo.count_versions(user_uuid, note_uuid)?)
    }

    /// Restores the live note from one snapshot; returns the backup snapshot
    /// captured just before the overwrite.
    pub fn restore(
        &mut self,
        user_uuid: UserId,
        note_uuid: NoteId,
        version_number: i64,
    ) -> Result<NoteVersion, VersionServiceError> {
        Ok(self
            .repo
            .restore_version(user_uuid, note_uuid, version_number)?)
    }
}
