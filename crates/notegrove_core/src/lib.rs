//! Core domain logic for Notegrove.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::category::{
    Category, CategoryAttrsPatch, CategoryDraft, CategoryId, CategoryValidationError,
};
pub use model::note::{Note, NoteId, NotePatch, NoteValidationError, UserId};
pub use model::version::{NoteVersion, VersionId};
pub use repo::category_repo::{
    CategoryRepoError, CategoryRepoResult, CategoryRepository, SqliteCategoryRepository,
};
pub use repo::note_repo::{
    NoteListQuery, NoteRecord, NoteRepoError, NoteRepoResult, NoteRepository,
    SqliteNoteRepository,
};
pub use repo::tag_repo::{SqliteTagRegistry, TagRegistry, TagUsage};
pub use repo::version_repo::{
    SqliteVersionRepository, VersionRepoError, VersionRepoResult, VersionRepository,
};
pub use service::category_service::{CategoryService, CategoryServiceError, CategoryTreeNode};
pub use service::note_service::{NoteService, NoteServiceError, NotesListResult, TagService};
pub use service::version_service::{VersionService, VersionServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
