//! Version snapshot contracts and SQLite implementation.
//!
//! # Responsibility
//! - Capture immutable per-note snapshots and serve the version timeline.
//! - Restore a note's live state from any of its snapshots.
//!
//! # Invariants
//! - Version numbers are assigned as `max + 1` inside the same immediate
//!   transaction as the insert; the `UNIQUE(note_uuid, version_number)`
//!   constraint is the backstop, with one retry before surfacing a conflict.
//! - A restore first captures the pre-restore state, so restoring is itself
//!   always reversible through the timeline.
//! - Tag and category associations are snapshotted by name as JSON arrays.

use crate::db::migrations::latest_version as latest_schema_version;
use crate::db::DbError;
use crate::model::note::{NoteId, UserId};
use crate::model::version::{restore_summary, NoteVersion, VersionId, MANUAL_SNAPSHOT_SUMMARY};
use crate::repo::{category_repo, tag_repo};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const VERSION_SELECT_SQL: &str = "SELECT
    uuid,
    note_uuid,
    version_number,
    title,
    content,
    tags_snapshot,
    categories_snapshot,
    change_summary,
    created_at,
    created_by
FROM note_versions";

pub type VersionRepoResult<T> = Result<T, VersionRepoError>;

/// Errors from version snapshot operations.
#[derive(Debug)]
pub enum VersionRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Owning note does not exist for this owner.
    NoteNotFound(NoteId),
    /// Owning note is in the trash; snapshots and restores need a live note.
    NoteNotActive(NoteId),
    /// Requested version number does not exist for this note.
    VersionNotFound {
        note_uuid: NoteId,
        version_number: i64,
    },
    /// Concurrent capture took the same version number twice in a row.
    Conflict(NoteId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for VersionRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::NoteNotActive(id) => {
                write!(f, "note {id} is in the trash; restore it first")
            }
            Self::VersionNotFound {
                note_uuid,
                version_number,
            } => write!(f, "note {note_uuid} has no version {version_number}"),
            Self::Conflict(id) => {
                write!(f, "concurrent version capture conflict on note {id}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "version repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted version data: {message}")
            }
        }
    }
}

impl Error for VersionRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for VersionRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for VersionRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for the version timeline of notes.
pub trait VersionRepository {
    /// Captures a snapshot of the note's current state.
    ///
    /// `summary` defaults to the manual-snapshot marker when absent.
    fn capture_version(
        &mut self,
        user_uuid: UserId,
        note_uuid: NoteId,
        summary: Option<&str>,
    ) -> VersionRepoResult<NoteVersion>;
    /// Lists the note's snapshots, newest first.
    fn list_versions(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
    ) -> VersionRepoResult<Vec<NoteVersion>>;
    /// Gets one snapshot by its per-note number.
    fn get_version(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
        version_number: i64,
    ) -> VersionRepoResult<Option<NoteVersion>>;
    /// Gets the most recent snapshot, if any.
    fn latest_version(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
    ) -> VersionRepoResult<Option<NoteVersion>>;
    /// Counts the note's snapshots.
    fn count_versions(&self, user_uuid: UserId, note_uuid: NoteId) -> VersionRepoResult<i64>;
    /// Overwrites the live note from one snapshot.
    ///
    /// The pre-restore state is captured first and returned, so the
    /// overwritten state stays reachable through the timeline. Tags are
    /// resolved or created; categories that no longer exist for the owner
    /// are skipped silently.
    fn restore_version(
        &mut self,
        user_uuid: UserId,
        note_uuid: NoteId,
        version_number: i64,
    ) -> VersionRepoResult<NoteVersion>;
}

/// SQLite-backed version repository.
pub struct SqliteVersionRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteVersionRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> VersionRepoResult<Self> {
        ensure_version_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl VersionRepository for SqliteVersionRepository<'_> {
    fn capture_version(
        &mut self,
        user_uuid: UserId,
        note_uuid: NoteId,
        summary: Option<&str>,
    ) -> VersionRepoResult<NoteVersion> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let captured = capture_snapshot_tx(&tx, user_uuid, note_uuid, summary)?;
        tx.commit()?;
        Ok(captured)
    }

    fn list_versions(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
    ) -> VersionRepoResult<Vec<NoteVersion>> {
        require_note(self.conn, user_uuid, note_uuid)?;
        let mut stmt = self.conn.prepare(&format!(
            "{VERSION_SELECT_SQL}
             WHERE note_uuid = ?1
             ORDER BY version_number DESC;"
        ))?;
        let mut rows = stmt.query([note_uuid.to_string()])?;
        let mut versions = Vec::new();
        while let Some(row) = rows.next()? {
            versions.push(parse_version_row(row)?);
        }
        Ok(versions)
    }

    fn get_version(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
        version_number: i64,
    ) -> VersionRepoResult<Option<NoteVersion>> {
        require_note(self.conn, user_uuid, note_uuid)?;
        load_version(self.conn, note_uuid, version_number)
    }

    fn latest_version(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
    ) -> VersionRepoResult<Option<NoteVersion>> {
        require_note(self.conn, user_uuid, note_uuid)?;
        let mut stmt = self.conn.prepare(&format!(
            "{VERSION_SELECT_SQL}
             WHERE note_uuid = ?1
             ORDER BY version_number DESC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([note_uuid.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_version_row(row)?));
        }
        Ok(None)
    }

    fn count_versions(&self, user_uuid: UserId, note_uuid: NoteId) -> VersionRepoResult<i64> {
        require_note(self.conn, user_uuid, note_uuid)?;
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM note_versions WHERE note_uuid = ?1;",
            [note_uuid.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn restore_version(
        &mut self,
        user_uuid: UserId,
        note_uuid: NoteId,
        version_number: i64,
    ) -> VersionRepoResult<NoteVersion> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let owner = user_uuid.to_string();
        let note_key = note_uuid.to_string();

        let state = note_state(&tx, owner.as_str(), note_key.as_str())?
            .ok_or(VersionRepoError::NoteNotFound(note_uuid))?;
        if state.is_deleted {
            return Err(VersionRepoError::NoteNotActive(note_uuid));
        }

        let target = load_version(&tx, note_uuid, version_number)?.ok_or(
            VersionRepoError::VersionNotFound {
                note_uuid,
                version_number,
            },
        )?;

        // Back up the about-to-be-overwritten state before touching the note.
        let backup = capture_snapshot_tx(
            &tx,
            user_uuid,
            note_uuid,
            Some(restore_summary(version_number).as_str()),
        )?;

        tx.execute(
            "UPDATE notes
             SET title = ?2,
                 content = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![note_key.as_str(), target.title, target.content],
        )?;
        tag_repo::replace_note_tags_tx(&tx, note_key.as_str(), &target.tags)?;
        category_repo::replace_note_categories_tx(
            &tx,
            owner.as_str(),
            note_key.as_str(),
            &target.categories,
            false,
        )?;

        tx.commit()?;
        Ok(backup)
    }
}

struct NoteState {
    title: String,
    content: Option<String>,
    is_deleted: bool,
}

/// Captures one snapshot of the note's current persisted state inside the
/// caller's transaction. Shared with the note store so creation and edits
/// snapshot atomically with the write that triggered them.
pub(crate) fn capture_snapshot_tx(
    conn: &Connection,
    user_uuid: UserId,
    note_uuid: NoteId,
    summary: Option<&str>,
) -> VersionRepoResult<NoteVersion> {
    let owner = user_uuid.to_string();
    let note_key = note_uuid.to_string();

    let state = note_state(conn, owner.as_str(), note_key.as_str())?
        .ok_or(VersionRepoError::NoteNotFound(note_uuid))?;
    let tags = tag_repo::tag_names_for_note(conn, note_key.as_str())?;
    let categories = category_repo::category_names_for_note(conn, note_key.as_str())?;
    let tags_json = serde_json::to_string(&tags)
        .map_err(|err| VersionRepoError::InvalidData(err.to_string()))?;
    let categories_json = serde_json::to_string(&categories)
        .map_err(|err| VersionRepoError::InvalidData(err.to_string()))?;
    let summary = summary.unwrap_or(MANUAL_SNAPSHOT_SUMMARY);

    // First insert may lose a number race against a concurrent capture on
    // another connection; recompute and retry exactly once.
    for attempt in 0..2 {
        let version_number = next_version_number(conn, note_key.as_str())?;
        let version_uuid = Uuid::new_v4();
        let inserted = conn.execute(
            "INSERT INTO note_versions
                (uuid, note_uuid, version_number, title, content,
                 tags_snapshot, categories_snapshot, change_summary, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                version_uuid.to_string(),
                note_key.as_str(),
                version_number,
                state.title,
                state.content,
                tags_json.as_str(),
                categories_json.as_str(),
                summary,
                owner.as_str(),
            ],
        );
        match inserted {
            Ok(_) => {
                return load_version(conn, note_uuid, version_number)?.ok_or(
                    VersionRepoError::VersionNotFound {
                        note_uuid,
                        version_number,
                    },
                );
            }
            Err(err) if attempt == 0 && is_unique_violation(&err) => continue,
            Err(err) if is_unique_violation(&err) => {
                return Err(VersionRepoError::Conflict(note_uuid));
            }
            Err(err) => return Err(err.into()),
        }
    }
    Err(VersionRepoError::Conflict(note_uuid))
}

fn next_version_number(conn: &Connection, note_key: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(version_number), 0) + 1
         FROM note_versions
         WHERE note_uuid = ?1;",
        [note_key],
        |row| row.get(0),
    )
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn note_state(
    conn: &Connection,
    owner: &str,
    note_key: &str,
) -> VersionRepoResult<Option<NoteState>> {
    let state = conn
        .query_row(
            "SELECT title, content, is_deleted
             FROM notes
             WHERE uuid = ?1
               AND user_uuid = ?2;",
            params![note_key, owner],
            |row| {
                Ok(NoteState {
                    title: row.get(0)?,
                    content: row.get(1)?,
                    is_deleted: row.get::<_, i64>(2)? != 0,
                })
            },
        )
        .optional()?;
    Ok(state)
}

fn require_note(
    conn: &Connection,
    user_uuid: UserId,
    note_uuid: NoteId,
) -> VersionRepoResult<()> {
    if note_state(conn, user_uuid.to_string().as_str(), note_uuid.to_string().as_str())?.is_none() {
        return Err(VersionRepoError::NoteNotFound(note_uuid));
    }
    Ok(())
}

fn load_version(
    conn: &Connection,
    note_uuid: NoteId,
    version_number: i64,
) -> VersionRepoResult<Option<NoteVersion>> {
    let mut stmt = conn.prepare(&format!(
        "{VERSION_SELECT_SQL}
         WHERE note_uuid = ?1
           AND version_number = ?2;"
    ))?;
    let mut rows = stmt.query(params![note_uuid.to_string(), version_number])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_version_row(row)?));
    }
    Ok(None)
}

fn parse_version_row(row: &Row<'_>) -> VersionRepoResult<NoteVersion> {
    let uuid_text: String = row.get("uuid")?;
    let uuid: VersionId = parse_uuid(&uuid_text, "note_versions.uuid")?;
    let note_text: String = row.get("note_uuid")?;
    let note_uuid = parse_uuid(&note_text, "note_versions.note_uuid")?;
    let created_by_text: String = row.get("created_by")?;
    let created_by = parse_uuid(&created_by_text, "note_versions.created_by")?;

    let tags_json: String = row.get("tags_snapshot")?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).map_err(|_| {
        VersionRepoError::InvalidData(format!(
            "malformed tags_snapshot for version {uuid_text}"
        ))
    })?;
    let categories_json: String = row.get("categories_snapshot")?;
    let categories: Vec<String> = serde_json::from_str(&categories_json).map_err(|_| {
        VersionRepoError::InvalidData(format!(
            "malformed categories_snapshot for version {uuid_text}"
        ))
    })?;

    Ok(NoteVersion {
        uuid,
        note_uuid,
        version_number: row.get("version_number")?,
        title: row.get("title")?,
        content: row.get("content")?,
        tags,
        categories,
        change_summary: row.get("change_summary")?,
        created_at: row.get("created_at")?,
        created_by,
    })
}

fn parse_uuid(value: &str, column: &'static str) -> VersionRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| VersionRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_version_connection_ready(conn: &Connection) -> VersionRepoResult<()> {
    let expected_version = latest_schema_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(VersionRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
