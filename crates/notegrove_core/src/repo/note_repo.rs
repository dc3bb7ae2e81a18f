//! Note store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide owner-scoped note persistence with soft-delete lifecycle.
//! - Own the diff-then-snapshot update path: any content-altering change
//!   captures the pre-mutation state before the write is applied.
//!
//! # Invariants
//! - Active views are constrained to `is_deleted = 0`; trash views to
//!   `is_deleted = 1`. Wrong-owner access reads as absence.
//! - Create and update run inside one immediate transaction together with
//!   tag/category link replacement and snapshot capture.
//! - Permanent deletion is only reachable from the trash and cascades the
//!   note's version history.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::note::{Note, NoteId, NotePatch, NoteValidationError, UserId};
use crate::model::version::INITIAL_VERSION_SUMMARY;
use crate::repo::version_repo::{self, VersionRepoError};
use crate::repo::{category_repo, tag_repo};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NOTES_DEFAULT_LIMIT: u32 = 20;
const NOTES_LIMIT_MAX: u32 = 100;

/// Labels for the coarse four-field change summary.
const LABEL_TITLE: &str = "title";
const LABEL_CONTENT: &str = "content";
const LABEL_TAGS: &str = "tags";
const LABEL_CATEGORIES: &str = "categories";

pub type NoteRepoResult<T> = Result<T, NoteRepoError>;

/// Errors from note store and tag registry operations.
#[derive(Debug)]
pub enum NoteRepoError {
    /// Write-path validation failure.
    Validation(NoteValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Note does not exist for this owner (or is filtered by lifecycle state).
    NotFound(NoteId),
    /// Operation requires the note to be in the trash, but it is live.
    NotInTrash(NoteId),
    /// Version numbering lost a race twice; the transaction was abandoned.
    VersionConflict(NoteId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for NoteRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::NotInTrash(id) => write!(f, "note is not in the trash: {id}"),
            Self::VersionConflict(id) => {
                write!(f, "version numbering conflict for note: {id}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "note repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for NoteRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for NoteRepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for NoteRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for NoteRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<VersionRepoError> for NoteRepoError {
    fn from(value: VersionRepoError) -> Self {
        match value {
            VersionRepoError::NoteNotFound(id) => Self::NotFound(id),
            VersionRepoError::Conflict(id) => Self::VersionConflict(id),
            VersionRepoError::Db(err) => Self::Db(err),
            VersionRepoError::InvalidData(message) => Self::InvalidData(message),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

/// Read model for note list/detail use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    /// Stable note id.
    pub uuid: NoteId,
    /// Owning user.
    pub user_uuid: UserId,
    /// Display title.
    pub title: String,
    /// Body text (nullable).
    pub content: Option<String>,
    /// Trash state.
    pub is_deleted: bool,
    /// Epoch ms deletion timestamp, set while the note is in the trash.
    pub deleted_at: Option<i64>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
    /// Linked tag names, sorted.
    pub tags: Vec<String>,
    /// Linked category names, sorted.
    pub categories: Vec<String>,
}

/// Query options for note list use-cases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    /// `false` lists active notes, `true` lists the trash.
    pub deleted: bool,
    /// Maximum rows to return. Defaults to 20 and clamps to 100.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for note store operations.
pub trait NoteRepository {
    /// Persists one note with its tag/category names and records version 1.
    fn create_note(
        &mut self,
        note: &Note,
        tag_names: &[String],
        category_names: &[String],
    ) -> NoteRepoResult<NoteRecord>;
    /// Gets one note by id, owner-scoped.
    fn get_note(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
        include_deleted: bool,
    ) -> NoteRepoResult<Option<NoteRecord>>;
    /// Lists one partition (active or trash) of the owner's notes.
    fn list_notes(&self, user_uuid: UserId, query: &NoteListQuery)
        -> NoteRepoResult<Vec<NoteRecord>>;
    /// Applies a partial update, snapshotting the pre-update state first.
    fn update_note(
        &mut self,
        user_uuid: UserId,
        note_uuid: NoteId,
        patch: &NotePatch,
    ) -> NoteRepoResult<NoteRecord>;
    /// Moves one live note to the trash. Lifecycle-only, no snapshot.
    fn soft_delete_note(&self, user_uuid: UserId, note_uuid: NoteId) -> NoteRepoResult<()>;
    /// Brings one trashed note back to the active set.
    fn restore_from_trash(&self, user_uuid: UserId, note_uuid: NoteId) -> NoteRepoResult<()>;
    /// Destroys one trashed note and all its version snapshots.
    fn purge_note(&mut self, user_uuid: UserId, note_uuid: NoteId) -> NoteRepoResult<()>;
    /// Destroys every trashed note for the owner; returns how many were purged.
    fn purge_trash(&mut self, user_uuid: UserId) -> NoteRepoResult<u64>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> NoteRepoResult<Self> {
        ensure_note_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(
        &mut self,
        note: &Note,
        tag_names: &[String],
        category_names: &[String],
    ) -> NoteRepoResult<NoteRecord> {
        note.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let note_uuid = note.uuid.to_string();
        let user_uuid = note.user_uuid.to_string();

        tx.execute(
            "INSERT INTO notes (uuid, user_uuid, title, content, is_deleted)
             VALUES (?1, ?2, ?3, ?4, 0);",
            params![
                note_uuid.as_str(),
                user_uuid.as_str(),
                note.title.as_str(),
                note.content.as_deref(),
            ],
        )?;

        tag_repo::replace_note_tags_tx(&tx, note_uuid.as_str(), tag_names)?;
        category_repo::replace_note_categories_tx(
            &tx,
            user_uuid.as_str(),
            note_uuid.as_str(),
            category_names,
            true,
        )?;

        version_repo::capture_snapshot_tx(
            &tx,
            note.user_uuid,
            note.uuid,
            Some(INITIAL_VERSION_SUMMARY),
        )?;

        let record = load_required_record(&tx, note.user_uuid, note.uuid, false)?;
        tx.commit()?;
        Ok(record)
    }

    fn get_note(
        &self,
        user_uuid: UserId,
        note_uuid: NoteId,
        include_deleted: bool,
    ) -> NoteRepoResult<Option<NoteRecord>> {
        load_record(self.conn, user_uuid, note_uuid, include_deleted)
    }

    fn list_notes(
        &self,
        user_uuid: UserId,
        query: &NoteListQuery,
    ) -> NoteRepoResult<Vec<NoteRecord>> {
        let mut sql = String::from(
            "SELECT uuid, user_uuid, title, content, is_deleted, deleted_at,
                    created_at, updated_at
             FROM notes
             WHERE user_uuid = ?",
        );
        let mut bind_values: Vec<Value> = vec![Value::Text(user_uuid.to_string())];

        if query.deleted {
            sql.push_str(" AND is_deleted = 1 ORDER BY deleted_at DESC, uuid ASC");
        } else {
            sql.push_str(" AND is_deleted = 0 ORDER BY updated_at DESC, uuid ASC");
        }

        let limit = normalize_note_limit(query.limit);
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = parse_note_row(row)?;
            attach_associations(self.conn, &mut record)?;
            records.push(record);
        }
        Ok(records)
    }

    fn update_note(
        &mut self,
        user_uuid: UserId,
        note_uuid: NoteId,
        patch: &NotePatch,
    ) -> NoteRepoResult<NoteRecord> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = load_record(&tx, user_uuid, note_uuid, false)?
            .ok_or(NoteRepoError::NotFound(note_uuid))?;

        let changed_labels = diff_labels(&current, patch);
        if !changed_labels.is_empty() {
            let summary = format!("updated {}", changed_labels.join(", "));
            version_repo::capture_snapshot_tx(&tx, user_uuid, note_uuid, Some(&summary))?;
        }

        let note_key = note_uuid.to_string();
        let next_title = patch.title.as_deref().unwrap_or(current.title.as_str());
        let next_content = patch
            .content
            .as_deref()
            .or(current.content.as_deref());
        tx.execute(
            "UPDATE notes
             SET title = ?2,
                 content = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![note_key.as_str(), next_title, next_content],
        )?;

        if let Some(tags) = &patch.tags {
            tag_repo::replace_note_tags_tx(&tx, note_key.as_str(), tags)?;
        }
        if let Some(categories) = &patch.categories {
            category_repo::replace_note_categories_tx(
                &tx,
                user_uuid.to_string().as_str(),
                note_key.as_str(),
                categories,
                true,
            )?;
        }

        let record = load_required_record(&tx, user_uuid, note_uuid, false)?;
        tx.commit()?;
        Ok(record)
    }

    fn soft_delete_note(&self, user_uuid: UserId, note_uuid: NoteId) -> NoteRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET is_deleted = 1,
                 deleted_at = (strftime('%s', 'now') * 1000),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND user_uuid = ?2
               AND is_deleted = 0;",
            params![note_uuid.to_string(), user_uuid.to_string()],
        )?;
        if changed == 0 {
            return Err(NoteRepoError::NotFound(note_uuid));
        }
        Ok(())
    }

    fn restore_from_trash(&self, user_uuid: UserId, note_uuid: NoteId) -> NoteRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET is_deleted = 0,
                 deleted_at = NULL,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND user_uuid = ?2
               AND is_deleted = 1;",
            params![note_uuid.to_string(), user_uuid.to_string()],
        )?;
        if changed == 0 {
            if note_exists(self.conn, user_uuid, note_uuid)? {
                return Err(NoteRepoError::NotInTrash(note_uuid));
            }
            return Err(NoteRepoError::NotFound(note_uuid));
        }
        Ok(())
    }

    fn purge_note(&mut self, user_uuid: UserId, note_uuid: NoteId) -> NoteRepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let note_key = note_uuid.to_string();
        let is_deleted: Option<i64> = {
            let mut stmt = tx.prepare(
                "SELECT is_deleted FROM notes WHERE uuid = ?1 AND user_uuid = ?2;",
            )?;
            let mut rows = stmt.query(params![note_key.as_str(), user_uuid.to_string()])?;
            match rows.next()? {
                Some(row) => Some(row.get(0)?),
                None => None,
            }
        };
        match is_deleted {
            None => return Err(NoteRepoError::NotFound(note_uuid)),
            Some(0) => return Err(NoteRepoError::NotInTrash(note_uuid)),
            Some(_) => {}
        }

        tx.execute(
            "DELETE FROM note_versions WHERE note_uuid = ?1;",
            [note_key.as_str()],
        )?;
        tx.execute("DELETE FROM notes WHERE uuid = ?1;", [note_key.as_str()])?;

        tx.commit()?;
        Ok(())
    }

    fn purge_trash(&mut self, user_uuid: UserId) -> NoteRepoResult<u64> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let owner = user_uuid.to_string();

        tx.execute(
            "DELETE FROM note_versions
             WHERE note_uuid IN (
                SELECT uuid FROM notes WHERE user_uuid = ?1 AND is_deleted = 1
             );",
            [owner.as_str()],
        )?;
        let purged = tx.execute(
            "DELETE FROM notes WHERE user_uuid = ?1 AND is_deleted = 1;",
            [owner.as_str()],
        )?;

        tx.commit()?;
        Ok(purged as u64)
    }
}

/// Normalizes list limit according to the notes contract.
pub fn normalize_note_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => NOTES_DEFAULT_LIMIT,
        Some(value) if value > NOTES_LIMIT_MAX => NOTES_LIMIT_MAX,
        Some(value) => value,
        None => NOTES_DEFAULT_LIMIT,
    }
}

/// Computes which of the four coarse fields a patch would change.
///
/// Tag and category lists are compared as sets; order and duplicates do not
/// count as a change. Label order is fixed so summaries are deterministic.
fn diff_labels(current: &NoteRecord, patch: &NotePatch) -> Vec<&'static str> {
    let mut labels = Vec::new();

    if let Some(title) = &patch.title {
        if *title != current.title {
            labels.push(LABEL_TITLE);
        }
    }
    if let Some(content) = &patch.content {
        if Some(content.as_str()) != current.content.as_deref() {
            labels.push(LABEL_CONTENT);
        }
    }
    if let Some(tags) = &patch.tags {
        if name_set(tags) != name_set(&current.tags) {
            labels.push(LABEL_TAGS);
        }
    }
    if let Some(categories) = &patch.categories {
        if name_set(categories) != name_set(&current.categories) {
            labels.push(LABEL_CATEGORIES);
        }
    }

    labels
}

fn name_set(names: &[String]) -> BTreeSet<&str> {
    names.iter().map(String::as_str).collect()
}

pub(crate) fn load_record(
    conn: &Connection,
    user_uuid: UserId,
    note_uuid: NoteId,
    include_deleted: bool,
) -> NoteRepoResult<Option<NoteRecord>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, user_uuid, title, content, is_deleted, deleted_at,
                created_at, updated_at
         FROM notes
         WHERE uuid = ?1
           AND user_uuid = ?2
           AND (?3 = 1 OR is_deleted = 0);",
    )?;
    let mut rows = stmt.query(params![
        note_uuid.to_string(),
        user_uuid.to_string(),
        i64::from(include_deleted),
    ])?;

    if let Some(row) = rows.next()? {
        let mut record = parse_note_row(row)?;
        attach_associations(conn, &mut record)?;
        return Ok(Some(record));
    }
    Ok(None)
}

fn load_required_record(
    conn: &Connection,
    user_uuid: UserId,
    note_uuid: NoteId,
    include_deleted: bool,
) -> NoteRepoResult<NoteRecord> {
    load_record(conn, user_uuid, note_uuid, include_deleted)?
        .ok_or(NoteRepoError::NotFound(note_uuid))
}

fn attach_associations(conn: &Connection, record: &mut NoteRecord) -> NoteRepoResult<()> {
    let note_key = record.uuid.to_string();
    record.tags = tag_repo::tag_names_for_note(conn, note_key.as_str())?;
    record.categories = category_repo::category_names_for_note(conn, note_key.as_str())?;
    Ok(())
}

fn note_exists(
    conn: &Connection,
    user_uuid: UserId,
    note_uuid: NoteId,
) -> NoteRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM notes WHERE uuid = ?1 AND user_uuid = ?2
        );",
        params![note_uuid.to_string(), user_uuid.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_note_row(row: &Row<'_>) -> NoteRepoResult<NoteRecord> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "notes.uuid")?;
    let user_text: String = row.get("user_uuid")?;
    let user_uuid = parse_uuid(&user_text, "notes.user_uuid")?;

    let is_deleted = match row.get::<_, i64>("is_deleted")? {
        0 => false,
        1 => true,
        other => {
            return Err(NoteRepoError::InvalidData(format!(
                "invalid is_deleted value `{other}` in notes.is_deleted"
            )));
        }
    };

    Ok(NoteRecord {
        uuid,
        user_uuid,
        title: row.get("title")?,
        content: row.get("content")?,
        is_deleted,
        deleted_at: row.get("deleted_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        tags: Vec::new(),
        categories: Vec::new(),
    })
}

fn parse_uuid(value: &str, column: &'static str) -> NoteRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| NoteRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_note_connection_ready(conn: &Connection) -> NoteRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(NoteRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{diff_labels, normalize_note_limit, NoteRecord};
    use crate::model::note::NotePatch;
    use uuid::Uuid;

    fn record_with(title: &str, content: Option<&str>, tags: &[&str]) -> NoteRecord {
        NoteRecord {
            uuid: Uuid::new_v4(),
            user_uuid: Uuid::new_v4(),
            title: title.to_string(),
            content: content.map(str::to_string),
            is_deleted: false,
            deleted_at: None,
            created_at: 0,
            updated_at: 0,
            tags: tags.iter().map(|s| s.to_string()).collect(),
            categories: Vec::new(),
        }
    }

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(normalize_note_limit(None), 20);
        assert_eq!(normalize_note_limit(Some(0)), 20);
        assert_eq!(normalize_note_limit(Some(30)), 30);
        assert_eq!(normalize_note_limit(Some(10_000)), 100);
    }

    #[test]
    fn diff_labels_keeps_fixed_order() {
        let current = record_with("a", Some("body"), &["x"]);
        let patch = NotePatch {
            title: Some("b".to_string()),
            content: Some("other".to_string()),
            tags: Some(vec!["y".to_string()]),
            categories: Some(vec!["c".to_string()]),
        };
        assert_eq!(
            diff_labels(&current, &patch),
            vec!["title", "content", "tags", "categories"]
        );
    }

    #[test]
    fn diff_labels_ignores_tag_order_and_duplicates() {
        let current = record_with("a", None, &["x", "y"]);
        let patch = NotePatch {
            tags: Some(vec!["y".to_string(), "x".to_string(), "x".to_string()]),
            ..NotePatch::default()
        };
        assert!(diff_labels(&current, &patch).is_empty());
    }

    #[test]
    fn diff_labels_empty_patch_changes_nothing() {
        let current = record_with("a", Some("body"), &[]);
        assert!(diff_labels(&current, &NotePatch::default()).is_empty());
    }
}
