//! Tag registry contracts and SQLite implementation.
//!
//! # Responsibility
//! - Resolve tag names to rows, creating missing tags lazily.
//! - Own tag-link replacement helpers used inside note/version transactions.
//!
//! # Invariants
//! - Tag names are globally unique and matched case-sensitively; repeated
//!   `resolve_or_create` calls with the same name never create duplicates.
//! - Tags are never deleted by this core; unused rows simply stay behind.

use crate::model::note::UserId;
use crate::repo::note_repo::NoteRepoResult;
use rusqlite::Connection;

/// Tag usage read model for per-owner listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUsage {
    /// Exact tag name as stored.
    pub name: String,
    /// Number of the owner's active notes carrying this tag.
    pub note_count: i64,
}

/// Registry interface for tag operations.
pub trait TagRegistry {
    /// Resolves a tag name to its row id, creating the tag when absent.
    fn resolve_or_create(&self, name: &str) -> NoteRepoResult<i64>;
    /// Lists tags used by the owner's active notes with usage counts.
    fn list_for_user(&self, user_uuid: UserId) -> NoteRepoResult<Vec<TagUsage>>;
}

/// SQLite-backed tag registry.
pub struct SqliteTagRegistry<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagRegistry<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TagRegistry for SqliteTagRegistry<'_> {
    fn resolve_or_create(&self, name: &str) -> NoteRepoResult<i64> {
        Ok(resolve_or_create_tag_tx(self.conn, name)?)
    }

    fn list_for_user(&self, user_uuid: UserId) -> NoteRepoResult<Vec<TagUsage>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.name, COUNT(nt.note_uuid) AS note_count
             FROM tags t
             INNER JOIN note_tags nt ON nt.tag_id = t.id
             INNER JOIN notes n ON n.uuid = nt.note_uuid
             WHERE n.user_uuid = ?1
               AND n.is_deleted = 0
             GROUP BY t.id, t.name
             ORDER BY t.name ASC;",
        )?;
        let mut rows = stmt.query([user_uuid.to_string()])?;
        let mut usages = Vec::new();
        while let Some(row) = rows.next()? {
            usages.push(TagUsage {
                name: row.get("name")?,
                note_count: row.get("note_count")?,
            });
        }
        Ok(usages)
    }
}

/// Resolves one tag name to its id inside the caller's transaction scope.
///
/// `INSERT OR IGNORE` keeps the operation idempotent under the global
/// unique-name constraint; the follow-up lookup is exact (case-sensitive).
pub(crate) fn resolve_or_create_tag_tx(conn: &Connection, name: &str) -> rusqlite::Result<i64> {
    conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1);", [name])?;
    conn.query_row("SELECT id FROM tags WHERE name = ?1;", [name], |row| {
        row.get(0)
    })
}

/// Replaces the full tag-link set of one note inside the caller's transaction.
pub(crate) fn replace_note_tags_tx(
    conn: &Connection,
    note_uuid: &str,
    names: &[String],
) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM note_tags WHERE note_uuid = ?1;", [note_uuid])?;
    for name in names {
        let tag_id = resolve_or_create_tag_tx(conn, name)?;
        conn.execute(
            "INSERT OR IGNORE INTO note_tags (note_uuid, tag_id) VALUES (?1, ?2);",
            rusqlite::params![note_uuid, tag_id],
        )?;
    }
    Ok(())
}

/// Loads the ordered tag names linked to one note.
pub(crate) fn tag_names_for_note(
    conn: &Connection,
    note_uuid: &str,
) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM note_tags nt
         INNER JOIN tags t ON t.id = nt.tag_id
         WHERE nt.note_uuid = ?1
         ORDER BY t.name ASC;",
    )?;
    let mut rows = stmt.query([note_uuid])?;
    let mut names = Vec::new();
    while let Some(row) = rows.next()? {
        names.push(row.get(0)?);
    }
    Ok(names)
}
