//! Category tree contracts and SQLite implementation.
//!
//! # Responsibility
//! - Maintain the per-owner category forest with parent/child links.
//! - Enforce sibling-name uniqueness and cycle-free parent chains inside the
//!   same transaction as the structural write they guard.
//!
//! # Invariants
//! - `(user_uuid, parent_uuid, name)` is unique among siblings; the check is
//!   procedural because SQLite treats NULL parents as distinct in the index.
//! - Ancestor walks are depth-bounded; exceeding the bound means the stored
//!   tree is corrupt and the operation fails instead of looping.
//! - A category is deletable only with zero children and zero linked notes.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::category::{
    validate_color, Category, CategoryAttrsPatch, CategoryDraft, CategoryId,
    CategoryValidationError, DEFAULT_CATEGORY_COLOR,
};
use crate::model::note::UserId;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Upper bound for parent-chain walks. A well-formed tree never gets close;
/// hitting the bound indicates cyclic data written by something else.
const MAX_ANCESTOR_DEPTH: usize = 64;

const CATEGORY_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    name,
    description,
    color,
    icon,
    parent_uuid,
    created_at,
    updated_at
FROM categories";

pub type CategoryRepoResult<T> = Result<T, CategoryRepoError>;

/// Errors from category tree operations.
#[derive(Debug)]
pub enum CategoryRepoError {
    /// Write-path validation failure.
    Validation(CategoryValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Category does not exist for this owner.
    NotFound(CategoryId),
    /// Requested parent does not exist for this owner.
    ParentNotFound(CategoryId),
    /// A sibling with the same name already exists under this parent.
    DuplicateSibling {
        name: String,
        parent_uuid: Option<CategoryId>,
    },
    /// Reparenting would make the node its own ancestor.
    CycleDetected(CategoryId),
    /// Category still has child categories.
    HasChildren(CategoryId),
    /// Category is still referenced by the owner's notes.
    HasAssociatedNotes {
        category_uuid: CategoryId,
        note_count: i64,
    },
    /// Parent chain exceeded the walk bound; stored tree is cyclic.
    TreeCorrupted(CategoryId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for CategoryRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "category not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent category not found: {id}"),
            Self::DuplicateSibling { name, parent_uuid } => match parent_uuid {
                Some(parent) => write!(
                    f,
                    "category `{name}` already exists under parent {parent}"
                ),
                None => write!(f, "root category `{name}` already exists"),
            },
            Self::CycleDetected(id) => {
                write!(f, "reparenting category {id} would create a cycle")
            }
            Self::HasChildren(id) => {
                write!(f, "category {id} still has child categories")
            }
            Self::HasAssociatedNotes {
                category_uuid,
                note_count,
            } => write!(
                f,
                "category {category_uuid} is still referenced by {note_count} note(s)"
            ),
            Self::TreeCorrupted(id) => write!(
                f,
                "parent chain of category {id} exceeds depth bound; tree is corrupt"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "category repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted category data: {message}")
            }
        }
    }
}

impl Error for CategoryRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CategoryValidationError> for CategoryRepoError {
    fn from(value: CategoryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for CategoryRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CategoryRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for category tree operations.
pub trait CategoryRepository {
    /// Creates one category, enforcing sibling uniqueness and parent ownership.
    fn create_category(
        &mut self,
        user_uuid: UserId,
        draft: &CategoryDraft,
    ) -> CategoryRepoResult<Category>;
    /// Gets one category by id, owner-scoped.
    fn get_category(
        &self,
        user_uuid: UserId,
        category_uuid: CategoryId,
    ) -> CategoryRepoResult<Option<Category>>;
    /// Lists the owner's whole forest, sorted by name.
    fn list_categories(&self, user_uuid: UserId) -> CategoryRepoResult<Vec<Category>>;
    /// Lists direct children under one parent (`None` lists roots).
    fn list_children(
        &self,
        user_uuid: UserId,
        parent_uuid: Option<CategoryId>,
    ) -> CategoryRepoResult<Vec<Category>>;
    /// Renames one category, re-checking sibling uniqueness.
    fn rename_category(
        &mut self,
        user_uuid: UserId,
        category_uuid: CategoryId,
        new_name: &str,
    ) -> CategoryRepoResult<Category>;
    /// Updates description/color/icon attributes.
    fn update_category_attrs(
        &mut self,
        user_uuid: UserId,
        category_uuid: CategoryId,
        patch: &CategoryAttrsPatch,
    ) -> CategoryRepoResult<Category>;
    /// Moves one category under a new parent (or to root), rejecting cycles.
    fn reparent_category(
        &mut self,
        user_uuid: UserId,
        category_uuid: CategoryId,
        new_parent_uuid: Option<CategoryId>,
    ) -> CategoryRepoResult<Category>;
    /// Deletes one category with zero children and zero note links.
    fn delete_category(
        &mut self,
        user_uuid: UserId,
        category_uuid: CategoryId,
    ) -> CategoryRepoResult<()>;
    /// Returns ancestor names from root down to the category itself.
    fn category_path(
        &self,
        user_uuid: UserId,
        category_uuid: CategoryId,
    ) -> CategoryRepoResult<Vec<String>>;
    /// Returns all transitive children, depth-first.
    fn category_descendants(
        &self,
        user_uuid: UserId,
        category_uuid: CategoryId,
    ) -> CategoryRepoResult<Vec<Category>>;
    /// Counts the owner's notes linked to this category (trash included).
    fn note_count(
        &self,
        user_uuid: UserId,
        category_uuid: CategoryId,
    ) -> CategoryRepoResult<i64>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> CategoryRepoResult<Self> {
        ensure_category_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn create_category(
        &mut self,
        user_uuid: UserId,
        draft: &CategoryDraft,
    ) -> CategoryRepoResult<Category> {
        draft.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let owner = user_uuid.to_string();
        let name = draft.name.trim();

        if let Some(parent_uuid) = draft.parent_uuid {
            if load_category_tx(&tx, owner.as_str(), parent_uuid)?.is_none() {
                return Err(CategoryRepoError::ParentNotFound(parent_uuid));
            }
        }
        ensure_sibling_name_free(&tx, owner.as_str(), draft.parent_uuid, name, None)?;

        let category_uuid = Uuid::new_v4();
        tx.execute(
            "INSERT INTO categories (uuid, user_uuid, name, description, color, icon, parent_uuid)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                category_uuid.to_string(),
                owner.as_str(),
                name,
                draft.description.as_deref(),
                draft.color.as_str(),
                draft.icon.as_deref(),
                draft.parent_uuid.map(|value| value.to_string()),
            ],
        )?;

        let created = load_required_category_tx(&tx, owner.as_str(), category_uuid)?;
        tx.commit()?;
        Ok(created)
    }

    fn get_category(
        &self,
        user_uuid: UserId,
        category_uuid: CategoryId,
    ) -> CategoryRepoResult<Option<Category>> {
        load_category_tx(self.conn, user_uuid.to_string().as_str(), category_uuid)
    }

    fn list_categories(&self, user_uuid: UserId) -> CategoryRepoResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT_SQL}
             WHERE user_uuid = ?1
             ORDER BY name ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([user_uuid.to_string()])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }

    fn list_children(
        &self,
        user_uuid: UserId,
        parent_uuid: Option<CategoryId>,
    ) -> CategoryRepoResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT_SQL}
             WHERE user_uuid = ?1
               AND parent_uuid IS ?2
             ORDER BY name ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query(params![
            user_uuid.to_string(),
            parent_uuid.map(|value| value.to_string()),
        ])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }

    fn rename_category(
        &mut self,
        user_uuid: UserId,
        category_uuid: CategoryId,
        new_name: &str,
    ) -> CategoryRepoResult<Category> {
        let name = new_name.trim();
        if name.is_empty() {
            return Err(CategoryValidationError::EmptyName.into());
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let owner = user_uuid.to_string();

        let current = load_category_tx(&tx, owner.as_str(), category_uuid)?
            .ok_or(CategoryRepoError::NotFound(category_uuid))?;
        ensure_sibling_name_free(
            &tx,
            owner.as_str(),
            current.parent_uuid,
            name,
            Some(category_uuid),
        )?;

        tx.execute(
            "UPDATE categories
             SET name = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![category_uuid.to_string(), name],
        )?;

        let renamed = load_required_category_tx(&tx, owner.as_str(), category_uuid)?;
        tx.commit()?;
        Ok(renamed)
    }

    fn update_category_attrs(
        &mut self,
        user_uuid: UserId,
        category_uuid: CategoryId,
        patch: &CategoryAttrsPatch,
    ) -> CategoryRepoResult<Category> {
        if let Some(color) = patch.color.as_deref() {
            validate_color(color)?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let owner = user_uuid.to_string();

        let current = load_category_tx(&tx, owner.as_str(), category_uuid)?
            .ok_or(CategoryRepoError::NotFound(category_uuid))?;

        let next_description = patch
            .description
            .as_deref()
            .or(current.description.as_deref());
        let next_color = patch.color.as_deref().unwrap_or(current.color.as_str());
        let next_icon = patch.icon.as_deref().or(current.icon.as_deref());

        tx.execute(
            "UPDATE categories
             SET description = ?2,
                 color = ?3,
                 icon = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                category_uuid.to_string(),
                next_description,
                next_color,
                next_icon
            ],
        )?;

        let updated = load_required_category_tx(&tx, owner.as_str(), category_uuid)?;
        tx.commit()?;
        Ok(updated)
    }

    fn reparent_category(
        &mut self,
        user_uuid: UserId,
        category_uuid: CategoryId,
        new_parent_uuid: Option<CategoryId>,
    ) -> CategoryRepoResult<Category> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let owner = user_uuid.to_string();

        let current = load_category_tx(&tx, owner.as_str(), category_uuid)?
            .ok_or(CategoryRepoError::NotFound(category_uuid))?;

        if let Some(parent_uuid) = new_parent_uuid {
            let parent = load_category_tx(&tx, owner.as_str(), parent_uuid)?
                .ok_or(CategoryRepoError::ParentNotFound(parent_uuid))?;
            ensure_no_cycle(&tx, owner.as_str(), category_uuid, &parent)?;
        }
        ensure_sibling_name_free(
            &tx,
            owner.as_str(),
            new_parent_uuid,
            current.name.as_str(),
            Some(category_uuid),
        )?;

        tx.execute(
            "UPDATE categories
             SET parent_uuid = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                category_uuid.to_string(),
                new_parent_uuid.map(|value| value.to_string()),
            ],
        )?;

        let moved = load_required_category_tx(&tx, owner.as_str(), category_uuid)?;
        tx.commit()?;
        Ok(moved)
    }

    fn delete_category(
        &mut self,
        user_uuid: UserId,
        category_uuid: CategoryId,
    ) -> CategoryRepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let owner = user_uuid.to_string();
        let key = category_uuid.to_string();

        if load_category_tx(&tx, owner.as_str(), category_uuid)?.is_none() {
            return Err(CategoryRepoError::NotFound(category_uuid));
        }

        let child_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM categories WHERE parent_uuid = ?1;",
            [key.as_str()],
            |row| row.get(0),
        )?;
        if child_count > 0 {
            return Err(CategoryRepoError::HasChildren(category_uuid));
        }

        let note_count = linked_note_count(&tx, owner.as_str(), key.as_str())?;
        if note_count > 0 {
            return Err(CategoryRepoError::HasAssociatedNotes {
                category_uuid,
                note_count,
            });
        }

        tx.execute("DELETE FROM categories WHERE uuid = ?1;", [key.as_str()])?;
        tx.commit()?;
        Ok(())
    }

    fn category_path(
        &self,
        user_uuid: UserId,
        category_uuid: CategoryId,
    ) -> CategoryRepoResult<Vec<String>> {
        let owner = user_uuid.to_string();
        let start = load_category_tx(self.conn, owner.as_str(), category_uuid)?
            .ok_or(CategoryRepoError::NotFound(category_uuid))?;

        let mut path = vec![start.name];
        let mut cursor = start.parent_uuid;
        for _ in 0..MAX_ANCESTOR_DEPTH {
            let Some(parent_uuid) = cursor else {
                return Ok(path);
            };
            let parent = load_category_tx(self.conn, owner.as_str(), parent_uuid)?.ok_or_else(
                || {
                    CategoryRepoError::InvalidData(format!(
                        "dangling parent reference `{parent_uuid}` in categories.parent_uuid"
                    ))
                },
            )?;
            path.insert(0, parent.name);
            cursor = parent.parent_uuid;
        }
        Err(CategoryRepoError::TreeCorrupted(category_uuid))
    }

    fn category_descendants(
        &self,
        user_uuid: UserId,
        category_uuid: CategoryId,
    ) -> CategoryRepoResult<Vec<Category>> {
        let owner = user_uuid.to_string();
        if load_category_tx(self.conn, owner.as_str(), category_uuid)?.is_none() {
            return Err(CategoryRepoError::NotFound(category_uuid));
        }

        // Depth-first with a visited set: a corrupt (cyclic) tree must fail
        // instead of recursing forever.
        let mut visited: HashSet<CategoryId> = HashSet::new();
        visited.insert(category_uuid);
        let mut result = Vec::new();
        let mut stack = vec![category_uuid];
        while let Some(current) = stack.pop() {
            let children = self.list_children(user_uuid, Some(current))?;
            for child in children {
                if !visited.insert(child.uuid) {
                    return Err(CategoryRepoError::TreeCorrupted(category_uuid));
                }
                stack.push(child.uuid);
                result.push(child);
            }
        }
        Ok(result)
    }

    fn note_count(
        &self,
        user_uuid: UserId,
        category_uuid: CategoryId,
    ) -> CategoryRepoResult<i64> {
        let owner = user_uuid.to_string();
        if load_category_tx(self.conn, owner.as_str(), category_uuid)?.is_none() {
            return Err(CategoryRepoError::NotFound(category_uuid));
        }
        linked_note_count(self.conn, owner.as_str(), category_uuid.to_string().as_str())
    }
}

/// Walks from the proposed parent upward and rejects when the node itself is
/// encountered. Covers the degenerate `reparent(A, A)` case as well.
fn ensure_no_cycle(
    conn: &Connection,
    owner: &str,
    node_uuid: CategoryId,
    proposed_parent: &Category,
) -> CategoryRepoResult<()> {
    if proposed_parent.uuid == node_uuid {
        return Err(CategoryRepoError::CycleDetected(node_uuid));
    }

    let mut cursor = proposed_parent.parent_uuid;
    for _ in 0..MAX_ANCESTOR_DEPTH {
        let Some(ancestor_uuid) = cursor else {
            return Ok(());
        };
        if ancestor_uuid == node_uuid {
            return Err(CategoryRepoError::CycleDetected(node_uuid));
        }
        let ancestor = load_category_tx(conn, owner, ancestor_uuid)?.ok_or_else(|| {
            CategoryRepoError::InvalidData(format!(
                "dangling parent reference `{ancestor_uuid}` in categories.parent_uuid"
            ))
        })?;
        cursor = ancestor.parent_uuid;
    }
    Err(CategoryRepoError::TreeCorrupted(node_uuid))
}

fn ensure_sibling_name_free(
    conn: &Connection,
    owner: &str,
    parent_uuid: Option<CategoryId>,
    name: &str,
    exclude_uuid: Option<CategoryId>,
) -> CategoryRepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM categories
            WHERE user_uuid = ?1
              AND parent_uuid IS ?2
              AND name = ?3
              AND (?4 IS NULL OR uuid != ?4)
        );",
        params![
            owner,
            parent_uuid.map(|value| value.to_string()),
            name,
            exclude_uuid.map(|value| value.to_string()),
        ],
        |row| row.get(0),
    )?;
    if exists == 1 {
        return Err(CategoryRepoError::DuplicateSibling {
            name: name.to_string(),
            parent_uuid,
        });
    }
    Ok(())
}

fn linked_note_count(conn: &Connection, owner: &str, category_key: &str) -> CategoryRepoResult<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM note_categories nc
         INNER JOIN notes n ON n.uuid = nc.note_uuid
         WHERE nc.category_uuid = ?1
           AND n.user_uuid = ?2;",
        params![category_key, owner],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn load_category_tx(
    conn: &Connection,
    owner: &str,
    category_uuid: CategoryId,
) -> CategoryRepoResult<Option<Category>> {
    let mut stmt = conn.prepare(&format!(
        "{CATEGORY_SELECT_SQL}
         WHERE uuid = ?1
           AND user_uuid = ?2;"
    ))?;
    let mut rows = stmt.query(params![category_uuid.to_string(), owner])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_category_row(row)?));
    }
    Ok(None)
}

fn load_required_category_tx(
    conn: &Connection,
    owner: &str,
    category_uuid: CategoryId,
) -> CategoryRepoResult<Category> {
    load_category_tx(conn, owner, category_uuid)?
        .ok_or(CategoryRepoError::NotFound(category_uuid))
}

/// Finds the owner's first category with this exact name, regardless of its
/// position in the tree. Deterministic: oldest row wins.
pub(crate) fn find_category_by_name_tx(
    conn: &Connection,
    owner: &str,
    name: &str,
) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT uuid
         FROM categories
         WHERE user_uuid = ?1
           AND name = ?2
         ORDER BY created_at ASC, uuid ASC
         LIMIT 1;",
        params![owner, name],
        |row| row.get(0),
    )
    .optional()
}

/// Resolves one category name for the owner, creating a root-level category
/// with default attributes when absent.
pub(crate) fn resolve_or_create_category_tx(
    conn: &Connection,
    owner: &str,
    name: &str,
) -> rusqlite::Result<String> {
    if let Some(uuid) = find_category_by_name_tx(conn, owner, name)? {
        return Ok(uuid);
    }
    let category_uuid = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO categories (uuid, user_uuid, name, color)
         VALUES (?1, ?2, ?3, ?4);",
        params![category_uuid.as_str(), owner, name, DEFAULT_CATEGORY_COLOR],
    )?;
    Ok(category_uuid)
}

/// Replaces the full category-link set of one note inside the caller's
/// transaction. With `create_missing` unset, unknown names are skipped
/// (the restore path never fabricates categories).
pub(crate) fn replace_note_categories_tx(
    conn: &Connection,
    owner: &str,
    note_uuid: &str,
    names: &[String],
    create_missing: bool,
) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM note_categories WHERE note_uuid = ?1;",
        [note_uuid],
    )?;
    for name in names {
        let category_uuid = if create_missing {
            Some(resolve_or_create_category_tx(conn, owner, name)?)
        } else {
            find_category_by_name_tx(conn, owner, name)?
        };
        if let Some(category_uuid) = category_uuid {
            conn.execute(
                "INSERT OR IGNORE INTO note_categories (note_uuid, category_uuid)
                 VALUES (?1, ?2);",
                params![note_uuid, category_uuid.as_str()],
            )?;
        }
    }
    Ok(())
}

/// Loads the ordered category names linked to one note.
pub(crate) fn category_names_for_note(
    conn: &Connection,
    note_uuid: &str,
) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT c.name
         FROM note_categories nc
         INNER JOIN categories c ON c.uuid = nc.category_uuid
         WHERE nc.note_uuid = ?1
         ORDER BY c.name ASC;",
    )?;
    let mut rows = stmt.query([note_uuid])?;
    let mut names = Vec::new();
    while let Some(row) = rows.next()? {
        names.push(row.get(0)?);
    }
    Ok(names)
}

fn parse_category_row(row: &Row<'_>) -> CategoryRepoResult<Category> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "categories.uuid")?;
    let user_text: String = row.get("user_uuid")?;
    let user_uuid = parse_uuid(&user_text, "categories.user_uuid")?;
    let parent_uuid = row
        .get::<_, Option<String>>("parent_uuid")?
        .map(|value| parse_uuid(&value, "categories.parent_uuid"))
        .transpose()?;

    Ok(Category {
        uuid,
        user_uuid,
        name: row.get("name")?,
        description: row.get("description")?,
        color: row.get("color")?,
        icon: row.get("icon")?,
        parent_uuid,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_uuid(value: &str, column: &'static str) -> CategoryRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| CategoryRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_category_connection_ready(conn: &Connection) -> CategoryRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(CategoryRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
