//! Category domain model.
//!
//! # Responsibility
//! - Define the hierarchical category record and its creation draft.
//! - Validate category names and display colors.
//!
//! # Invariants
//! - `(user_uuid, parent_uuid, name)` must stay unique among siblings.
//! - The parent chain must never contain the node itself; cycle safety is
//!   enforced procedurally in the repository, not by this type.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use crate::model::note::UserId;

/// Stable identifier for a category.
pub type CategoryId = Uuid;

/// Display color assigned to new categories when none is provided.
pub const DEFAULT_CATEGORY_COLOR: &str = "#3B82F6";

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid hex color regex"));

/// Validation failures for category write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    /// Name is empty or whitespace-only after trimming.
    EmptyName,
    /// Color is not a `#RRGGBB` hex string.
    InvalidColor(String),
}

impl Display for CategoryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "category name must not be blank"),
            Self::InvalidColor(value) => {
                write!(f, "invalid category color `{value}`; expected #RRGGBB")
            }
        }
    }
}

impl Error for CategoryValidationError {}

/// Category read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable category ID.
    pub uuid: CategoryId,
    /// Owning user; the category forest is per-owner.
    pub user_uuid: UserId,
    /// Display name, unique among siblings.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Display color as `#RRGGBB`.
    pub color: String,
    /// Optional icon name chosen by the UI.
    pub icon: Option<String>,
    /// Parent category. `None` means root-level.
    pub parent_uuid: Option<CategoryId>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Input for category creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: Option<String>,
    pub parent_uuid: Option<CategoryId>,
}

impl CategoryDraft {
    /// Creates a draft with default attributes under an optional parent.
    pub fn new(name: impl Into<String>, parent_uuid: Option<CategoryId>) -> Self {
        Self {
            name: name.into(),
            description: None,
            color: DEFAULT_CATEGORY_COLOR.to_string(),
            icon: None,
            parent_uuid,
        }
    }

    /// Checks write-path invariants.
    ///
    /// # Errors
    /// - `EmptyName` when the name is blank after trimming.
    /// - `InvalidColor` when the color is not `#RRGGBB`.
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        if self.name.trim().is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }
        validate_color(&self.color)
    }
}

/// Partial attribute update for a category.
///
/// Name and parent changes go through dedicated rename/reparent operations
/// because they carry structural invariants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryAttrsPatch {
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Validates a `#RRGGBB` display color.
pub fn validate_color(color: &str) -> Result<(), CategoryValidationError> {
    if HEX_COLOR_RE.is_match(color) {
        Ok(())
    } else {
        Err(CategoryValidationError::InvalidColor(color.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_color, CategoryDraft, CategoryValidationError, DEFAULT_CATEGORY_COLOR};

    #[test]
    fn draft_defaults_use_default_color() {
        let draft = CategoryDraft::new("Work", None);
        assert_eq!(draft.color, DEFAULT_CATEGORY_COLOR);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_name() {
        let draft = CategoryDraft::new("  ", None);
        assert_eq!(draft.validate(), Err(CategoryValidationError::EmptyName));
    }

    #[test]
    fn validate_color_accepts_hex_and_rejects_everything_else() {
        assert!(validate_color("#3B82F6").is_ok());
        assert!(validate_color("#abcdef").is_ok());
        assert!(validate_color("3B82F6").is_err());
        assert!(validate_color("#3B82F").is_err());
        assert!(validate_color("#3B82FG").is_err());
        assert!(validate_color("blue").is_err());
    }
}
