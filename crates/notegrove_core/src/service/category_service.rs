//! Category tree use-case service.
//!
//! # Responsibility
//! - Expose tree manipulation (create/rename/reparent/delete) and queries
//!   (flat list, children, nested tree, display path) over the repository.
//!
//! # Invariants
//! - Display paths join ancestor names root-first with " > ".
//! - The nested tree is assembled from one flat owner query; children stay
//!   name-sorted as the repository returns them.

use crate::model::category::{Category, CategoryAttrsPatch, CategoryDraft, CategoryId};
use crate::model::note::UserId;
use crate::repo::category_repo::{CategoryRepoError, CategoryRepository};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Separator between ancestor names in a display path.
const PATH_SEPARATOR: &str = " > ";

/// Service error for category use-cases.
#[derive(Debug)]
pub enum CategoryServiceError {
    /// Target category does not exist for this owner.
    CategoryNotFound(CategoryId),
    /// Persistence or tree-rule failure.
    Repo(CategoryRepoError),
}

impl Display for CategoryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CategoryNotFound(category_uuid) => {
                write!(f, "category not found: {category_uuid}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CategoryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CategoryRepoError> for CategoryServiceError {
    fn from(value: CategoryRepoError) -> Self {
        match value {
            CategoryRepoError::NotFound(category_uuid) => Self::CategoryNotFound(category_uuid),
            other => Self::Repo(other),
        }
    }
}

/// One node of the assembled nested tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTreeNode {
    pub category: Category,
    pub children: Vec<CategoryTreeNode>,
}

/// Category service facade over repository implementations.
pub struct CategoryService<R: CategoryRepository> {
    repo: R,
}

impl<R: CategoryRepository> CategoryService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one category under an optional parent.
    pub fn create_category(
        &mut self,
        user_uuid: UserId,
        draft: CategoryDraft,
    ) -> Result<Category, CategoryServiceError> {
        Ok(self.repo.create_category(user_uuid, &draft)?)
    }

    /// Gets one category by stable ID.
    pub fn get_category(
        &self,
        user_uuid: UserId,
        category_uuid: CategoryId,
    ) -> Result<Option<Category>, CategoryServiceError> {
        Ok(self.repo.get_category(user_uuid, category_uuid)?)
    }

    /// Lists the owner's categories flat, sorted by name.
    pub fn list_categories(
        &self,
        user_uuid: UserId,
    ) -> Result<Vec<Category>, CategoryServiceError> {
        Ok(self.repo.list_categories(user_uuid)?)
    }

    /// Lists direct children of one parent (`None` lists roots).
    pub fn list_children(
        &self,
        user_uuid: UserId,
        parent_uuid: Option<CategoryId>,
    ) -> Result<Vec<Category>, CategoryServiceError> {
        Ok(self.repo.list_children(user_uuid, parent_uuid)?)
    }

    /// Assembles the owner's full forest as nested trees, roots name-sorted.
    pub fn category_tree(
        &self,
        user_uuid: UserId,
    ) -> Result<Vec<CategoryTreeNode>, CategoryServiceError> {
        let flat = self.repo.list_categories(user_uuid)?;
        Ok(assemble_tree(flat))
    }

    /// Renames one category in place.
    pub fn rename_category(
        &mut self,
        user_uuid: UserId,
        category_uuid: CategoryId,
        new_name: &str,
    ) -> Result<Category, CategoryServiceError> {
        Ok(self.repo.rename_category(user_uuid, category_uuid, new_name)?)
    }

    /// Updates description/color/icon attributes.
    pub fn update_category_attrs(
        &mut self,
        user_uuid: UserId,
        category_uuid: CategoryId,
        patch: CategoryAttrsPatch,
    ) -> Result<Category, CategoryServiceError> {
        Ok(self
            .repo
            .update_category_attrs(user_uuid, category_uuid, &patch)?)
    }

    /// Moves one category under a new parent, or to root with `None`.
    pub fn reparent_category(
        &mut self,
        user_uuid: UserId,
        category_uuid: CategoryId,
        new_parent_uuid: Option<CategoryId>,
    ) -> Result<Category, CategoryServiceError> {
        Ok(self
            .repo
            .reparent_category(user_uuid, category_uuid, new_parent_uuid)?)
    }

    /// Deletes one leaf category with no note links.
    pub fn delete_category(
        &mut self,
        user_uuid: UserId,
        category_uuid: CategoryId,
    ) -> Result<(), CategoryServiceError> {
        Ok(self.repo.delete_category(user_uuid, category_uuid)?)
    }

    /// Returns the display path from root to the category, " > " joined.
    pub fn category_path(
        &self,
        user_uuid: UserId,
        category_uuid: CategoryId,
    ) -> Result<String, CategoryServiceError> {
        let names = self.repo.category_path(user_uuid, category_uuid)?;
        Ok(names.join(PATH_SEPARATOR))
    }

    /// Returns all transitive children of one category.
    pub fn category_descendants(
        &self,
        user_uuid: UserId,
        category_uuid: CategoryId,
    ) -> Result<Vec<Category>, CategoryServiceError> {
        Ok(self.repo.category_descendants(user_uuid, category_uuid)?)
    }

    /// Counts the owner's notes linked to one category (trash included).
    pub fn note_count(
        &self,
        user_uuid: UserId,
        category_uuid: CategoryId,
    ) -> Result<i64, CategoryServiceError> {
        Ok(self.repo.note_count(user_uuid, category_uuid)?)
    }
}

/// Builds nested trees from one flat name-sorted listing. A child whose
/// parent is missing from the listing is treated as a root rather than
/// dropped.
fn assemble_tree(flat: Vec<Category>) -> Vec<CategoryTreeNode> {
    let known: HashMap<CategoryId, usize> = flat
        .iter()
        .enumerate()
        .map(|(index, category)| (category.uuid, index))
        .collect();

    let mut children_of: HashMap<CategoryId, Vec<usize>> = HashMap::new();
    let mut roots: Vec<usize> = Vec::new();
    for (index, category) in flat.iter().enumerate() {
        match category.parent_uuid {
            Some(parent_uuid) if known.contains_key(&parent_uuid) => {
                children_of.entry(parent_uuid).or_default().push(index);
            }
            _ => roots.push(index),
        }
    }

    fn build(
        index: usize,
        flat: &[Category],
        children_of: &HashMap<CategoryId, Vec<usize>>,
    ) -> CategoryTreeNode {
        let category = flat[index].clone();
        let children = children_of
            .get(&category.uuid)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&child| build(child, flat, children_of))
                    .collect()
            })
            .unwrap_or_default();
        CategoryTreeNode { category, children }
    }

    roots
        .into_iter()
        .map(|index| build(index, &flat, &children_of))
        .collect()
}
