//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query and transaction details from service orchestration.
//!
//! # Invariants
//! - Every mutating operation runs inside one immediate transaction so its
//!   validation (diffs, uniqueness, cycle walks, version numbering) executes
//!   in the same scope as the write it guards.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateSibling`,
//!   `VersionNotFound`, ...) in addition to DB transport errors.

pub mod category_repo;
pub mod note_repo;
pub mod tag_repo;
pub mod version_repo;
