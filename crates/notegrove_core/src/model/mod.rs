//! Domain model for notes, categories, and version snapshots.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep validation of user-supplied fields next to the types they guard.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - Note deletion is represented by soft-delete tombstones; hard delete is
//!   reserved for the trash purge path.

pub mod category;
pub mod note;
pub mod version;
