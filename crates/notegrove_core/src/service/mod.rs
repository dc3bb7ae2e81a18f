//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep callers decoupled from storage and transaction details.

pub mod category_service;
pub mod note_service;
pub mod version_service;
