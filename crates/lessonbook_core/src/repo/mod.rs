//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the store capability scheduling logic is written against.
//! - Isolate SQLite query details from service orchestration.

pub mod lesson_repo;
pub mod person_repo;
