//! Domain model for lessons and the people attached to them.
//!
//! # Responsibility
//! - Define canonical data structures used by scheduling logic.
//! - Keep interval semantics (`[start, end)`) in one place.
//!
//! # Invariants
//! - Every lesson and person is identified by a stable UUID.
//! - Lessons are immutable once stored; the only lifecycle change is deletion.

pub mod lesson;
pub mod person;
pub mod window;
