//! Scheduling rules over the lesson store.
//!
//! # Responsibility
//! - Interval conflict detection for candidate bookings.
//! - Weekly slot deduplication for person lookups.
//! - Unfiltered per-weekday listing for the by-room view.
//!
//! # Invariants
//! - Everything here is a pure read over repository contracts.

pub mod conflict;
pub mod day;
pub mod slots;
