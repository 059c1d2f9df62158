//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the API and CLI layers decoupled from storage details.

pub mod assistant;
pub mod schedule_service;

pub use assistant::{Assistant, AssistantError, AssistantReply};
pub use schedule_service::{BookingOutcome, BookingRequest, ScheduleError, ScheduleService};
