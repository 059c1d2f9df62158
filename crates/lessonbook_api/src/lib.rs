//! Request/response surface for lessonbook front ends.
//!
//! # Responsibility
//! - Expose use-case level operations returning one stable envelope shape.
//! - Keep storage and resolver wiring out of transport layers.
//!
//! # Invariants
//! - Operations never panic and never return `Err`; failures become
//!   `status = "error"` envelopes.
//! - Each call opens its own database connection and closes it on return.

pub mod api;
pub mod dto;

pub use api::{ApiResponse, ApiStatus, LessonbookApi};
pub use dto::{
    DayRequest, DeleteRequest, LessonDto, LessonViewDto, ManualLessonRequest, ProcessRequest,
    UploadFileDto, UploadRequest, WeeklySlotDto,
};
