pub mod handlers;
pub mod router;
pub mod models;
pub mod services;
pub mod timegrid;

// Re-export all models and services for external use
pub use models::*;
pub use services::*;

// Time-grid primitives used by other cells for schedulability checks
pub use timegrid::{
    time_to_minutes, minutes_to_time, calendar_time_range,
    position_for_time, height_for_duration, time_from_position,
    fragment_working_hours_around_breaks, is_schedulable,
    TimeSegment, DEFAULT_DAY_START_MINUTES, DEFAULT_DAY_END_MINUTES,
};
