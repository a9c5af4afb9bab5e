pub mod grid;
pub mod schedule;

pub use grid::GridService;
pub use schedule::ScheduleService;
