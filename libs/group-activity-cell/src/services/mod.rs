pub mod activity;

pub use activity::ActivityService;
