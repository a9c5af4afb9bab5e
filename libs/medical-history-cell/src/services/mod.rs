pub mod history;
pub mod followup;
pub mod transcription;

pub use history::HistoryService;
pub use followup::FollowUpService;
pub use transcription::TranscriptionService;
