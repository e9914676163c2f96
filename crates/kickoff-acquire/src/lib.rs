pub mod calendar;
pub mod espn;
pub mod fetch;
pub mod orchestrator;
pub mod sidearm;
pub mod source;

pub use fetch::PageFetcher;
pub use orchestrator::{Orchestrator, RefreshError, RefreshOutcome};
pub use source::{ScheduleSource, SourceError};
