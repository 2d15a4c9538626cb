pub mod background_task;
pub mod capture_service;
pub mod handoff_service;
mod promotion;
pub mod sync_service;

pub use background_task::{BackgroundRunReport, BackgroundUploadTask, RunOutcome};
pub use capture_service::{CaptureService, PhotoOrigin};
pub use handoff_service::HandoffService;
pub use sync_service::{CycleOutcome, SyncService};

#[cfg(test)]
pub(crate) mod test_support;
