pub mod progress;
pub mod registry;

pub use progress::{DocumentStatus, JobStage, ProgressBroadcaster, ProgressEvent};
pub use registry::{JobRegistry, TrackedJob};
