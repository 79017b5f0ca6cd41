pub mod commands;
pub mod controller;
pub mod snapshot;
pub mod state;

pub use controller::InterviewController;
pub use snapshot::SnapshotStore;
pub use state::{Phase, SessionState};
