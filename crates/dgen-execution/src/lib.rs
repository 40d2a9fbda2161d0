//! Runtime plumbing for DGEN: subscriber setup and session spawning.

pub mod event_layer;
pub mod runner;
pub mod telemetry;

pub use event_layer::{SessionEvent, SessionEventLayer};
pub use runner::{CHANNEL_CAPACITY, GenerationHandle, GenerationRunner};
pub use telemetry::{TelemetryGuard, init_telemetry};
