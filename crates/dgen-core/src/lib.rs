//! Domain layer for DGEN: models, repository traits, configuration models
//! and the incremental extraction state machine. Nothing in here performs I/O.

pub mod account;
pub mod config;
pub mod diagram;
pub mod error;
pub mod extraction;
pub mod generation;
pub mod message;
pub mod pacing;
pub mod project;
pub mod request;
pub mod secret;

// Re-export common error type
pub use error::{DgenError, ErrorCategory, Result};
