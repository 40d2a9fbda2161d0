//! Storage layer for atomic file operations.

mod atomic_toml;
mod document_dir;

pub use atomic_toml::{AtomicTomlError, AtomicTomlFile};
pub use document_dir::DocumentDir;
