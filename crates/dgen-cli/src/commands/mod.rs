pub mod account;
pub mod generate;
pub mod init;
pub mod project;

use dgen_core::DgenError;

/// Adds the caller-facing status code to an error.
pub fn with_status(err: DgenError) -> anyhow::Error {
    anyhow::anyhow!("[{}] {}", err.category().status_code(), err)
}
