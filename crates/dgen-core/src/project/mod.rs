//! Project domain module.
//!
//! # Module Structure
//!
//! - `model`: `Project` with its current snapshot
//! - `history`: bounded newest-first history log
//! - `repository`: persistence trait for projects

mod history;
mod model;
mod repository;

pub use history::{HISTORY_CAPACITY, HistoryEntry, UpdateType};
pub use model::Project;
pub use repository::{ProjectEdit, ProjectRepository};
