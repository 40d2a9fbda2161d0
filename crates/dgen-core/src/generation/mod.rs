//! Generation domain module.
//!
//! # Module Structure
//!
//! - `model`: the durable `GenerationRecord`
//! - `repository`: persistence trait for records
//! - `source`: the upstream fragment stream abstraction

mod model;
mod repository;
mod source;

pub use model::GenerationRecord;
pub use repository::GenerationRepository;
pub use source::{FragmentSource, FragmentStream};
