//! Account domain module.

mod model;
mod repository;

pub use model::{Account, USAGE_COST};
pub use repository::AccountRepository;
