//! File-backed and in-memory implementations of the dgen repositories,
//! plus configuration and secret loading.

pub mod config_service;
pub mod memory_repository;
pub mod paths;
pub mod secret_service;
pub mod storage;
pub mod toml_account_repository;
pub mod toml_generation_repository;
pub mod toml_project_repository;

pub use crate::config_service::ConfigService;
pub use crate::memory_repository::{
    InMemoryAccountRepository, InMemoryGenerationRepository, InMemoryProjectRepository,
};
pub use crate::paths::DgenPaths;
pub use crate::secret_service::SecretServiceImpl;
pub use crate::toml_account_repository::TomlAccountRepository;
pub use crate::toml_generation_repository::TomlGenerationRepository;
pub use crate::toml_project_repository::TomlProjectRepository;
