//! Application layer for DGEN.
//!
//! Use cases that combine the extraction state machine from `dgen-core`
//! with repositories and a fragment source.

pub mod completion;
pub mod emitter;
pub mod generation_usecase;
pub mod locks;
pub mod project_service;
pub mod prompt;
pub mod sse;

pub use completion::{CompletionInput, CompletionOutcome, CompletionTransaction};
pub use emitter::SnapshotEmitter;
pub use generation_usecase::{DiagramGenerationUseCase, PreparedGeneration, SessionReport};
pub use locks::KeyedLocks;
pub use project_service::ProjectService;
pub use prompt::{PromptBuilder, RenderedPrompt};
