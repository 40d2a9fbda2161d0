//! Generation-service clients producing text fragment streams.

pub mod openai_stream_client;
pub mod scripted_source;
pub mod sse;

pub use openai_stream_client::OpenAIStreamClient;
pub use scripted_source::{PromptPair, ScriptedFragmentSource};
