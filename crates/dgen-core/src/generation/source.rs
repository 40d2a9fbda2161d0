//! Upstream fragment source.

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Ordered text fragments from the generation service. Fragment boundaries
/// carry no meaning.
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Something that turns a prompt pair into a fragment stream.
///
/// Implementations report request-level failures (bad credentials, error
/// status) from `open`, and mid-stream failures as `Err` items.
#[async_trait]
pub trait FragmentSource: Send + Sync {
    async fn open(&self, system_prompt: &str, user_prompt: &str) -> Result<FragmentStream>;

    /// Short label for logs, e.g. the model name.
    fn name(&self) -> &str;
}
