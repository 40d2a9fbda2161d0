//! A [`FragmentSource`] that replays fixed fragments.
//!
//! Used by tests and by `dgen generate --script`, which runs the whole
//! pipeline offline.

use async_trait::async_trait;
use dgen_core::generation::{FragmentSource, FragmentStream};
use dgen_core::{DgenError, Result};
use futures::stream::{self, StreamExt};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Replays a script of fragments.
pub struct ScriptedFragmentSource {
    fragments: Vec<String>,
    /// Fails the stream after this many fragments.
    fail_after: Option<(usize, String)>,
    /// Fails `open` itself.
    open_error: Option<DgenError>,
    fragment_delay: Option<Duration>,
    /// Ends the stream without closing it (never yields `None`).
    hang_at_end: bool,
    prompts: Mutex<Vec<PromptPair>>,
}

impl ScriptedFragmentSource {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            fail_after: None,
            open_error: None,
            fragment_delay: None,
            hang_at_end: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Splits `text` into fragments of at most `chunk_chars` characters.
    pub fn from_text(text: &str, chunk_chars: usize) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let fragments: Vec<String> = chars
            .chunks(chunk_chars.max(1))
            .map(|chunk| chunk.iter().collect())
            .collect();
        Self::new(fragments)
    }

    pub fn failing_after(mut self, fragments: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((fragments, message.into()));
        self
    }

    pub fn failing_to_open(mut self, error: DgenError) -> Self {
        self.open_error = Some(error);
        self
    }

    pub fn with_fragment_delay(mut self, delay: Duration) -> Self {
        self.fragment_delay = Some(delay);
        self
    }

    /// Keeps the stream pending after the last fragment.
    pub fn hanging(mut self) -> Self {
        self.hang_at_end = true;
        self
    }

    /// Prompts passed to `open`, oldest first.
    pub fn prompts(&self) -> Vec<PromptPair> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl FragmentSource for ScriptedFragmentSource {
    async fn open(&self, system_prompt: &str, user_prompt: &str) -> Result<FragmentStream> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(PromptPair {
                system: system_prompt.to_string(),
                user: user_prompt.to_string(),
            });
        }

        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }

        let mut items: Vec<Result<String>> = self.fragments.iter().cloned().map(Ok).collect();
        if let Some((after, message)) = &self.fail_after {
            items.truncate(*after);
            items.push(Err(DgenError::upstream(message.clone())));
        }

        let delay = self.fragment_delay;
        let scripted = stream::iter(items).then(move |item| async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            item
        });

        if self.hang_at_end {
            Ok(scripted.chain(stream::pending()).boxed())
        } else {
            Ok(scripted.boxed())
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
