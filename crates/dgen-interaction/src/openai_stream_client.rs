//! Streaming client for the OpenAI Chat Completions API.
//!
//! Posts one `stream: true` request and exposes the response body as a
//! [`FragmentStream`] of content deltas.

use crate::sse::{ChunkEvent, SseDecoder};
use async_trait::async_trait;
use dgen_core::config::{GenerationSettings, OpenAIConfig};
use dgen_core::generation::{FragmentSource, FragmentStream};
use dgen_core::{DgenError, Result};
use futures::stream::{self, Stream, StreamExt};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`FragmentSource`] backed by the OpenAI HTTP API.
#[derive(Clone)]
pub struct OpenAIStreamClient {
    client: Client,
    api_key: String,
    organization_id: Option<String>,
    endpoint: String,
    model: String,
    settings: GenerationSettings,
}

impl std::fmt::Debug for OpenAIStreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIStreamClient")
            .field("api_key", &"<redacted>")
            .field("organization_id", &self.organization_id)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAIStreamClient {
    /// Builds a client from credentials and sampling settings.
    ///
    /// A model named in the credentials overrides `settings.model`.
    pub fn new(credentials: &OpenAIConfig, settings: &GenerationSettings) -> Result<Self> {
        if credentials.api_key.trim().is_empty() {
            return Err(DgenError::config(
                "OpenAI API key not found in secret.json or OPENAI_API_KEY",
            ));
        }

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| DgenError::config(format!("Failed to build HTTP client: {e}")))?;

        let model = credentials
            .model_name
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| settings.model.clone());

        Ok(Self {
            client,
            api_key: credentials.api_key.clone(),
            organization_id: credentials.organization_id.clone(),
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            model,
            settings: settings.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            stream: true,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            presence_penalty: self.settings.presence_penalty,
            frequency_penalty: self.settings.frequency_penalty,
            top_p: self.settings.top_p,
            response_format: ResponseFormat { kind: "text" },
        }
    }
}

#[async_trait]
impl FragmentSource for OpenAIStreamClient {
    async fn open(&self, system_prompt: &str, user_prompt: &str) -> Result<FragmentStream> {
        let body = self.build_request(system_prompt, user_prompt);

        let mut request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body);
        if let Some(organization) = &self.organization_id {
            request = request.header("OpenAI-Organization", organization);
        }

        tracing::debug!(model = %self.model, "Opening OpenAI completion stream");
        let response = request
            .send()
            .await
            .map_err(|err| DgenError::upstream(format!("OpenAI API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read OpenAI error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        Ok(fragment_stream(response.bytes_stream().boxed()))
    }

    fn name(&self) -> &str {
        &self.model
    }
}

struct DecodeState<S> {
    body: S,
    decoder: SseDecoder,
    queue: VecDeque<Result<String>>,
    finished: bool,
}

/// Turns a raw event-stream body into content fragments.
///
/// Ends after `[DONE]`, after the first error, or when the body ends.
pub fn fragment_stream<S, B, E>(body: S) -> FragmentStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = DecodeState {
        body,
        decoder: SseDecoder::new(),
        queue: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.queue.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(chunk.as_ref());
                    state.enqueue(events);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    state.queue.push_back(Err(DgenError::upstream(format!(
                        "OpenAI stream interrupted: {err}"
                    ))));
                }
                None => {
                    let rest = state.decoder.finish();
                    state.enqueue(rest);
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}

impl<S> DecodeState<S> {
    fn enqueue(&mut self, events: impl IntoIterator<Item = Result<ChunkEvent>>) {
        for event in events {
            match event {
                Ok(ChunkEvent::Content(content)) => self.queue.push_back(Ok(content)),
                Ok(ChunkEvent::Done) => {
                    self.finished = true;
                    return;
                }
                Err(err) => {
                    self.queue.push_back(Err(err));
                    self.finished = true;
                    return;
                }
            }
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    max_tokens: u32,
    temperature: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
    top_p: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn map_http_error(status: StatusCode, body: &str) -> DgenError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.to_string());
    DgenError::upstream(format!("OpenAI API returned {}: {}", status.as_u16(), message))
}
