use std::collections::VecDeque;
use std::pin::Pin;

use futures::StreamExt as _;
use futures::stream;
use tracing::debug;

use crate::config::GenerateConfig;
use crate::errors::GenerateError;
use crate::provider::{CompletionProvider, CompletionRequest};

use super::transport::{ChunkEvent, SseDecoder, map_frame_to_events};

type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static>>;

/// Streaming client for an OpenAI-compatible `/v1/chat/completions` endpoint
/// (Groq by default).
pub struct ChatCompletionsProvider {
    client: reqwest::Client,
    config: GenerateConfig,
}

impl ChatCompletionsProvider {
    pub fn new(config: GenerateConfig) -> Result<Self, GenerateError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerateError::Config(
                "completion provider api_key must not be empty".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerateError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, GenerateError> {
        Self::new(GenerateConfig::from_env()?)
    }

    pub fn config(&self) -> &GenerateConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl CompletionProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        "chat_completions"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerateError> {
        let body = build_request_body(&request);
        debug!(request_id = %request.request_id, model = request.model.as_str(), "starting chat completion stream");

        let response = self
            .client
            .post(self.config.chat_completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerateError::transport(format!("completion request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GenerateError::provider(
                format!("completion request failed with status {status}: {body}"),
                Some(status.as_u16()),
            ));
        }

        let bytes_stream: ByteStream = Box::pin(response.bytes_stream());
        collect_completion(bytes_stream).await
    }
}

pub(crate) fn build_request_body(request: &CompletionRequest) -> serde_json::Value {
    serde_json::json!({
        "model": request.model,
        "messages": request.messages,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
        "stream": true,
    })
}

async fn collect_completion<S>(bytes_stream: S) -> Result<String, GenerateError>
where
    S: futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + Unpin,
{
    let mut events = Box::pin(chunk_event_stream(bytes_stream));
    let mut text = String::new();
    while let Some(event) = events.next().await {
        match event? {
            ChunkEvent::Delta(delta) => text.push_str(&delta),
            ChunkEvent::Finished { reason } => {
                debug!(finish_reason = reason.as_str(), "chat completion finished");
            }
        }
    }
    Ok(text)
}

fn chunk_event_stream<S>(
    bytes_stream: S,
) -> impl futures::Stream<Item = Result<ChunkEvent, GenerateError>> + Send
where
    S: futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + Unpin,
{
    struct State<S> {
        bytes_stream: S,
        decoder: SseDecoder,
        pending: VecDeque<ChunkEvent>,
        done: bool,
    }

    stream::try_unfold(
        State {
            bytes_stream,
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
            done: false,
        },
        |mut state| async move {
            loop {
                if let Some(event) = state.pending.pop_front() {
                    return Ok(Some((event, state)));
                }
                if state.done {
                    return Ok(None);
                }

                match state.bytes_stream.next().await {
                    Some(Ok(chunk)) => {
                        for frame in state.decoder.push_chunk(&chunk) {
                            state.pending.extend(map_frame_to_events(&frame)?);
                        }
                    }
                    Some(Err(e)) => {
                        return Err(GenerateError::transport(format!(
                            "completion stream read failed: {e}"
                        )));
                    }
                    None => {
                        if let Some(frame) = state.decoder.finish() {
                            state.pending.extend(map_frame_to_events(&frame)?);
                        }
                        state.done = true;
                    }
                }
            }
        },
    )
}
