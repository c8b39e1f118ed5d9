// SSE event translation for streaming responses (Claude → OpenAI chunks)
// Author: kelexine (https://github.com/kelexine)

use super::errors::map_provider_error;
use super::response::map_stop_reason;
use crate::error::{ProxyError, Result};
use crate::models::openai::{ChatCompletionChunk, ChunkChoice, ChunkDelta, FinishReason, Usage};
use crate::models::streaming::{StreamEnvelope, StreamEvent};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No event consumed yet
    Init,
    /// message_start (or a content event) seen
    Streaming,
    /// message_stop, decode failure or provider error seen; nothing else is consumed
    Closed,
}

/// Outcome of feeding one line to the translator
#[derive(Debug, Clone)]
pub enum StreamStep {
    /// Nothing to emit (framing noise, keep-alives, ignored events)
    Skip,
    /// One chunk to forward downstream
    Chunk(ChatCompletionChunk),
    /// Graceful end of stream
    Done,
}

/// Translates Claude SSE lines into OpenAI `chat.completion.chunk` records.
///
/// Usage is written into a caller-owned accumulator passed on every call:
/// prompt tokens at message_start, completion and total at each message_delta.
pub struct StreamTranslator {
    model: String,
    state: StreamState,
}

impl StreamTranslator {
    pub fn new(model: String) -> Self {
        Self {
            model,
            state: StreamState::Init,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == StreamState::Closed
    }

    /// Feed one raw line from the upstream body.
    ///
    /// An `Err` is terminal: the translator is closed afterwards.
    pub fn translate_line(&mut self, line: &str, usage: &mut Usage) -> Result<StreamStep> {
        if self.is_closed() {
            debug!("Ignoring line after stream close");
            return Ok(StreamStep::Skip);
        }

        let Some(data) = line.strip_prefix("data:") else {
            return Ok(StreamStep::Skip);
        };
        let data = data.strip_prefix(' ').unwrap_or(data);

        let envelope: StreamEnvelope = match serde_json::from_str(data) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Failed to parse Claude SSE JSON: {}", e);
                debug!("Raw data: {}", data.chars().take(200).collect::<String>());
                self.state = StreamState::Closed;
                return Err(ProxyError::Decode(e.to_string()));
            }
        };

        // Checked before the event type: any event may carry an error
        if let Some(mapped) = map_provider_error(envelope.error.as_ref()) {
            warn!("Claude stream error: {}", mapped);
            self.state = StreamState::Closed;
            return Err(ProxyError::Provider(mapped));
        }

        self.translate_event(envelope.event, usage)
    }

    fn translate_event(&mut self, event: StreamEvent, usage: &mut Usage) -> Result<StreamStep> {
        match event {
            // Error events with an empty payload
            StreamEvent::Error => Ok(StreamStep::Skip),

            StreamEvent::MessageStart { message } => {
                self.state = StreamState::Streaming;
                usage.prompt_tokens = message.usage.input_tokens;
                debug!("message_start: input_tokens={}", message.usage.input_tokens);

                let role = (!message.role.is_empty()).then_some(message.role);
                Ok(self.chunk(0, ChunkDelta { role, content: None }, None))
            }

            StreamEvent::ContentBlockDelta { index, delta } => {
                self.open();
                let content = delta.text().map(str::to_string);
                Ok(self.chunk(index, ChunkDelta { role: None, content }, None))
            }

            StreamEvent::MessageDelta { delta, usage: delta_usage } => {
                self.open();
                usage.completion_tokens = delta_usage.output_tokens;
                usage.total_tokens = usage.prompt_tokens.saturating_add(usage.completion_tokens);
                debug!("message_delta: output_tokens={}", delta_usage.output_tokens);

                let finish_reason = delta.stop_reason.map(map_stop_reason);
                Ok(self.chunk(0, ChunkDelta::default(), finish_reason))
            }

            StreamEvent::MessageStop => {
                debug!("message_stop: closing stream");
                self.state = StreamState::Closed;
                Ok(StreamStep::Done)
            }

            StreamEvent::Other => Ok(StreamStep::Skip),
        }
    }

    /// Content arriving before message_start implicitly opens the stream
    fn open(&mut self) {
        if self.state == StreamState::Init {
            debug!("Stream event before message_start, opening stream");
            self.state = StreamState::Streaming;
        }
    }

    fn chunk(&self, index: u32, delta: ChunkDelta, finish_reason: Option<FinishReason>) -> StreamStep {
        StreamStep::Chunk(ChatCompletionChunk::new(
            &self.model,
            ChunkChoice {
                index,
                delta,
                finish_reason,
            },
        ))
    }
}
