// Anthropic SSE streaming event types
// Author: kelexine (https://github.com/kelexine)

use super::anthropic::{empty_stop_reason_as_none, ClaudeError, StopReason, Usage};
use serde::Deserialize;

/// One decoded `data:` payload.
///
/// Any event may carry a top-level `error`, not only `type: "error"` events.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamEnvelope {
    #[serde(flatten)]
    pub event: StreamEvent,
    #[serde(default)]
    pub error: Option<ClaudeError>,
}

/// Anthropic SSE events, discriminated by their `type` tag
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    MessageStart {
        message: MessageStart,
    },
    ContentBlockDelta {
        #[serde(default)]
        index: u32,
        #[serde(default)]
        delta: Delta,
    },
    MessageDelta {
        #[serde(default)]
        delta: MessageDeltaData,
        #[serde(default)]
        usage: DeltaUsage,
    },
    MessageStop,
    /// Payload lives in `StreamEnvelope::error`
    Error,
    /// ping, content_block_start, content_block_stop and any future event
    #[serde(other)]
    Other,
}

/// Message start event payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageStart {
    #[serde(default)]
    pub role: String, // "assistant"
    #[serde(default)]
    pub usage: Usage,
}

/// content_block_delta payload.
///
/// Read loosely: a delta without `type` is treated as text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    #[serde(rename = "type", default)]
    pub delta_type: String,
    #[serde(default)]
    pub text: String,
}

impl Delta {
    /// Incremental completion text, if this delta carries any
    pub fn text(&self) -> Option<&str> {
        let is_text = self.delta_type.is_empty() || self.delta_type == "text_delta";
        (is_text && !self.text.is_empty()).then_some(self.text.as_str())
    }
}

/// Message delta event payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDeltaData {
    #[serde(default, deserialize_with = "empty_stop_reason_as_none")]
    pub stop_reason: Option<StopReason>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
}

/// Usage delta for message_delta events
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeltaUsage {
    #[serde(default)]
    pub output_tokens: u32,
}
