//! Anthropic Messages API type definitions.
//!
//! This module defines the request and response structures for the [Anthropic Messages API](https://docs.anthropic.com/en/api/messages).
//! Requests are serialized and sent upstream; responses are deserialized from Claude.

// Author: kelexine (https://github.com/kelexine)

use serde::de::IntoDeserializer;
use serde::{Deserialize, Deserializer, Serialize};

/// Anthropic Messages API request structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagesRequest {
    /// The model that will complete your prompt.
    pub model: String,

    /// System prompt. Claude has no message-level "system" role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Input messages.
    pub messages: Vec<Message>,

    /// The maximum number of tokens to generate before stopping.
    pub max_tokens: u32,

    /// Custom text sequences that will cause the model to stop generating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,

    /// Amount of randomness injected into the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Use nucleus sampling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Whether to incrementally stream the response using server-sent events.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

/// Message role in Claude's two-role vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

/// Request content block types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// A text content block.
    Text { text: String },
    /// An image content block.
    Image { source: ImageSource },
}

/// Image source for vision content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ImageSource {
    #[serde(rename = "base64")]
    Base64 { media_type: String, data: String },
}

/// Anthropic Messages API response.
///
/// Every field is defaulted: error replies only carry `type` and `error`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesResponse {
    /// Unique object identifier.
    #[serde(default)]
    pub id: String,

    /// "message" on success, "error" on failure.
    #[serde(rename = "type", default)]
    pub response_type: String,

    /// Conversational role of the generated message (always "assistant").
    #[serde(default)]
    pub role: String,

    /// Content generated by the model.
    #[serde(default)]
    pub content: Vec<ResponseBlock>,

    /// The reason why the model stopped generating. An empty string counts as absent.
    #[serde(default, deserialize_with = "empty_stop_reason_as_none")]
    pub stop_reason: Option<StopReason>,

    /// Billing and rate-limit usage.
    #[serde(default)]
    pub usage: Usage,

    /// Error payload, present only on failures.
    #[serde(default)]
    pub error: Option<ClaudeError>,
}

/// Response content block. Only text is consumed; other block kinds keep an empty text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseBlock {
    #[serde(rename = "type", default)]
    pub block_type: String,
    #[serde(default)]
    pub text: String,
}

impl ResponseBlock {
    /// Untyped blocks are read as text
    pub fn is_text(&self) -> bool {
        self.block_type.is_empty() || self.block_type == "text"
    }
}

/// Why Claude stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
    #[serde(other)]
    Unknown,
}

/// `null`, a missing field and `""` all mean no stop reason was supplied
pub(crate) fn empty_stop_reason_as_none<'de, D>(deserializer: D) -> Result<Option<StopReason>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(reason) => StopReason::deserialize(reason.into_deserializer()).map(Some),
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// The number of input tokens which were used.
    #[serde(default)]
    pub input_tokens: u32,

    /// The number of output tokens which were used.
    #[serde(default)]
    pub output_tokens: u32,
}

/// Error payload returned by Claude.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaudeError {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub message: String,
}

impl ClaudeError {
    pub fn is_empty(&self) -> bool {
        self.error_type.is_empty() && self.message.is_empty()
    }
}
