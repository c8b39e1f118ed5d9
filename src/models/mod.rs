//! Data models for the OpenAI and Anthropic APIs.
//!
//! This module contains the type definitions for request/response bodies used by:
//! - The inbound OpenAI-compatible API (`openai`)
//! - The upstream Anthropic Messages API (`anthropic`)
//! - Anthropic streaming event types (`streaming`)

// Author: kelexine (https://github.com/kelexine)

pub mod anthropic;
pub mod openai;
pub mod streaming;

pub use anthropic::{ClaudeError, MessagesRequest, MessagesResponse, StopReason};
pub use openai::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, FinishReason, OpenAiError,
    Usage,
};
pub use streaming::{StreamEnvelope, StreamEvent};
