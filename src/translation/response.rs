// Response translation (Claude → OpenAI)
// Author: kelexine (https://github.com/kelexine)

use super::errors::map_provider_error;
use crate::error::{ProxyError, Result};
use crate::models::anthropic::{MessagesResponse, StopReason};
use crate::models::openai::{
    ChatCompletionChoice, ChatCompletionRequest, ChatCompletionResponse, FinishReason,
    ResponseMessage, Usage,
};
use tracing::{debug, warn};

/// Translate a Claude response to OpenAI format.
///
/// On success the caller's `usage` accumulator is overwritten with the
/// response's usage. On a provider error it is left untouched.
pub fn translate_response(
    response: MessagesResponse,
    request: &ChatCompletionRequest,
    usage: &mut Usage,
) -> Result<ChatCompletionResponse> {
    if let Some(error) = map_provider_error(response.error.as_ref()) {
        warn!("Claude returned an error: {}", error);
        return Err(ProxyError::Provider(error));
    }

    debug!("Translating Claude response to OpenAI format");

    // Claude prefixes continuations with a space
    let content = response
        .content
        .into_iter()
        .find(|block| block.is_text())
        .map(|block| match block.text.strip_prefix(' ') {
            Some(stripped) => stripped.to_string(),
            None => block.text,
        })
        .unwrap_or_default();

    let choice = ChatCompletionChoice {
        index: 0,
        message: ResponseMessage {
            role: response.role,
            content,
        },
        finish_reason: response.stop_reason.map(map_stop_reason),
    };

    let translated_usage = Usage::new(response.usage.input_tokens, response.usage.output_tokens);
    *usage = translated_usage;

    debug!("Translated response, usage: {:?}", translated_usage);

    Ok(ChatCompletionResponse {
        id: response.id,
        object: "chat.completion".to_string(),
        created: chrono::Utc::now().timestamp(),
        model: request.model.clone(),
        choices: vec![choice],
        usage: Some(translated_usage),
    })
}

/// Map Claude stop reason to OpenAI finish reason
pub fn map_stop_reason(stop_reason: StopReason) -> FinishReason {
    match stop_reason {
        StopReason::EndTurn | StopReason::StopSequence => FinishReason::Stop,
        StopReason::MaxTokens => FinishReason::Length,
        StopReason::ToolUse => FinishReason::ToolCalls,
        StopReason::Unknown => {
            warn!("Unknown stop reason from Claude, reporting as stop");
            FinishReason::Stop
        }
    }
}
