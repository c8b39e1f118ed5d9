// Request translation (OpenAI → Claude)
// Author: kelexine (https://github.com/kelexine)

use crate::error::{ProxyError, Result};
use crate::models::anthropic::{ContentBlock, ImageSource, Message, MessagesRequest, Role};
use crate::models::openai::{self, ChatCompletionRequest, ChatMessage, ContentPart, MessageContent};
use crate::vision::ImageFetcher;
use tracing::debug;

/// Claude requires max_tokens; used when the client omits it or sends 0
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Translate an OpenAI ChatCompletionRequest to a Claude MessagesRequest
pub async fn translate_request(
    request: &ChatCompletionRequest,
    images: &dyn ImageFetcher,
) -> Result<MessagesRequest> {
    debug!("Translating request for model: {}", request.model);

    let max_tokens = match request.max_tokens {
        Some(n) if n > 0 => n,
        _ => DEFAULT_MAX_TOKENS,
    };

    let mut system = None;
    let mut messages = Vec::with_capacity(request.messages.len());

    for message in &request.messages {
        match message.role {
            // Last system message wins
            openai::Role::System => system = Some(system_text(message)?),
            openai::Role::User => messages.push(translate_message(Role::User, message, images).await?),
            openai::Role::Assistant => {
                messages.push(translate_message(Role::Assistant, message, images).await?)
            }
        }
    }

    let stop_sequences = request
        .stop
        .clone()
        .map(|s| s.into_vec())
        .filter(|v| !v.is_empty());

    debug!(
        "Translated request: {} messages, system: {}, max_tokens: {}, stream: {}",
        messages.len(),
        system.is_some(),
        max_tokens,
        request.stream
    );

    Ok(MessagesRequest {
        model: request.model.clone(),
        system,
        messages,
        max_tokens,
        stop_sequences,
        temperature: request.temperature,
        top_p: request.top_p,
        stream: request.stream,
    })
}

/// System prompts must be plain strings
fn system_text(message: &ChatMessage) -> Result<String> {
    match &message.content {
        MessageContent::Text(text) => Ok(text.clone()),
        MessageContent::Parts(_) => Err(ProxyError::InvalidRequest(
            "System message content must be a string".to_string(),
        )),
    }
}

async fn translate_message(
    role: Role,
    message: &ChatMessage,
    images: &dyn ImageFetcher,
) -> Result<Message> {
    let content = match &message.content {
        MessageContent::Text(text) => vec![ContentBlock::Text { text: text.clone() }],
        MessageContent::Parts(parts) => {
            let mut blocks = Vec::with_capacity(parts.len());
            for part in parts {
                blocks.push(translate_part(part, images).await?);
            }
            blocks
        }
    };

    Ok(Message { role, content })
}

async fn translate_part(part: &ContentPart, images: &dyn ImageFetcher) -> Result<ContentBlock> {
    match part {
        ContentPart::Text { text } => Ok(ContentBlock::Text { text: text.clone() }),
        ContentPart::ImageUrl { image_url } => {
            let image = images
                .fetch(&image_url.url)
                .await
                .map_err(|e| ProxyError::InvalidImage(e.to_string()))?;

            debug!("Resolved image part: {}", image.media_type);

            Ok(ContentBlock::Image {
                source: ImageSource::Base64 {
                    media_type: image.media_type,
                    data: image.data,
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::openai::{ImageUrl, StopSequences};
    use crate::vision::{FetchedImage, ImageError};
    use async_trait::async_trait;
    use proptest::prelude::*;

    /// Resolves every URL to the same PNG, except URLs containing "broken"
    struct StubFetcher;

    #[async_trait]
    impl ImageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> std::result::Result<FetchedImage, ImageError> {
            if url.contains("broken") {
                return Err(ImageError::Status(404));
            }
            Ok(FetchedImage {
                media_type: "image/png".to_string(),
                data: "iVBORw0KGgo=".to_string(),
            })
        }
    }

    fn text_message(role: openai::Role, text: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: MessageContent::Text(text.to_string()),
            name: None,
        }
    }

    fn request(messages: Vec<ChatMessage>) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "claude-3-5-sonnet-20241022".to_string(),
            messages,
            max_tokens: None,
            temperature: Some(0.5),
            top_p: None,
            stop: None,
            stream: false,
        }
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[tokio::test]
    async fn test_simple_message_translation() {
        let req = request(vec![text_message(openai::Role::User, "Hello, world!")]);

        let result = translate_request(&req, &StubFetcher).await.unwrap();

        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].role, Role::User);
        assert_eq!(
            result.messages[0].content,
            vec![ContentBlock::Text { text: "Hello, world!".to_string() }]
        );
        assert_eq!(result.temperature, Some(0.5));
        assert!(result.system.is_none());
    }

    #[tokio::test]
    async fn test_system_message_extracted() {
        let req = request(vec![
            text_message(openai::Role::System, "You are terse."),
            text_message(openai::Role::User, "Hi"),
            text_message(openai::Role::Assistant, "Hello"),
        ]);

        let result = translate_request(&req, &StubFetcher).await.unwrap();

        assert_eq!(result.system.as_deref(), Some("You are terse."));
        assert_eq!(result.messages.len(), 2);
        assert_eq!(result.messages[0].role, Role::User);
        assert_eq!(result.messages[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_last_system_message_wins() {
        let req = request(vec![
            text_message(openai::Role::System, "first"),
            text_message(openai::Role::User, "Hi"),
            text_message(openai::Role::System, "second"),
        ]);

        let result = translate_request(&req, &StubFetcher).await.unwrap();

        assert_eq!(result.system.as_deref(), Some("second"));
        assert_eq!(result.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_non_string_system_content_rejected() {
        let req = request(vec![ChatMessage {
            role: openai::Role::System,
            content: MessageContent::Parts(vec![ContentPart::Text {
                text: "structured".to_string(),
            }]),
            name: None,
        }]);

        let result = translate_request(&req, &StubFetcher).await;
        assert!(matches!(result, Err(ProxyError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_multi_part_content() {
        let req = request(vec![ChatMessage {
            role: openai::Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: "What is in this image?".to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: "https://example.com/cat.png".to_string(),
                        detail: None,
                    },
                },
            ]),
            name: None,
        }]);

        let result = translate_request(&req, &StubFetcher).await.unwrap();
        let content = &result.messages[0].content;

        assert_eq!(content.len(), 2);
        assert_eq!(
            content[1],
            ContentBlock::Image {
                source: ImageSource::Base64 {
                    media_type: "image/png".to_string(),
                    data: "iVBORw0KGgo=".to_string(),
                },
            }
        );
    }

    #[tokio::test]
    async fn test_image_failure_aborts_translation() {
        let req = request(vec![
            text_message(openai::Role::User, "fine"),
            ChatMessage {
                role: openai::Role::User,
                content: MessageContent::Parts(vec![ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: "https://example.com/broken.png".to_string(),
                        detail: None,
                    },
                }]),
                name: None,
            },
        ]);

        let err = translate_request(&req, &StubFetcher).await.unwrap_err();

        assert!(matches!(err, ProxyError::InvalidImage(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stop_sequences() {
        let mut req = request(vec![text_message(openai::Role::User, "Hi")]);
        req.stop = Some(StopSequences::Single("END".to_string()));
        let result = translate_request(&req, &StubFetcher).await.unwrap();
        assert_eq!(result.stop_sequences, Some(vec!["END".to_string()]));

        req.stop = Some(StopSequences::Many(vec![]));
        let result = translate_request(&req, &StubFetcher).await.unwrap();
        assert_eq!(result.stop_sequences, None);
    }

    #[tokio::test]
    async fn test_translation_is_deterministic() {
        let mut req = request(vec![
            text_message(openai::Role::System, "sys"),
            text_message(openai::Role::User, "Hi"),
        ]);
        req.stream = true;

        let first = translate_request(&req, &StubFetcher).await.unwrap();
        let second = translate_request(&req, &StubFetcher).await.unwrap();

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    proptest! {
        #[test]
        fn prop_max_tokens_default(max_tokens in prop::option::of(0u32..100_000)) {
            let mut req = request(vec![text_message(openai::Role::User, "Hi")]);
            req.max_tokens = max_tokens;

            let result = block_on(translate_request(&req, &StubFetcher)).unwrap();

            match max_tokens {
                Some(n) if n > 0 => prop_assert_eq!(result.max_tokens, n),
                _ => prop_assert_eq!(result.max_tokens, DEFAULT_MAX_TOKENS),
            }
        }

        #[test]
        fn prop_system_never_forwarded_as_message(
            system in "[a-zA-Z ]{1,40}",
            turns in prop::collection::vec(any::<bool>(), 0..6),
        ) {
            let mut messages = vec![text_message(openai::Role::System, &system)];
            for is_user in &turns {
                let role = if *is_user { openai::Role::User } else { openai::Role::Assistant };
                messages.push(text_message(role, "turn"));
            }

            let result = block_on(translate_request(&request(messages), &StubFetcher)).unwrap();

            prop_assert_eq!(result.system.as_deref(), Some(system.as_str()));
            prop_assert_eq!(result.messages.len(), turns.len());
        }
    }
}
