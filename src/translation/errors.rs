// Error mapping (Claude error payload → OpenAI error)
// Author: kelexine (https://github.com/kelexine)

use crate::error::ProviderError;
use crate::models::anthropic::ClaudeError;
use crate::models::openai::OpenAiError;
use axum::http::StatusCode;
use tracing::debug;

/// Map a Claude error payload to an OpenAI error.
///
/// Returns `None` when the payload is absent or empty. Every provider error is
/// surfaced as 400 with the provider's message verbatim; rate-limit, auth and
/// overload errors are not distinguished.
// TODO: map rate_limit_error/authentication_error/overloaded_error to 429/401/529 once clients can handle them
pub fn map_provider_error(error: Option<&ClaudeError>) -> Option<ProviderError> {
    let error = error.filter(|e| !e.is_empty())?;

    debug!("Mapping Claude error: type={}, message={}", error.error_type, error.message);

    let code = (!error.error_type.is_empty()).then(|| error.error_type.clone());

    Some(ProviderError {
        status: StatusCode::BAD_REQUEST,
        error: OpenAiError {
            message: error.message.clone(),
            error_type: error.error_type.clone(),
            code,
        },
    })
}
