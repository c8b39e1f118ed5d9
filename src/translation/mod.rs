// Translation module - OpenAI ↔ Claude API translation
// Author: kelexine (https://github.com/kelexine)

pub mod errors;
pub mod request;
pub mod response;
pub mod streaming;

pub use errors::map_provider_error;
pub use request::{translate_request, DEFAULT_MAX_TOKENS};
pub use response::translate_response;
pub use streaming::{StreamStep, StreamTranslator};
