// Claude API client module
// Author: kelexine (https://github.com/kelexine)

mod client;
pub mod streaming;

pub use client::ClaudeClient;
pub use streaming::{spawn_chunk_pipeline, split_lines, LineStream, StreamSignal};
