// claude2oai - OpenAI Chat Completions compatible gateway for Anthropic Claude
// Author: kelexine (https://github.com/kelexine)

pub mod claude;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod translation;
pub mod utils;
pub mod vision;
