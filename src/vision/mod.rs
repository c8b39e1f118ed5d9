//! Vision and image handling for image-bearing chat messages.
//!
//! OpenAI clients reference images by URL (`image_url` parts); Claude only
//! accepts inline base64 sources. This module resolves such references,
//! validates the format and size, and produces Claude's representation.
//!
//! # Submodules
//!
//! - `models`: Supported formats, validation limits and error types.
//! - `fetch`: The `ImageFetcher` seam and its HTTP/data-URL implementation.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod fetch;
pub mod models;

pub use fetch::{HttpImageFetcher, ImageFetcher};
pub use models::{FetchedImage, ImageError, ImageFormat};
