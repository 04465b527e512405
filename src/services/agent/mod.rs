//! Language-model side of the analysis.
//!
//! This module provides:
//! - `prompt` - Renders an analysis request into the user prompt
//! - `client` - Streaming chat completion client and its transport seam
//! - `stream` - Server-sent-event decoding into text fragments
//! - `types` - Request and frame types for the completion API

mod client;
mod prompt;
mod stream;
mod types;

pub use client::{
    ChatTransport, CompletionClient, CompletionClientBuilder, DEFAULT_BASE_URL, HttpTransport,
    SKIPPED_MESSAGE,
};
pub use prompt::build_prompt;
pub use stream::{CompletionStream, StreamState};
pub use types::{ChatCompletionRequest, ChatMessage};
