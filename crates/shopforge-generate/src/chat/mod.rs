//! OpenAI-compatible chat-completions provider.

mod client;
mod transport;

pub use client::ChatCompletionsProvider;
