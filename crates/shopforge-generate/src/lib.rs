//! Page generation against an LLM completion provider.
//!
//! A [`GenerationRequest`] becomes a prompt ([`build_prompt`]), the prompt
//! goes to a [`CompletionProvider`], and the completion is run through
//! `shopforge_preview::extract` and the advisory check.
//!
//! ```no_run
//! use shopforge_generate::{GenerationRequest, Generator, PageType};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), shopforge_generate::GenerateError> {
//! let generator = Generator::from_env()?;
//! let generation = generator
//!     .generate(&GenerationRequest::new("Small-batch coffee roaster", PageType::Landing))
//!     .await?;
//! println!("{}", generation.source);
//! # Ok(())
//! # }
//! ```

/// OpenAI-compatible chat-completions client.
pub mod chat;
/// Provider and handler configuration.
pub mod config;
/// Public error types.
pub mod errors;
/// Generation handler.
pub mod handler;
/// User-prompt assembly.
pub mod prompt;
/// Completion provider contract.
pub mod provider;
/// Request and response types.
pub mod request;

pub use chat::ChatCompletionsProvider;
pub use config::GenerateConfig;
pub use errors::GenerateError;
pub use handler::{Generation, Generator};
pub use prompt::build_prompt;
pub use provider::{ChatMessage, ChatRole, CompletionProvider, CompletionRequest};
pub use request::{GenerationRequest, GenerationResponse, PageType};
