//! LLM provider abstraction.
//!
//! The assistant talks to its model through the [`LlmProvider`] trait so the
//! backend can be swapped (or faked in tests).

mod ollama;
mod provider;
mod types;

pub use ollama::OllamaProvider;
pub use provider::{CompletionOptions, LlmError, LlmProvider};
pub use types::{CompletionResponse, FinishReason, Message, MessageRole, ToolCall};
