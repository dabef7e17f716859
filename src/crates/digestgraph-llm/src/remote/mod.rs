//! Remote LLM provider implementations.
//!
//! # Providers
//!
//! - **Claude** - Anthropic's Claude models
//! - **OpenAI** - OpenAI's chat-completions models

pub mod claude;
pub mod openai;

pub use claude::ClaudeClient;
pub use openai::OpenAiClient;
