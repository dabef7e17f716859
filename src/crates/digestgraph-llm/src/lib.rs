//! The LLM Gateway: a concurrency-bounded, lazily-initialized front door to
//! a chat-completion provider, paired with a small set of response parsers
//! for the grammars the Prompt Registry declares.
//!
//! Construction never touches credentials or the network. Only
//! [`LlmGateway::complete`] (via [`LlmGateway::ensure_ready`]) does, and
//! only on its first call — see spec.md §4.5 and §9's lazy-client note.
//!
//! # Example
//!
//! ```rust,ignore
//! use digestgraph_llm::{LlmGateway, LlmGatewayConfig, LlmProvider};
//! use digestgraph_llm::{RenderedPrompt, CompletionOptions, NumericParser};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = LlmGateway::new(LlmGatewayConfig {
//!         provider: LlmProvider::Claude,
//!         ..Default::default()
//!     });
//!     let prompt = RenderedPrompt { system: "You are terse.".into(), user: "Score 0.8".into() };
//!     let parser = NumericParser { min: 0.0, max: 1.0 };
//!     let value = gateway.complete(prompt, &parser, CompletionOptions::default()).await?;
//!     println!("{value}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod remote;
pub mod types;

pub use config::RemoteLlmConfig;
pub use error::{LlmError, Result};
pub use gateway::{LlmGateway, LlmGatewayConfig, LlmProvider};
pub use remote::{ClaudeClient, OpenAiClient};
pub use types::{ChatModel, CompletionOptions, JsonParser, NumericParser, RenderedPrompt, ResponseParser};
