//! Text-Generation Providers
//!
//! The executive summary step can use a language model when one is configured.
//! Everything here sits behind the [`LLMClient`] trait, and callers must keep
//! working when no client is available.
//!
//! # Supported Providers
//!
//! Enable providers via Cargo features:
//! - `ollama` - Local Ollama server
//! - `openai` - OpenAI or any compatible chat-completions endpoint
//!
//! # Example
//!
//! ```ignore
//! use repurpose::llm::Provider;
//!
//! let provider = Provider::Ollama {
//!     base_url: "http://localhost:11434".to_string(),
//!     model: "llama3.2".to_string(),
//! };
//! let client = provider.create_client()?;
//! let reply = client.generate("Summarize the Metformin patent landscape").await?;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{LLMClient, Provider};
