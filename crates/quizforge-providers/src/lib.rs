//! quizforge-providers: content generators and configuration.
//!
//! Implements the `LlmProvider` trait for OpenAI-compatible chat completions
//! and Google Gemini, plus a scripted mock for tests, and loads the
//! `quizforge.toml` configuration that selects between them.

pub mod config;
pub mod gemini;
mod http;
pub mod mock;
pub mod openai;

pub use config::{create_provider, load_config, ProviderConfig, QuizforgeConfig};
pub use quizforge_core::error::ProviderError;
