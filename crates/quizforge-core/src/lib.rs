//! quizforge-core: question allocation, scoring, and the generation engine.
//!
//! This crate defines the data model, the pure allocator and analyzer, and
//! the async plumbing that fills a plan through an LLM provider with
//! placeholder fallback.

pub mod allocator;
pub mod analyzer;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod feedback;
pub mod model;
pub mod parser;
pub mod report;
pub mod traits;
