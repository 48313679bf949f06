//! code-narrator-rs: code-to-audio narration service.
//!
//! Converts source code into a spoken summary in two stages, each backed
//! by an ordered fallback chain that degrades instead of failing:
//! - `describer`: remote instruct API → local Ollama instruct → local
//!   Ollama base → rule-based extraction
//! - `speech`: Kokoro neural TTS → OS speech engine → algorithmic
//!   synthesis → pure tones
//!
//! The `pipeline` composes both stages per request and `server` exposes
//! them over HTTP, reporting which tier actually produced each result.

pub mod chain;
pub mod config;
pub mod describer;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod speech;
