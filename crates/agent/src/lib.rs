//! Message generation for outreach channels.
//!
//! `llm` defines the model seam, `gemini` implements it against the Gemini REST
//! API, and `composer` wraps caller instructions in the per-channel templates
//! from `prompts`.

pub mod composer;
pub mod gemini;
pub mod llm;
pub mod prompts;

pub use composer::{ComposeError, MessageComposer};
pub use gemini::GeminiClient;
pub use llm::{LlmClient, LlmError, RetryPolicy};
