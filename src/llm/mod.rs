//! LLM client abstraction (C7 part 1).
//!
//! Provides a trait-based contract over LLM providers with a single,
//! already-rendered-prompt completion call, so the extractor doesn't need
//! to know which provider wiring backs a given model id.

pub mod anthropic;
pub mod openai_compat;

use async_trait::async_trait;

use crate::error::LlmError;

/// A single LLM completion call. `prompt` is the fully-rendered template
/// body; providers are not responsible for assembling context.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_ms: u64,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub finish_reason: String,
    pub latency_ms: u64,
}

/// Trait abstracting all LLM provider operations (spec.md §6). Retries and
/// backoff are the implementation's responsibility; the pipeline treats
/// any returned error as a terminal failure for that call.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
