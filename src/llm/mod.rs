//! Model provider abstraction layer
//!
//! Defines the common types shared by all provider clients and the
//! `ModelInvoker` capability trait the workflow engine is programmed
//! against. Production code uses [`router::ProviderRouter`]; tests
//! substitute scripted invokers.

pub use async_trait::async_trait;

pub mod anthropic;
pub mod openai;
pub mod retry;
pub mod router;
pub mod web_search;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Token usage reported by a provider, keyed by token kind.
///
/// Providers report different key sets (`prompt_tokens` /
/// `completion_tokens` for OpenAI, `input_tokens` / `output_tokens` for
/// Anthropic), so the counts are carried as an ordered map and passed
/// through untouched.
pub type Usage = BTreeMap<String, u64>;

/// The closed set of model identities a step can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// OpenAI chat completion models
    Chatgpt,
    /// Anthropic Claude models
    Claude,
    /// Web-search-augmented model
    WebSearch,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Chatgpt => "chatgpt",
            ModelKind::Claude => "claude",
            ModelKind::WebSearch => "web_search",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation parameters forwarded to a provider call.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GenerationParams {
    /// Provider-specific model variant (e.g. `gpt-4o`,
    /// `claude-3-opus-20240229`). Falls back to the client default.
    #[serde(default, rename = "model", alias = "model_variant")]
    pub model_variant: Option<String>,

    /// Maximum number of tokens in the response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Controls randomness (0-1)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model_variant: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Normalized result of one model invocation.
///
/// Both arms carry displayable text: on failure it is a user-facing
/// fallback message, so downstream consumers can render either arm
/// uniformly.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutcome {
    Success {
        /// The generated text
        text: String,
        /// The model identity the provider reported
        model: String,
        /// Token usage for the call
        usage: Usage,
    },
    Failure {
        /// The error message, surfaced verbatim
        error: String,
        /// User-facing fallback message
        text: String,
    },
}

impl InvocationOutcome {
    /// The displayable text for either arm.
    pub fn display_text(&self) -> &str {
        match self {
            InvocationOutcome::Success { text, .. } => text,
            InvocationOutcome::Failure { text, .. } => text,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InvocationOutcome::Success { .. })
    }
}

/// Error types for provider operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// API request error (HTTP failure, bad status, malformed body)
    #[error("API error: {0}")]
    Api(String),

    /// Configuration error (missing credentials etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Raw successful reply from a provider client, before normalization
/// into an [`InvocationOutcome`].
#[derive(Debug, Clone)]
pub struct ProviderReply {
    pub text: String,
    pub model: String,
    pub usage: Usage,
}

/// Capability object for invoking a named model.
///
/// The workflow engine owns no provider state; it receives one of these
/// and treats every call as an opaque call-and-result boundary. The
/// invoker owns retry/backoff, so an outcome returned here is terminal.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(
        &self,
        model: ModelKind,
        prompt: &str,
        params: &GenerationParams,
    ) -> InvocationOutcome;
}
