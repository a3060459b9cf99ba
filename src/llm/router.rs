//! Provider router
//!
//! The production [`ModelInvoker`]: holds one client per provider,
//! credentialed from the environment once at construction, and
//! dispatches on [`ModelKind`]. Missing credentials surface as failure
//! outcomes on first use of the affected provider, so a run that never
//! touches it is unaffected.

use crate::llm::anthropic::AnthropicClient;
use crate::llm::openai::OpenAiClient;
use crate::llm::retry::RetryPolicy;
use crate::llm::web_search::WebSearchClient;
use crate::llm::{
    async_trait, GenerationParams, InvocationOutcome, LlmError, ModelInvoker, ModelKind,
    ProviderReply,
};
use std::env;

const GENERIC_FALLBACK: &str = "Sorry, I encountered an error while processing your request.";

/// Environment-credentialed router over the three provider clients
pub struct ProviderRouter {
    openai: Option<OpenAiClient>,
    anthropic: Option<AnthropicClient>,
    web_search: Option<WebSearchClient>,
}

impl ProviderRouter {
    /// Build the router from `OPENAI_API_KEY` / `ANTHROPIC_API_KEY`.
    ///
    /// Credentials are read once here; the workflow core never touches
    /// them.
    pub fn from_env(retry: RetryPolicy) -> Self {
        let openai_key = env::var("OPENAI_API_KEY").ok();
        let anthropic_key = env::var("ANTHROPIC_API_KEY").ok();

        Self {
            openai: openai_key
                .clone()
                .map(|key| OpenAiClient::new(key, retry.clone())),
            anthropic: anthropic_key.map(|key| AnthropicClient::new(key, retry.clone())),
            web_search: openai_key.map(|key| WebSearchClient::new(key, retry)),
        }
    }

    fn missing_key(var: &str, fallback: String) -> InvocationOutcome {
        InvocationOutcome::Failure {
            error: format!("{var} environment variable not set"),
            text: fallback,
        }
    }
}

fn into_outcome(result: Result<ProviderReply, LlmError>, fallback: String) -> InvocationOutcome {
    match result {
        Ok(reply) => InvocationOutcome::Success {
            text: reply.text,
            model: reply.model,
            usage: reply.usage,
        },
        Err(err) => InvocationOutcome::Failure {
            error: err.to_string(),
            text: fallback,
        },
    }
}

#[async_trait]
impl ModelInvoker for ProviderRouter {
    async fn invoke(
        &self,
        model: ModelKind,
        prompt: &str,
        params: &GenerationParams,
    ) -> InvocationOutcome {
        match model {
            ModelKind::Chatgpt => match &self.openai {
                Some(client) => {
                    into_outcome(client.complete(prompt, params).await, GENERIC_FALLBACK.into())
                }
                None => Self::missing_key("OPENAI_API_KEY", GENERIC_FALLBACK.into()),
            },
            ModelKind::Claude => match &self.anthropic {
                Some(client) => {
                    into_outcome(client.complete(prompt, params).await, GENERIC_FALLBACK.into())
                }
                None => Self::missing_key("ANTHROPIC_API_KEY", GENERIC_FALLBACK.into()),
            },
            ModelKind::WebSearch => match &self.web_search {
                Some(client) => {
                    let result = client.search(prompt, params).await;
                    let fallback = match &result {
                        Err(err) => format!("Error performing web search: {err}"),
                        Ok(_) => String::new(),
                    };
                    into_outcome(result, fallback)
                }
                None => Self::missing_key(
                    "OPENAI_API_KEY",
                    "Error performing web search: missing credentials".to_string(),
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Usage;

    #[test]
    fn success_reply_maps_to_success_outcome() {
        let reply = ProviderReply {
            text: "hi".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            usage: Usage::new(),
        };
        let outcome = into_outcome(Ok(reply), GENERIC_FALLBACK.into());
        assert!(outcome.is_success());
        assert_eq!(outcome.display_text(), "hi");
    }

    #[test]
    fn error_maps_to_failure_with_fallback_text() {
        let outcome = into_outcome(
            Err(LlmError::Api("server error 500".to_string())),
            GENERIC_FALLBACK.into(),
        );
        match outcome {
            InvocationOutcome::Failure { error, text } => {
                assert!(error.contains("server error 500"));
                assert_eq!(text, GENERIC_FALLBACK);
            }
            InvocationOutcome::Success { .. } => panic!("expected failure"),
        }
    }
}
