//! OpenAI ChatGPT client
//!
//! Thin client for the chat completions endpoint. Owns its retry loop
//! via [`retry::invoke_with_retry`]; the workflow layer sees a single
//! terminal result per call.

use crate::llm::retry::{self, RetryPolicy};
use crate::llm::{GenerationParams, LlmError, ProviderReply, Usage};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const REQUEST_TIMEOUT_SECS: u64 = 180;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    model: String,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

impl ChatUsage {
    fn into_map(self) -> Usage {
        let mut usage = Usage::new();
        usage.insert("prompt_tokens".to_string(), self.prompt_tokens);
        usage.insert("completion_tokens".to_string(), self.completion_tokens);
        usage.insert("total_tokens".to_string(), self.total_tokens);
        usage
    }
}

/// Client for OpenAI chat completions
pub struct OpenAiClient {
    api_key: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl OpenAiClient {
    pub fn new(api_key: String, retry: RetryPolicy) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            retry,
        }
    }

    /// Send one prompt and return the reply, retrying transient failures.
    pub async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderReply, LlmError> {
        let model = params.model_variant.as_deref().unwrap_or(DEFAULT_MODEL);
        retry::invoke_with_retry(&self.retry, "OpenAI", || {
            self.send_once(model, prompt, params)
        })
        .await
    }

    async fn send_once(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderReply, LlmError> {
        let request = ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        let response = self
            .client
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_send_error("OpenAI", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status_error("OpenAI", status, &body));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Api(format!("Failed to parse OpenAI response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Api("OpenAI response contained no content".to_string()))?;

        Ok(ProviderReply {
            text,
            model: parsed.model,
            usage: parsed.usage.map(ChatUsage::into_map).unwrap_or_default(),
        })
    }
}

/// Map a transport-level failure to a message the transient classifier
/// can recognize.
pub(crate) fn classify_send_error(provider: &str, err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Api(format!("{provider} request timeout: {err}"))
    } else {
        LlmError::Api(format!("{provider} network error: {err}"))
    }
}

/// Map a non-success HTTP status to a classifiable message.
pub(crate) fn classify_status_error(
    provider: &str,
    status: reqwest::StatusCode,
    body: &str,
) -> LlmError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        LlmError::Api(format!("{provider} rate limit exceeded (429): {body}"))
    } else if status.is_server_error() {
        LlmError::Api(format!("{provider} server error {status}: {body}"))
    } else {
        LlmError::Api(format!("{provider} API error {status}: {body}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::retry::is_transient;

    #[test]
    fn status_errors_classify_as_expected() {
        let rate_limited = classify_status_error(
            "OpenAI",
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            "slow down",
        );
        assert!(is_transient(&rate_limited.to_string()));

        let unavailable =
            classify_status_error("OpenAI", reqwest::StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(is_transient(&unavailable.to_string()));

        let unauthorized =
            classify_status_error("OpenAI", reqwest::StatusCode::UNAUTHORIZED, "bad key");
        assert!(!is_transient(&unauthorized.to_string()));
    }

    #[test]
    fn request_serializes_system_then_user() {
        let request = ChatCompletionRequest {
            model: DEFAULT_MODEL,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: "hello" },
            ],
            max_tokens: 1000,
            temperature: 0.7,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
        assert_eq!(json["max_tokens"], 1000);
    }

    #[test]
    fn usage_maps_openai_token_kinds() {
        let usage = ChatUsage {
            prompt_tokens: 12,
            completion_tokens: 34,
            total_tokens: 46,
        }
        .into_map();
        assert_eq!(usage.get("prompt_tokens"), Some(&12));
        assert_eq!(usage.get("completion_tokens"), Some(&34));
        assert_eq!(usage.get("total_tokens"), Some(&46));
    }
}
