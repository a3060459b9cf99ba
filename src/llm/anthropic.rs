//! Anthropic Claude client
//!
//! Client for the messages API. Shares the retry behavior and error
//! classification with the other provider clients.

use crate::llm::openai::{classify_send_error, classify_status_error};
use crate::llm::retry::{self, RetryPolicy};
use crate::llm::{GenerationParams, LlmError, ProviderReply, Usage};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
const REQUEST_TIMEOUT_SECS: u64 = 180;

#[derive(Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
    model: String,
    #[serde(default)]
    usage: Option<MessageUsage>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct MessageUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl MessageUsage {
    fn into_map(self) -> Usage {
        let mut usage = Usage::new();
        usage.insert("input_tokens".to_string(), self.input_tokens);
        usage.insert("output_tokens".to_string(), self.output_tokens);
        usage
    }
}

/// Client for the Anthropic messages API
pub struct AnthropicClient {
    api_key: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl AnthropicClient {
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
        retry::invoke_with_retry(&self.retry, "Anthropic", || {
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
        let request = MessageRequest {
            model,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            messages: vec![RequestMessage { role: "user", content: prompt }],
        };

        let response = self
            .client
            .post(API_URL)
            .header("X-Api-Key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_send_error("Anthropic", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status_error("Anthropic", status, &body));
        }

        let parsed: MessageResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Api(format!("Failed to parse Anthropic response: {e}")))?;

        let text: String = parsed
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect();
        if text.is_empty() {
            return Err(LlmError::Api(
                "Anthropic response contained no text content".to_string(),
            ));
        }

        Ok(ProviderReply {
            text,
            model: parsed.model,
            usage: parsed.usage.map(MessageUsage::into_map).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_concatenates_text_blocks() {
        let raw = r#"{
            "content": [
                {"type": "text", "text": "Hello"},
                {"type": "tool_use", "id": "x", "name": "n", "input": {}},
                {"type": "text", "text": " world"}
            ],
            "model": "claude-3-sonnet-20240229",
            "usage": {"input_tokens": 5, "output_tokens": 2}
        }"#;
        let parsed: MessageResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect();
        assert_eq!(text, "Hello world");
        let usage = parsed.usage.unwrap().into_map();
        assert_eq!(usage.get("input_tokens"), Some(&5));
        assert_eq!(usage.get("output_tokens"), Some(&2));
    }

    #[test]
    fn request_carries_single_user_message() {
        let request = MessageRequest {
            model: DEFAULT_MODEL,
            max_tokens: 1000,
            temperature: 0.7,
            messages: vec![RequestMessage { role: "user", content: "analyse this" }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["model"], DEFAULT_MODEL);
    }
}
