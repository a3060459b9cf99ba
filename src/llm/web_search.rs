//! Web-search-augmented model client
//!
//! Runs a search query through an OpenAI model instructed to search the
//! web and cite sources. Reports `web_search` as its model identity; the
//! search model is pinned, so a per-step variant override is ignored,
//! but `max_tokens` and `temperature` are forwarded.

use crate::llm::openai::{classify_send_error, classify_status_error};
use crate::llm::retry::{self, RetryPolicy};
use crate::llm::{GenerationParams, LlmError, ProviderReply, Usage};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const SEARCH_MODEL: &str = "gpt-4o";
const SYSTEM_PROMPT: &str = "You are a helpful assistant with access to web search. \
    When answering, always cite your sources with URLs.";
const REQUEST_TIMEOUT_SECS: u64 = 180;

#[derive(Serialize)]
struct SearchRequest<'a> {
    model: &'a str,
    messages: Vec<SearchMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct SearchMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    choices: Vec<SearchChoice>,
    #[serde(default)]
    usage: Option<SearchUsage>,
}

#[derive(Deserialize)]
struct SearchChoice {
    message: SearchChoiceMessage,
}

#[derive(Deserialize)]
struct SearchChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct SearchUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl SearchUsage {
    fn into_map(self) -> Usage {
        let mut usage = Usage::new();
        usage.insert("input_tokens".to_string(), self.prompt_tokens);
        usage.insert("output_tokens".to_string(), self.completion_tokens);
        usage
    }
}

/// Client for web-search-augmented completions
pub struct WebSearchClient {
    api_key: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl WebSearchClient {
    pub fn new(api_key: String, retry: RetryPolicy) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            retry,
        }
    }

    /// Search for `query`, retrying transient failures.
    pub async fn search(
        &self,
        query: &str,
        params: &GenerationParams,
    ) -> Result<ProviderReply, LlmError> {
        if query.trim().is_empty() {
            return Err(LlmError::Api("Empty search query".to_string()));
        }
        retry::invoke_with_retry(&self.retry, "web search", || self.send_once(query, params))
            .await
    }

    async fn send_once(
        &self,
        query: &str,
        params: &GenerationParams,
    ) -> Result<ProviderReply, LlmError> {
        let request = SearchRequest {
            model: SEARCH_MODEL,
            messages: vec![
                SearchMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                SearchMessage {
                    role: "user",
                    content: format!("Search the web for information about: {query}"),
                },
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
            .map_err(|e| classify_send_error("web search", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status_error("web search", status, &body));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Api(format!("Failed to parse web search response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                LlmError::Api("Web search response contained no content".to_string())
            })?;

        Ok(ProviderReply {
            text,
            model: "web_search".to_string(),
            usage: parsed.usage.map(SearchUsage::into_map).unwrap_or_default(),
        })
    }
}
