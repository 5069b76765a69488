//! Trade decisions using the OpenAI chat-completion API
//!
//! Sends the full market context as the user message and asks for a JSON
//! object back. Single attempt with a fixed request timeout.

use crate::decision::DecisionEngine;
use crate::error::Error;
use crate::models::{Decision, TradeAction};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const MODEL: &str = "gpt-4o";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<Message>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAIDecisionEngine {
    api_key: String,
    client: reqwest::Client,
    api_url: String,
    model: String,
    timeout: Duration,
    system_prompt: String,
}

impl OpenAIDecisionEngine {
    pub fn new(api_key: String, system_prompt: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            api_url: OPENAI_API_URL.to_string(),
            model: MODEL.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            system_prompt,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl DecisionEngine for OpenAIDecisionEngine {
    async fn decide(&self, payload: &serde_json::Value) -> Result<Decision> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: self.system_prompt.clone(),
                },
                Message {
                    role: "user".to_string(),
                    content: serde_json::to_string(payload)?,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object".to_string(),
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", &self.api_key))
            .header("content-type", "application/json")
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Decision(format!("Network error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Decision(format!("OpenAI API error {}: {}", status, body)));
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| Error::Decision(format!("JSON decode error: {}", e)))?;

        let content = openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Decision("response contained no message content".to_string()))?;

        parse_decision(&content)
    }
}

/// Parse the assistant message into a decision
///
/// Markdown code fences around the JSON are tolerated. Only text that is not
/// a JSON object is a malformed decision; inside the object a `decision`
/// that is not one of the three labels is `Unknown` and a missing or
/// non-string `reason` is empty.
pub fn parse_decision(content: &str) -> Result<Decision> {
    let mut text = content.trim();

    // Strip markdown code blocks (```json ... ``` or ``` ... ```)
    if text.starts_with("```") {
        text = text
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
    }

    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| Error::MalformedDecision(format!("{} (text: {})", e, content)))?;

    let Some(object) = value.as_object() else {
        return Err(Error::MalformedDecision(format!(
            "expected a JSON object (text: {})",
            content
        )));
    };

    let action = object
        .get("decision")
        .and_then(|d| d.as_str())
        .map(TradeAction::from_label)
        .unwrap_or_default();
    let reason = object
        .get("reason")
        .and_then(|r| r.as_str())
        .unwrap_or_default()
        .to_string();

    Ok(Decision { action, reason })
}
