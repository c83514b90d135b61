use crate::analyzer::{ChatCompletion, CompletionError};
use crate::config::ChatGptConfig;
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use tracing::debug;

/// OpenAI-compatible Chat Completions client
pub struct OpenAiClient {
    config: ChatGptConfig,
    client: reqwest::Client,
    spend: Mutex<Decimal>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<Value>,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl OpenAiClient {
    pub fn new(config: ChatGptConfig) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Transport(format!("HTTP client: {e}")))?;
        Ok(Self {
            config,
            client,
            spend: Mutex::new(Decimal::ZERO),
        })
    }

    /// Estimated USD spent by this client so far
    pub fn total_cost(&self) -> Decimal {
        *self.spend.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn build_request<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        json_mode: bool,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                Message { role: "system", content: system },
                Message { role: "user", content: user },
            ],
            temperature: self.config.resolved_temperature(),
            response_format: json_mode.then_some(ResponseFormat { kind: "json_object" }),
        }
    }

    /// Call the Chat Completions endpoint.
    /// Returns (response_text, estimated cost in USD)
    pub async fn call(
        &self,
        system: &str,
        user: &str,
        json_mode: bool,
    ) -> Result<(String, Decimal), CompletionError> {
        let api_key = match self.config.api_key.as_deref().map(str::trim) {
            Some(k) if !k.is_empty() => k,
            _ => return Err(CompletionError::NotConfigured),
        };

        let req = self.build_request(system, user, json_mode);

        let resp = self
            .client
            .post(self.config.completions_url())
            .header("Content-Type", "application/json")
            .bearer_auth(api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CompletionError::Transport(format!("reading body: {e}")))?;

        if !status.is_success() {
            return Err(CompletionError::Transport(format!(
                "OpenAI API {status}: {}",
                excerpt(&body)
            )));
        }

        let data: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            CompletionError::MalformedPayload(format!("{e} | body: {}", excerpt(&body)))
        })?;

        let text = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|content| extract_text(&content))
            .unwrap_or_default();

        if text.is_empty() {
            return Err(CompletionError::EmptyResponse);
        }

        let usage = data.usage.unwrap_or_default();
        let cost = estimate_cost(&self.config.model, usage.prompt_tokens, usage.completion_tokens);
        *self.spend.lock().unwrap_or_else(|e| e.into_inner()) += cost;

        debug!(
            "{}: {} tokens in, {} tokens out, ${cost}",
            self.config.model, usage.prompt_tokens, usage.completion_tokens
        );

        Ok((text, cost))
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        json_mode: bool,
    ) -> Result<String, CompletionError> {
        self.call(system, user, json_mode).await.map(|(text, _)| text)
    }
}

/// Message content is either a plain string or a list of content blocks.
fn extract_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.trim().to_string(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|b| {
                b.get("text")
                    .or_else(|| b.get("content"))
                    .and_then(Value::as_str)
            })
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(300).collect()
}

/// USD per token (input, output) by model family
fn token_prices(model: &str) -> (Decimal, Decimal) {
    match model {
        m if m.starts_with("gpt-5-nano") => (dec!(0.00000005), dec!(0.0000004)),
        m if m.starts_with("gpt-5-mini") => (dec!(0.00000025), dec!(0.000002)),
        m if m.starts_with("gpt-5") => (dec!(0.00000125), dec!(0.00001)),
        m if m.starts_with("gpt-4o-mini") => (dec!(0.00000015), dec!(0.0000006)),
        m if m.starts_with("gpt-4o") => (dec!(0.0000025), dec!(0.00001)),
        _ => (dec!(0.00000015), dec!(0.0000006)),
    }
}

fn estimate_cost(model: &str, input_tokens: u32, output_tokens: u32) -> Decimal {
    let (input_price, output_price) = token_prices(model);
    Decimal::from(input_tokens) * input_price + Decimal::from(output_tokens) * output_price
}
