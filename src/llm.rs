use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::cli::Provider;
use crate::error::CollaboratorError;
use crate::models::Validate;
use crate::provider::{ModelConfig, provider_label};

pub const MAX_ERROR_BODY_CHARS: usize = 300;
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// A text-generation backend. One request at a time, no streaming.
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn name(&self) -> String;
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CollaboratorError>;
}

pub struct HttpLlmClient {
    config: ModelConfig,
    http: reqwest::Client,
}

impl HttpLlmClient {
    pub fn new(config: ModelConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to create HTTP client: {e}"))?;
        Ok(Self { config, http })
    }

    fn transport_error(&self, err: reqwest::Error) -> CollaboratorError {
        let message = if err.is_timeout() {
            format!(
                "request timed out after {}s",
                self.config.request_timeout_secs
            )
        } else {
            err.to_string()
        };
        CollaboratorError::Transport {
            provider: provider_label(self.config.provider).to_string(),
            message,
        }
    }

    async fn send(&self, url: String, body: Value) -> Result<Value, CollaboratorError> {
        let mut builder = self.http.post(&url).json(&body);
        builder = match (self.config.provider, self.config.api_key.as_deref()) {
            (Provider::Anthropic, Some(key)) => builder
                .header("x-api-key", key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            (_, Some(key)) => builder.bearer_auth(key),
            (_, None) => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;

        if !status.is_success() {
            return Err(provider_error(self.config.provider, status.as_u16(), &text));
        }

        serde_json::from_str::<Value>(&text)
            .map_err(|err| CollaboratorError::malformed("provider", err.to_string()))
    }
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    fn name(&self) -> String {
        self.config.label()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CollaboratorError> {
        let base = self.config.base_url.trim_end_matches('/');
        tracing::debug!(
            model = %self.config.label(),
            system_chars = request.system.len(),
            user_chars = request.user.len(),
            "sending completion request"
        );

        let text = match self.config.provider {
            Provider::Anthropic => {
                let body = serde_json::json!({
                    "model": self.config.model,
                    "max_tokens": self.config.max_tokens,
                    "system": request.system,
                    "messages": [{ "role": "user", "content": request.user }],
                });
                let value = self.send(format!("{base}/messages"), body).await?;
                extract_anthropic_text(&value)?
            }
            _ => {
                let body = serde_json::json!({
                    "model": self.config.model,
                    "max_tokens": self.config.max_tokens,
                    "messages": [
                        { "role": "system", "content": request.system },
                        { "role": "user", "content": request.user },
                    ],
                });
                let value = self.send(format!("{base}/chat/completions"), body).await?;
                extract_openai_text(&value)
            }
        };

        require_text(&text)
    }
}

/// Map a non-2xx response to a provider error with a bounded body.
pub fn provider_error(provider: Provider, status: u16, body: &str) -> CollaboratorError {
    CollaboratorError::Provider {
        provider: provider_label(provider).to_string(),
        status,
        body: truncate_chars(body, MAX_ERROR_BODY_CHARS),
    }
}

/// Concatenate the `text` blocks of an Anthropic Messages response.
pub fn extract_anthropic_text(value: &Value) -> Result<String, CollaboratorError> {
    let blocks = value
        .get("content")
        .cloned()
        .map(serde_json::from_value::<Vec<AnthropicContentBlock>>)
        .transpose()
        .map_err(|err| CollaboratorError::malformed("provider", err.to_string()))?
        .unwrap_or_default();
    Ok(blocks
        .into_iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text)
        .collect::<Vec<String>>()
        .join(""))
}

pub fn extract_openai_text(value: &Value) -> String {
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Trimmed model text, or `Malformed` when nothing is left.
pub fn require_text(text: &str) -> Result<String, CollaboratorError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CollaboratorError::malformed(
            "provider",
            "model returned no text content",
        ));
    }
    Ok(trimmed.to_string())
}

/// Deserialize a model response into `T`, salvaging fenced or embedded JSON,
/// then validate ranges. Anything unusable becomes `CollaboratorError::Malformed`.
pub fn parse_structured<T>(role: &str, content: &str) -> Result<T, CollaboratorError>
where
    T: DeserializeOwned + Validate,
{
    let mut candidates = Vec::new();
    push_unique(&mut candidates, content);
    if let Some(stripped) = strip_markdown_fences(content) {
        push_unique(&mut candidates, &stripped);
    }
    if let Some(object) = first_balanced_object(content) {
        push_unique(&mut candidates, &object);
    }

    let mut last_err = String::from("no JSON object found");
    for candidate in &candidates {
        match serde_json::from_str::<T>(candidate) {
            Ok(parsed) => {
                return parsed
                    .validate()
                    .map(|_| parsed)
                    .map_err(|detail| CollaboratorError::malformed(role, detail));
            }
            Err(err) => last_err = err.to_string(),
        }
    }

    Err(CollaboratorError::malformed(
        role,
        format!(
            "{last_err}; content: {}",
            truncate_chars(content, MAX_ERROR_BODY_CHARS)
        ),
    ))
}

/// Parse an untyped JSON object out of a model response.
pub fn parse_json_object(role: &str, content: &str) -> Result<Value, CollaboratorError> {
    let candidates = [
        Some(content.trim().to_string()),
        strip_markdown_fences(content),
        first_balanced_object(content),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(|candidate| serde_json::from_str::<Value>(&candidate).ok())
        .find(Value::is_object)
        .ok_or_else(|| {
            CollaboratorError::malformed(
                role,
                format!(
                    "expected a JSON object; content: {}",
                    truncate_chars(content, MAX_ERROR_BODY_CHARS)
                ),
            )
        })
}

fn push_unique(candidates: &mut Vec<String>, candidate: &str) {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return;
    }
    if !candidates.iter().any(|existing| existing == trimmed) {
        candidates.push(trimmed.to_string());
    }
}

fn strip_markdown_fences(content: &str) -> Option<String> {
    let trimmed = content.trim();
    let start = trimmed.find("```")?;
    let after_open = &trimmed[start + 3..];
    let body_start = after_open.find('\n').map(|idx| idx + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim().to_string())
}

fn first_balanced_object(content: &str) -> Option<String> {
    let start = content.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in content[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(content[start..end].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out = text.chars().take(max_chars).collect::<String>();
    out.push_str("...");
    out
}
