use anyhow::{Context, Result};

use crate::cli::Provider;
use crate::config::RuntimeConfig;

/// Explicit model selection handed to the pipeline. Resolved once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub provider: Provider,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl ModelConfig {
    pub fn label(&self) -> String {
        format!("{}/{}", provider_label(self.provider), self.model)
    }
}

pub fn provider_label(provider: Provider) -> &'static str {
    match provider {
        Provider::Auto => "auto",
        Provider::Anthropic => "anthropic",
        Provider::Openai => "openai",
        Provider::Deepseek => "deepseek",
        Provider::Groq => "groq",
        Provider::Ollama => "ollama",
    }
}

pub fn validate_model_for_provider(provider: Provider, model_name: &str) -> Result<()> {
    let is_valid = match provider {
        Provider::Openai => {
            model_name.starts_with("gpt-")
                || model_name.starts_with("o1")
                || model_name.starts_with("o3")
                || model_name.starts_with("o4")
        }
        Provider::Anthropic => model_name.starts_with("claude"),
        Provider::Deepseek => model_name.starts_with("deepseek"),
        Provider::Groq => !model_name.trim().is_empty(),
        Provider::Ollama => !model_name.trim().is_empty(),
        Provider::Auto => true,
    };

    if is_valid {
        return Ok(());
    }

    Err(anyhow::anyhow!(
        "model '{}' is not compatible with provider '{}'",
        model_name,
        provider_label(provider)
    ))
}

fn default_model(provider: Provider) -> &'static str {
    match provider {
        Provider::Anthropic => "claude-sonnet-4-20250514",
        Provider::Openai => "gpt-4o",
        Provider::Deepseek => "deepseek-chat",
        Provider::Groq => "llama-3.3-70b-versatile",
        Provider::Ollama => "llama3.1",
        Provider::Auto => "",
    }
}

fn default_base_url(provider: Provider) -> &'static str {
    match provider {
        Provider::Anthropic => "https://api.anthropic.com/v1",
        Provider::Openai => "https://api.openai.com/v1",
        Provider::Deepseek => "https://api.deepseek.com/v1",
        Provider::Groq => "https://api.groq.com/openai/v1",
        Provider::Ollama => "http://localhost:11434/v1",
        Provider::Auto => "",
    }
}

fn api_key_env(provider: Provider) -> Option<&'static str> {
    match provider {
        Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
        Provider::Openai => Some("OPENAI_API_KEY"),
        Provider::Deepseek => Some("DEEPSEEK_API_KEY"),
        Provider::Groq => Some("GROQ_API_KEY"),
        Provider::Ollama | Provider::Auto => None,
    }
}

/// Resolve the model configuration using the process environment.
pub fn resolve_model_config(cfg: &RuntimeConfig) -> Result<ModelConfig> {
    resolve_model_config_with(cfg, |key| std::env::var(key).ok())
}

/// Resolve the model configuration against an arbitrary environment lookup.
pub fn resolve_model_config_with<F>(cfg: &RuntimeConfig, env: F) -> Result<ModelConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let present = |key: &str| env(key).is_some_and(|v| !v.trim().is_empty());

    let provider = match cfg.provider {
        Provider::Auto => detect_provider_with(&present).context(
            "no provider could be auto-detected. Set one of ANTHROPIC_API_KEY, OPENAI_API_KEY, \
             DEEPSEEK_API_KEY, GROQ_API_KEY, OLLAMA_HOST, or use --provider ollama",
        )?,
        p => p,
    };

    let api_key = match api_key_env(provider) {
        Some(key) => {
            let value = env(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| {
                    format!("{key} is required for {} provider", provider_label(provider))
                })?;
            Some(value)
        }
        None => None,
    };

    let base_url = match provider {
        Provider::Ollama => env("OLLAMA_HOST")
            .filter(|v| !v.trim().is_empty())
            .map(|host| format!("{}/v1", host.trim_end_matches('/')))
            .unwrap_or_else(|| default_base_url(provider).to_string()),
        _ => default_base_url(provider).to_string(),
    };

    let model = cfg
        .model
        .clone()
        .unwrap_or_else(|| default_model(provider).to_string());
    validate_model_for_provider(provider, &model)?;

    Ok(ModelConfig {
        provider,
        model,
        api_key,
        base_url,
        max_tokens: cfg.max_tokens,
        request_timeout_secs: cfg.request_timeout_secs,
    })
}

pub fn detect_provider() -> Option<Provider> {
    detect_provider_with(&env_present)
}

pub fn detect_provider_with(present: &dyn Fn(&str) -> bool) -> Option<Provider> {
    if present("ANTHROPIC_API_KEY") {
        return Some(Provider::Anthropic);
    }
    if present("OPENAI_API_KEY") {
        return Some(Provider::Openai);
    }
    if present("DEEPSEEK_API_KEY") {
        return Some(Provider::Deepseek);
    }
    if present("GROQ_API_KEY") {
        return Some(Provider::Groq);
    }
    if present("OLLAMA_HOST") {
        return Some(Provider::Ollama);
    }
    None
}

pub fn env_present(key: &str) -> bool {
    std::env::var(key)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
}
