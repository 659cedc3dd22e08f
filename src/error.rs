use thiserror::Error;

/// Failure of a model-backed collaborator (researcher, writer, reviewer).
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{provider} request failed with status {status}: {body}")]
    Provider {
        provider: String,
        status: u16,
        body: String,
    },
    #[error("{provider} transport error: {message}")]
    Transport { provider: String, message: String },
    #[error("malformed {role} response: {detail}")]
    Malformed { role: String, detail: String },
}

impl CollaboratorError {
    pub fn malformed(role: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Malformed {
            role: role.into(),
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Provider,
    Collaborator,
    Config,
    Input,
    Internal,
}

impl ErrorCategory {
    pub fn code(self) -> &'static str {
        match self {
            ErrorCategory::Provider => "PROVIDER",
            ErrorCategory::Collaborator => "COLLABORATOR",
            ErrorCategory::Config => "CONFIG",
            ErrorCategory::Input => "INPUT",
            ErrorCategory::Internal => "INTERNAL",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            ErrorCategory::Provider => {
                "Set provider credentials (for example ANTHROPIC_API_KEY or OPENAI_API_KEY) or run with --provider ollama."
            }
            ErrorCategory::Collaborator => {
                "The model returned an unusable response. Retry, or switch --model to a stronger model."
            }
            ErrorCategory::Config => {
                "Check --config-path, the selected --profile, and the skill directory passed with --skill-dir."
            }
            ErrorCategory::Input => "Run company-research --help and correct command arguments.",
            ErrorCategory::Internal => {
                "Retry with RUST_LOG=debug. If it persists, capture logs and open an issue."
            }
        }
    }
}

pub fn categorize_error(err: &anyhow::Error) -> ErrorCategory {
    for cause in err.chain() {
        if let Some(collab) = cause.downcast_ref::<CollaboratorError>() {
            return match collab {
                CollaboratorError::Malformed { .. } => ErrorCategory::Collaborator,
                CollaboratorError::Provider { .. } | CollaboratorError::Transport { .. } => {
                    ErrorCategory::Provider
                }
            };
        }
    }

    let msg = format!("{err:#}").to_ascii_lowercase();

    if msg.contains("tool steps") {
        return ErrorCategory::Collaborator;
    }

    if msg.contains("api_key") || msg.contains("no provider could be auto-detected") {
        return ErrorCategory::Provider;
    }

    // Profile file messages mention provider values; they are still config errors.
    if msg.contains("profile")
        || msg.contains("config")
        || msg.contains("skill.md")
        || msg.contains("frontmatter")
    {
        return ErrorCategory::Config;
    }

    if msg.contains("provider") {
        return ErrorCategory::Provider;
    }

    if msg.contains("invalid value")
        || msg.contains("unknown argument")
        || msg.contains("company name")
    {
        return ErrorCategory::Input;
    }

    ErrorCategory::Internal
}

pub fn format_cli_error(err: &anyhow::Error) -> String {
    let category = categorize_error(err);
    format!(
        "[{}] {}\nHint: {}",
        category.code(),
        redact_sensitive_text(&format!("{err:#}")),
        category.hint()
    )
}

/// Mask anything that looks like an API key (`sk-...`, `gsk_...`).
pub fn redact_sensitive_text(text: &str) -> String {
    text.split_inclusive(char::is_whitespace)
        .map(|token| {
            let word = token.trim_end();
            if looks_like_secret(word) {
                let trailing = &token[word.len()..];
                format!("[REDACTED]{trailing}")
            } else {
                token.to_string()
            }
        })
        .collect()
}

fn looks_like_secret(word: &str) -> bool {
    let word = word.trim_matches(|c: char| matches!(c, '"' | '\'' | ',' | ';' | '(' | ')'));
    (word.starts_with("sk-") || word.starts_with("gsk_")) && word.len() > 12
}
