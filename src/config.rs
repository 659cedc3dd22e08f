use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::*;

pub const DEFAULT_MAX_ITERATIONS: u32 = 3;
pub const DEFAULT_WORKSPACE_DIR: &str = "./workspace";
pub const DEFAULT_SKILL_DIR: &str = "skills/company-researcher";
pub const DEFAULT_SCRIPT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_RESEARCHER_MAX_STEPS: usize = 10;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub profile: String,
    pub config_path: String,
    pub provider: Provider,
    pub model: Option<String>,
    pub variant: PipelineVariant,
    pub researcher: ResearcherMode,
    pub max_iterations: u32,
    pub researcher_max_steps: usize,
    pub workspace_enabled: bool,
    pub workspace_dir: String,
    pub skill_dir: String,
    pub script_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilesFile {
    #[serde(default)]
    pub profiles: HashMap<String, ProfileConfig>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub variant: Option<PipelineVariant>,
    pub researcher: Option<ResearcherMode>,
    pub max_iterations: Option<u32>,
    pub researcher_max_steps: Option<usize>,
    pub workspace_enabled: Option<bool>,
    pub workspace_dir: Option<String>,
    pub skill_dir: Option<String>,
    pub script_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_tokens: Option<u32>,
}

pub fn load_profiles(config_path: &str) -> Result<ProfilesFile> {
    let path = Path::new(config_path);
    if !path.exists() {
        return Ok(ProfilesFile::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile config file at '{}'", path.display()))?;
    toml::from_str::<ProfilesFile>(&content).with_context(|| {
        format!(
            "invalid profile configuration in '{}'. Check provider/variant values and field names.",
            path.display()
        )
    })
}

fn select_profile(cli: &Cli, profiles: &ProfilesFile) -> Result<ProfileConfig> {
    let selected = cli.profile.trim();
    if selected.is_empty() {
        return Err(anyhow::anyhow!(
            "profile name cannot be empty. Set --profile <name>."
        ));
    }

    if selected == "default" && !profiles.profiles.contains_key("default") {
        return Ok(ProfileConfig::default());
    }

    profiles.profiles.get(selected).cloned().ok_or_else(|| {
        let mut names = profiles.profiles.keys().cloned().collect::<Vec<String>>();
        names.sort();
        if names.is_empty() {
            anyhow::anyhow!(
                "profile '{}' not found in '{}'. No profiles are defined yet.",
                selected,
                cli.config_path
            )
        } else {
            anyhow::anyhow!(
                "profile '{}' not found in '{}'. Available profiles: {}",
                selected,
                cli.config_path,
                names.join(", ")
            )
        }
    })
}

/// Merge CLI flags over the selected profile over built-in defaults.
pub fn resolve_runtime_config(cli: &Cli, profiles: &ProfilesFile) -> Result<RuntimeConfig> {
    let profile = select_profile(cli, profiles)?;

    let provider = if cli.provider != Provider::Auto {
        cli.provider
    } else {
        profile.provider.unwrap_or(Provider::Auto)
    };

    Ok(RuntimeConfig {
        profile: cli.profile.trim().to_string(),
        config_path: cli.config_path.clone(),
        provider,
        model: cli.model.clone().or(profile.model),
        variant: cli
            .variant
            .or(profile.variant)
            .unwrap_or(PipelineVariant::Loop),
        researcher: cli
            .researcher
            .or(profile.researcher)
            .unwrap_or(ResearcherMode::Search),
        max_iterations: cli
            .max_iterations
            .or(profile.max_iterations)
            .unwrap_or(DEFAULT_MAX_ITERATIONS),
        researcher_max_steps: profile
            .researcher_max_steps
            .unwrap_or(DEFAULT_RESEARCHER_MAX_STEPS)
            .max(1),
        workspace_enabled: !cli.no_workspace && profile.workspace_enabled.unwrap_or(true),
        workspace_dir: cli
            .workspace_dir
            .clone()
            .or(profile.workspace_dir)
            .unwrap_or_else(|| DEFAULT_WORKSPACE_DIR.to_string()),
        skill_dir: cli
            .skill_dir
            .clone()
            .or(profile.skill_dir)
            .unwrap_or_else(|| DEFAULT_SKILL_DIR.to_string()),
        script_timeout_secs: cli
            .script_timeout_secs
            .or(profile.script_timeout_secs)
            .unwrap_or(DEFAULT_SCRIPT_TIMEOUT_SECS)
            .max(1),
        request_timeout_secs: cli
            .request_timeout_secs
            .or(profile.request_timeout_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
            .max(1),
        max_tokens: cli
            .max_tokens
            .or(profile.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS)
            .max(256),
    })
}
