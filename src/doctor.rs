use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::cli::ResearcherMode;
use crate::config::RuntimeConfig;
use crate::provider::{detect_provider, env_present, provider_label, resolve_model_config};
use crate::skill::SkillLoader;

pub fn run_doctor(cfg: &RuntimeConfig) -> Result<()> {
    println!(
        "Active profile: '{}' (config: {})",
        cfg.profile, cfg.config_path
    );

    let checks = [
        ("ANTHROPIC_API_KEY", env_present("ANTHROPIC_API_KEY")),
        ("OPENAI_API_KEY", env_present("OPENAI_API_KEY")),
        ("DEEPSEEK_API_KEY", env_present("DEEPSEEK_API_KEY")),
        ("GROQ_API_KEY", env_present("GROQ_API_KEY")),
        ("OLLAMA_HOST", env_present("OLLAMA_HOST")),
    ];

    println!("Provider environment check:");
    for (key, ok) in checks {
        let status = if ok { "set" } else { "missing" };
        println!("- {key}: {status}");
    }

    match detect_provider() {
        Some(provider) => println!("Auto provider resolution: {}", provider_label(provider)),
        None => {
            println!("Auto provider resolution: none");
            println!("Tip: export one provider key or run with --provider ollama");
        }
    }

    match resolve_model_config(cfg) {
        Ok(model) => println!("Model: {} ({})", model.label(), model.base_url),
        Err(err) => println!("Model: unresolved ({err})"),
    }

    println!(
        "Pipeline: variant={:?} researcher={:?} max_iterations={} researcher_max_steps={}",
        cfg.variant, cfg.researcher, cfg.max_iterations, cfg.researcher_max_steps
    );
    println!(
        "Timeouts: request_secs={} script_secs={} max_tokens={}",
        cfg.request_timeout_secs, cfg.script_timeout_secs, cfg.max_tokens
    );

    match SkillLoader::load(&cfg.skill_dir, Duration::from_secs(cfg.script_timeout_secs)) {
        Ok(skill) => println!(
            "Skill: '{}' loaded from {}",
            skill.properties.name, cfg.skill_dir
        ),
        Err(err) if cfg.researcher == ResearcherMode::Agentic => {
            println!("Skill: error ({err:#})");
            println!("Tip: the agentic researcher needs --skill-dir pointing at a SKILL.md folder");
        }
        Err(_) => println!("Skill: not found at {} (only needed by --researcher agentic)", cfg.skill_dir),
    }

    if cfg.workspace_enabled {
        let exists = Path::new(&cfg.workspace_dir).is_dir();
        println!(
            "Workspace: {} ({})",
            cfg.workspace_dir,
            if exists { "exists" } else { "created on first run" }
        );
    } else {
        println!("Workspace: disabled");
    }

    Ok(())
}
