use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;

use company_research::agents::researcher::{AgenticResearcher, SearchResearcher};
use company_research::agents::reviewer::LlmReviewer;
use company_research::agents::writer::LlmWriter;
use company_research::agents::Researcher;
use company_research::cli::{Cli, Commands, ResearcherMode, command_label};
use company_research::config::{RuntimeConfig, load_profiles, resolve_runtime_config};
use company_research::doctor::run_doctor;
use company_research::error::{categorize_error, format_cli_error};
use company_research::llm::{HttpLlmClient, LlmClient};
use company_research::pipeline::{PipelineConfig, ResearchPipeline};
use company_research::provider::resolve_model_config;
use company_research::report::render_report;
use company_research::search::web_search;
use company_research::skill::SkillLoader;
use company_research::workspace::{DumpSink, NullSink, Workspace};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(err) = run_cli(cli).await {
        eprintln!("{}", format_cli_error(&err));
        tracing::error!(category = %categorize_error(&err).code(), error = %err, "command failed");
        std::process::exit(1);
    }

    Ok(())
}

async fn run_cli(cli: Cli) -> Result<()> {
    init_tracing(&cli.log_filter)?;
    let profiles = load_profiles(&cli.config_path)?;
    let cfg = resolve_runtime_config(&cli, &profiles)?;
    tracing::debug!(command = command_label(cli.command.as_ref()), profile = %cfg.profile, "Resolved configuration");

    match cli.command.as_ref() {
        Some(Commands::Search { query }) => {
            println!("{}", web_search(&query.join(" ")));
        }
        Some(Commands::Doctor) => run_doctor(&cfg)?,
        None | Some(Commands::Research { .. }) => {
            let company = cli.requested_company();
            run_research(&cfg, &company).await?;
        }
    }

    Ok(())
}

async fn run_research(cfg: &RuntimeConfig, company: &str) -> Result<()> {
    let model = resolve_model_config(cfg)?;
    tracing::info!(model = %model.label(), variant = ?cfg.variant, researcher = ?cfg.researcher, "Using model");
    let llm: Arc<dyn LlmClient> = Arc::new(HttpLlmClient::new(model)?);

    let researcher: Arc<dyn Researcher> = match cfg.researcher {
        ResearcherMode::Search => Arc::new(SearchResearcher::new(llm.clone())),
        ResearcherMode::Agentic => {
            let skill = SkillLoader::load(
                &cfg.skill_dir,
                Duration::from_secs(cfg.script_timeout_secs),
            )
            .with_context(|| format!("failed to load skill from '{}'", cfg.skill_dir))?;
            Arc::new(AgenticResearcher::new(
                llm.clone(),
                skill,
                cfg.researcher_max_steps,
            ))
        }
    };

    let sink: Arc<dyn DumpSink> = if cfg.workspace_enabled {
        Arc::new(Workspace::create(&cfg.workspace_dir)?)
    } else {
        Arc::new(NullSink)
    };

    let pipeline = ResearchPipeline::new(
        PipelineConfig {
            variant: cfg.variant,
            max_iterations: cfg.max_iterations,
        },
        researcher,
        Arc::new(LlmWriter::new(llm.clone())),
        Arc::new(LlmReviewer::new(llm)),
        sink,
    );

    let outcome = pipeline.run(company).await?;
    print!("{}", render_report(&outcome));
    Ok(())
}

fn init_tracing(log_filter: &str) -> Result<()> {
    let level = log_filter
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_env_filter(log_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}
