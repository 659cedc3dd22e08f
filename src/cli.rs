use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

pub const DEFAULT_COMPANY: &str = "Apple";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Auto,
    Anthropic,
    Openai,
    Deepseek,
    Groq,
    Ollama,
}

/// How the summary is produced once facts exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineVariant {
    /// Gate + review + rewrite loop bounded by --max-iterations.
    Loop,
    /// Researcher -> writer -> single review, no rewrites.
    Chain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearcherMode {
    /// One model call over a targeted mock search report.
    Search,
    /// Tool-using researcher driven by the company-researcher skill.
    Agentic,
}

const CLI_EXAMPLES: &str = "Examples:\n\
  company-research\n\
  company-research Tesla\n\
  company-research --provider openai --model gpt-4o Nvidia\n\
  company-research --variant chain --researcher agentic Apple\n\
  company-research --max-iterations 5 --workspace-dir ./workspace research Tesla\n\
  company-research search \"Nvidia data center revenue\"\n\
  company-research doctor\n\
\n\
Provider selection:\n\
  - --provider auto picks the first of ANTHROPIC_API_KEY, OPENAI_API_KEY, DEEPSEEK_API_KEY,\n\
    GROQ_API_KEY, OLLAMA_HOST found in the environment.\n\
  - Profiles in .company-research/config.toml supply defaults; flags override them.";

#[derive(Debug, Parser)]
#[command(name = "company-research")]
#[command(about = "Research a company, write an analyst summary, and review it until it passes")]
#[command(after_long_help = CLI_EXAMPLES)]
pub struct Cli {
    /// Company to research when no subcommand is given
    pub company: Option<String>,

    #[arg(long, global = true, env = "COMPANY_RESEARCH_PROVIDER", value_enum, default_value_t = Provider::Auto)]
    pub provider: Provider,

    #[arg(long, global = true, env = "COMPANY_RESEARCH_MODEL")]
    pub model: Option<String>,

    #[arg(long, global = true, env = "COMPANY_RESEARCH_PROFILE", default_value = "default")]
    pub profile: String,

    #[arg(
        long,
        global = true,
        env = "COMPANY_RESEARCH_CONFIG",
        default_value = ".company-research/config.toml"
    )]
    pub config_path: String,

    #[arg(long, global = true, env = "COMPANY_RESEARCH_VARIANT", value_enum)]
    pub variant: Option<PipelineVariant>,

    #[arg(long, global = true, env = "COMPANY_RESEARCH_RESEARCHER", value_enum)]
    pub researcher: Option<ResearcherMode>,

    #[arg(long, global = true, env = "COMPANY_RESEARCH_MAX_ITERATIONS")]
    pub max_iterations: Option<u32>,

    #[arg(long, global = true, env = "COMPANY_RESEARCH_WORKSPACE_DIR")]
    pub workspace_dir: Option<String>,

    #[arg(long, global = true, default_value_t = false)]
    pub no_workspace: bool,

    #[arg(long, global = true, env = "COMPANY_RESEARCH_SKILL_DIR")]
    pub skill_dir: Option<String>,

    #[arg(long, global = true, env = "COMPANY_RESEARCH_SCRIPT_TIMEOUT_SECS")]
    pub script_timeout_secs: Option<u64>,

    #[arg(long, global = true, env = "COMPANY_RESEARCH_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    #[arg(long, global = true, env = "COMPANY_RESEARCH_MAX_TOKENS")]
    pub max_tokens: Option<u32>,

    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    pub log_filter: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Run the research pipeline for a company and print the report")]
    Research {
        /// Company to research
        company: Option<String>,
    },
    #[command(about = "Run the mock search tool and print its report")]
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    #[command(about = "Validate provider environment, profile, skill and workspace configuration")]
    Doctor,
}

impl Cli {
    /// Company requested either positionally or via `research`, trimmed.
    pub fn requested_company(&self) -> String {
        let raw = match &self.command {
            Some(Commands::Research { company }) => company.as_deref(),
            _ => self.company.as_deref(),
        };
        raw.map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_COMPANY)
            .to_string()
    }
}

pub fn command_label(command: Option<&Commands>) -> &'static str {
    match command {
        None | Some(Commands::Research { .. }) => "research",
        Some(Commands::Search { .. }) => "search",
        Some(Commands::Doctor) => "doctor",
    }
}
