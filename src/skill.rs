/// Agent skill loader with progressive disclosure.
///
/// The researcher sees only the skill's metadata up front. It pulls the full
/// instructions, references, assets and script output through tool calls, and
/// every access is recorded so a run can report how much of the skill it used.
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

pub const SKILL_FILE: &str = "SKILL.md";

#[derive(Debug, Clone, Deserialize)]
pub struct SkillProperties {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SkillTracker {
    pub skill_read: bool,
    pub references_read: Vec<String>,
    pub scripts_executed: Vec<String>,
    pub tools_called: Vec<String>,
    pub expected_references: Vec<String>,
    pub expected_scripts: Vec<String>,
    pub expected_tools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageScores {
    pub skill_trigger: f64,
    pub reference_coverage: f64,
    pub script_coverage: f64,
    pub tool_coverage: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillReport {
    pub skill_read: bool,
    pub references_read: Vec<String>,
    pub references_missed: Vec<String>,
    pub scripts_executed: Vec<String>,
    pub scripts_missed: Vec<String>,
    pub tools_called: Vec<String>,
    pub tools_missed: Vec<String>,
    pub scores: CoverageScores,
}

impl SkillTracker {
    pub fn company_researcher() -> Self {
        Self {
            expected_references: vec![
                "output-schema.md".to_string(),
                "search-strategies.md".to_string(),
                "quality-checklist.md".to_string(),
                "assets/sector-taxonomy.json".to_string(),
            ],
            expected_scripts: vec!["validate_sources.py".to_string()],
            expected_tools: vec!["check_structure".to_string()],
            ..Self::default()
        }
    }

    pub fn report(&self) -> SkillReport {
        let references_missed = missed(&self.expected_references, &self.references_read);
        let scripts_missed = missed(&self.expected_scripts, &self.scripts_executed);
        let tools_missed = missed(&self.expected_tools, &self.tools_called);

        let total_expected = 1
            + self.expected_references.len()
            + self.expected_scripts.len()
            + self.expected_tools.len();
        let total_missed = usize::from(!self.skill_read)
            + references_missed.len()
            + scripts_missed.len()
            + tools_missed.len();

        SkillReport {
            skill_read: self.skill_read,
            references_read: self.references_read.clone(),
            scripts_executed: self.scripts_executed.clone(),
            tools_called: self.tools_called.clone(),
            scores: CoverageScores {
                skill_trigger: if self.skill_read { 1.0 } else { 0.0 },
                reference_coverage: coverage(&self.expected_references, &references_missed),
                script_coverage: coverage(&self.expected_scripts, &scripts_missed),
                tool_coverage: coverage(&self.expected_tools, &tools_missed),
                overall: (total_expected - total_missed) as f64 / total_expected as f64,
            },
            references_missed,
            scripts_missed,
            tools_missed,
        }
    }
}

fn push_once(seen: &mut Vec<String>, item: &str) {
    if !seen.iter().any(|existing| existing == item) {
        seen.push(item.to_string());
    }
}

fn missed(expected: &[String], seen: &[String]) -> Vec<String> {
    expected
        .iter()
        .filter(|item| !seen.contains(item))
        .cloned()
        .collect()
}

/// Share of `expected` that was actually used. Extra accesses do not count.
fn coverage(expected: &[String], missed: &[String]) -> f64 {
    if expected.is_empty() {
        1.0
    } else {
        (expected.len() - missed.len()) as f64 / expected.len() as f64
    }
}

pub struct SkillLoader {
    pub dir: PathBuf,
    pub properties: SkillProperties,
    script_timeout: Duration,
    tracker: Mutex<SkillTracker>,
}

/// Split `---\n<yaml>\n---\n<body>` into its two halves.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let rest = content.trim_start().strip_prefix("---")?;
    let end = rest.find("\n---")?;
    let yaml = &rest[..end];
    let body = rest[end + 4..].trim_start_matches(['-', '\r', '\n']);
    Some((yaml, body))
}

impl SkillLoader {
    pub fn load(dir: impl AsRef<Path>, script_timeout: Duration) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let skill_md = dir.join(SKILL_FILE);
        if !skill_md.exists() {
            return Err(anyhow::anyhow!(
                "no SKILL.md found in skill directory '{}'",
                dir.display()
            ));
        }

        let content = std::fs::read_to_string(&skill_md)
            .with_context(|| format!("failed to read '{}'", skill_md.display()))?;
        let (yaml, _) = split_frontmatter(&content).with_context(|| {
            format!("SKILL.md frontmatter missing in '{}'", skill_md.display())
        })?;
        let properties = serde_yaml::from_str::<SkillProperties>(yaml)
            .with_context(|| format!("invalid SKILL.md frontmatter in '{}'", skill_md.display()))?;

        if properties.name.trim().is_empty() || properties.description.trim().is_empty() {
            tracing::warn!(
                path = %skill_md.display(),
                "skill frontmatter should define both name and description"
            );
        }
        tracing::info!(skill = %properties.name, "Loaded skill metadata");

        Ok(Self {
            dir,
            properties,
            script_timeout,
            tracker: Mutex::new(SkillTracker::company_researcher()),
        })
    }

    pub fn metadata_prompt(&self) -> String {
        format!(
            "Available skill: {}\nDescription: {}\nTo use this skill, call read_skill_instructions to load full instructions.",
            self.properties.name, self.properties.description
        )
    }

    pub fn report(&self) -> SkillReport {
        self.with_tracker(|tracker| tracker.report())
    }

    pub fn record_tool_call(&self, tool: &str) {
        self.with_tracker(|tracker| push_once(&mut tracker.tools_called, tool));
    }

    fn with_tracker<T>(&self, f: impl FnOnce(&mut SkillTracker) -> T) -> T {
        let mut guard = self.tracker.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Full SKILL.md body without frontmatter.
    pub fn read_skill(&self) -> String {
        let path = self.dir.join(SKILL_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => return format!("Failed to read {SKILL_FILE}: {err}"),
        };
        self.with_tracker(|tracker| tracker.skill_read = true);
        tracing::info!(skill = %self.properties.name, "Agent read skill");
        let body = split_frontmatter(&content).map(|(_, body)| body.trim().to_string());
        body.unwrap_or(content)
    }

    pub fn read_reference(&self, name: &str) -> String {
        let folder = self.dir.join("references");
        match read_named_file(&folder, name) {
            Some(content) => {
                self.with_tracker(|tracker| push_once(&mut tracker.references_read, name));
                tracing::info!(reference = name, "Agent read reference");
                content
            }
            None => format!(
                "Reference '{name}' not found. Available: {:?}",
                list_files(&folder)
            ),
        }
    }

    pub fn read_asset(&self, name: &str) -> String {
        let folder = self.dir.join("assets");
        match read_named_file(&folder, name) {
            Some(content) => {
                self.with_tracker(|tracker| push_once(&mut tracker.references_read, &format!("assets/{name}")));
                tracing::info!(asset = name, "Agent read asset");
                content
            }
            None => format!(
                "Asset '{name}' not found. Available: {:?}",
                list_files(&folder)
            ),
        }
    }

    /// Execute a skill script with `input` on stdin. Only its output is returned.
    pub async fn run_script(&self, name: &str, input: &str) -> String {
        let folder = self.dir.join("scripts");
        let Some(path) = resolve_named_file(&folder, name) else {
            return format!(
                "Script '{name}' not found. Available: {:?}",
                list_files(&folder)
            );
        };

        self.with_tracker(|tracker| push_once(&mut tracker.scripts_executed, name));
        let outcome = run_script_with_timeout(&path, input, self.script_timeout).await;
        tracing::info!(script = name, "Agent executed script");

        match outcome {
            ScriptOutcome::Completed {
                success,
                stdout,
                stderr,
            } => {
                if success {
                    stdout
                } else {
                    format!("{stdout}\nSTDERR: {stderr}")
                }
            }
            ScriptOutcome::TimedOut => format!(
                "Script '{name}' timed out after {} seconds",
                self.script_timeout.as_secs()
            ),
            ScriptOutcome::LaunchFailed(err) => format!("Script '{name}' failed to start: {err}"),
        }
    }
}

#[derive(Debug)]
pub enum ScriptOutcome {
    Completed {
        success: bool,
        stdout: String,
        stderr: String,
    },
    TimedOut,
    LaunchFailed(String),
}

fn script_command(path: &Path) -> tokio::process::Command {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("py") => {
            let mut cmd = tokio::process::Command::new("python3");
            cmd.arg(path);
            cmd
        }
        Some("sh") => {
            let mut cmd = tokio::process::Command::new("sh");
            cmd.arg(path);
            cmd
        }
        _ => tokio::process::Command::new(path),
    }
}

pub async fn run_script_with_timeout(path: &Path, input: &str, timeout: Duration) -> ScriptOutcome {
    let mut cmd = script_command(path);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => return ScriptOutcome::LaunchFailed(err.to_string()),
    };

    let stdin = child.stdin.take();
    let feed = async move {
        if let Some(mut stdin) = stdin {
            // A script that ignores stdin may close it early; that is not a failure.
            let _ = stdin.write_all(input.as_bytes()).await;
        }
    };
    // Stdin is fed under the same deadline as the wait.
    let run = async move {
        let (_, output) = tokio::join!(feed, child.wait_with_output());
        output
    };

    match tokio::time::timeout(timeout, run).await {
        Ok(Ok(output)) => ScriptOutcome::Completed {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        },
        Ok(Err(err)) => ScriptOutcome::LaunchFailed(err.to_string()),
        Err(_) => ScriptOutcome::TimedOut,
    }
}

/// Resolve `name` inside `folder`, refusing anything that escapes it.
fn resolve_named_file(folder: &Path, name: &str) -> Option<PathBuf> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.contains("..") || Path::new(trimmed).is_absolute() {
        return None;
    }
    let path = folder.join(trimmed);
    path.is_file().then_some(path)
}

fn read_named_file(folder: &Path, name: &str) -> Option<String> {
    resolve_named_file(folder, name).and_then(|path| std::fs::read_to_string(path).ok())
}

pub fn list_files(folder: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(folder) else {
        return Vec::new();
    };
    let mut names = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect::<Vec<String>>();
    names.sort();
    names
}
