use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

/// Receives intermediate artifacts for post-hoc inspection. Never read by the pipeline.
pub trait DumpSink: Send + Sync {
    fn run_id(&self) -> &str;
    fn dump(&self, name: &str, value: &Value);
}

pub struct NullSink;

impl DumpSink for NullSink {
    fn run_id(&self) -> &str {
        "none"
    }

    fn dump(&self, _name: &str, _value: &Value) {}
}

/// Flat-file dump directory: `{root}/{run_id}/{name}.json`.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub run_id: String,
    pub run_dir: PathBuf,
}

pub fn new_run_id() -> String {
    format!(
        "{}_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S"),
        std::process::id()
    )
}

impl Workspace {
    pub fn create(root: impl AsRef<Path>) -> Result<Self> {
        Self::create_with_run_id(root, new_run_id())
    }

    pub fn create_with_run_id(root: impl AsRef<Path>, run_id: String) -> Result<Self> {
        let run_dir = root.as_ref().join(&run_id);
        std::fs::create_dir_all(&run_dir).with_context(|| {
            format!("failed to create workspace directory '{}'", run_dir.display())
        })?;
        tracing::info!(path = %run_dir.display(), "Workspace ready");
        Ok(Self { run_id, run_dir })
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.run_dir.join(format!("{name}.json"))
    }

    pub fn write(&self, name: &str, value: &Value) -> Result<PathBuf> {
        let path = self.path_for(name);
        let payload = serde_json::to_string_pretty(value)
            .with_context(|| format!("failed to serialize workspace dump '{name}'"))?;
        std::fs::write(&path, payload)
            .with_context(|| format!("failed to write workspace dump '{}'", path.display()))?;
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<Value> {
        let path = self.path_for(name);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read workspace dump '{}'", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in workspace dump '{}'", path.display()))
    }
}

impl DumpSink for Workspace {
    fn run_id(&self) -> &str {
        &self.run_id
    }

    fn dump(&self, name: &str, value: &Value) {
        match self.write(name, value) {
            Ok(path) => tracing::debug!(path = %path.display(), "Saved workspace dump"),
            Err(err) => tracing::warn!(
                name = name,
                run_id = %self.run_id,
                error = %err,
                "workspace dump failed"
            ),
        }
    }
}
