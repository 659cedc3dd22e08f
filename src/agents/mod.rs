/// Model-backed collaborators driven by the research pipeline.
///
/// **Researcher** (one call per run, failure aborts the run):
/// - `researcher::SearchResearcher`: single model call over a mock search report
/// - `researcher::AgenticResearcher`: bounded tool-use loop over the skill
///
/// **Writer** (`writer::LlmWriter`): drafts and rewrites the analyst summary.
///
/// **Reviewer** (`reviewer::LlmReviewer`): verifies claims and approves or rejects.
///
/// None of them retry. The control loop in `pipeline` is the only retry policy.
use anyhow::Result;
use async_trait::async_trait;

use crate::models::{AnalystSummary, CompanyFacts, ReviewResult};
use crate::skill::SkillReport;

pub mod researcher;
pub mod reviewer;
pub mod writer;

#[async_trait]
pub trait Researcher: Send + Sync {
    async fn research(&self, company: &str) -> Result<CompanyFacts>;

    /// Skill usage for researchers that work through a skill.
    fn skill_report(&self) -> Option<SkillReport> {
        None
    }
}

#[async_trait]
pub trait Writer: Send + Sync {
    async fn write(&self, facts: &CompanyFacts) -> Result<AnalystSummary>;

    async fn rewrite(
        &self,
        facts: &CompanyFacts,
        previous_text: &str,
        feedback: &str,
    ) -> Result<AnalystSummary>;
}

#[async_trait]
pub trait Reviewer: Send + Sync {
    async fn review(&self, summary: &AnalystSummary, facts: &CompanyFacts)
    -> Result<ReviewResult>;
}

pub(crate) fn to_pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
