use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::{Writer, to_pretty_json};
use crate::llm::{CompletionRequest, LlmClient, parse_structured};
use crate::models::{AnalystSummary, CompanyFacts};

const WRITER_SYSTEM_PROMPT: &str = "You are a sell-side equity analyst. Write a concise analyst-style \
summary from researched company facts. Maximum 200 words. Every claim must trace back to one of the \
listed sources. Include key risks and a one-sentence outlook (bullish, bearish or neutral).\n\
Respond with a single JSON object and nothing else:\n\
{\"summary_text\": string, \"key_risks\": [string], \"outlook\": string, \"confidence_score\": number between 0 and 1}";

pub struct LlmWriter {
    llm: Arc<dyn LlmClient>,
}

impl LlmWriter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    async fn complete(&self, user: String) -> Result<AnalystSummary> {
        let request = CompletionRequest::new(WRITER_SYSTEM_PROMPT, user);
        let content = self.llm.complete(&request).await?;
        Ok(parse_structured::<AnalystSummary>("writer", &content)?)
    }
}

#[async_trait]
impl Writer for LlmWriter {
    async fn write(&self, facts: &CompanyFacts) -> Result<AnalystSummary> {
        tracing::debug!(company = %facts.company_name, "writer drafting summary");
        self.complete(format!("Company facts:\n{}", to_pretty_json(facts)))
            .await
    }

    async fn rewrite(
        &self,
        facts: &CompanyFacts,
        previous_text: &str,
        feedback: &str,
    ) -> Result<AnalystSummary> {
        tracing::debug!(company = %facts.company_name, "writer revising summary");
        self.complete(format!(
            "Company facts:\n{}\n\nPrevious summary:\n{previous_text}\n\n\
             Reviewer feedback:\n{feedback}\n\n\
             Revise the summary so it addresses every point of the feedback.",
            to_pretty_json(facts)
        ))
        .await
    }
}
