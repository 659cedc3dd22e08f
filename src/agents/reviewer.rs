use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::{Reviewer, to_pretty_json};
use crate::llm::{CompletionRequest, LlmClient, parse_structured};
use crate::models::{
    APPROVAL_THRESHOLD, AnalystSummary, CompanyFacts, EXPECTED_FACETS, ReviewResult,
};

pub struct LlmReviewer {
    llm: Arc<dyn LlmClient>,
}

fn system_prompt() -> String {
    format!(
        "You review analyst summaries against their source facts.\n\
         For each factual claim in the summary, verify it against the facts and name the source URL.\n\
         Check facet coverage ({facets}).\n\
         Rate conciseness from 1 (bloated) to 5 (tight).\n\
         Approve only if accuracy_ratio >= {threshold} and completeness_ratio >= {threshold}.\n\
         Respond with a single JSON object and nothing else:\n\
         {{\"claim_verifications\": [{{\"claim\": string, \"source_url\": string, \"supported\": bool, \"reasoning\": string}}], \
         \"accuracy_ratio\": number, \"expected_facets\": [string], \"covered_facets\": [string], \
         \"completeness_ratio\": number, \"conciseness_rating\": integer, \"feedback\": string, \
         \"issues\": [string], \"approved\": bool}}",
        facets = EXPECTED_FACETS.join(", "),
        threshold = APPROVAL_THRESHOLD,
    )
}

impl LlmReviewer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Reviewer for LlmReviewer {
    async fn review(
        &self,
        summary: &AnalystSummary,
        facts: &CompanyFacts,
    ) -> Result<ReviewResult> {
        let request = CompletionRequest::new(
            system_prompt(),
            format!(
                "Analyst summary:\n{}\n\nSource facts:\n{}",
                to_pretty_json(summary),
                to_pretty_json(facts)
            ),
        );
        let content = self.llm.complete(&request).await?;
        let review = parse_structured::<ReviewResult>("reviewer", &content)?;

        if review.approved && !review.meets_thresholds() {
            tracing::warn!(
                accuracy = review.accuracy_ratio,
                completeness = review.completeness_ratio,
                "reviewer approved below threshold"
            );
        }
        Ok(review)
    }
}
