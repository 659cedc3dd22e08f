use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{Researcher, to_pretty_json};
use crate::error::CollaboratorError;
use crate::gate::check_facts_structure;
use crate::llm::{
    CompletionRequest, LlmClient, parse_json_object, parse_structured, truncate_chars,
};
use crate::models::CompanyFacts;
use crate::search::web_search;
use crate::skill::{SkillLoader, SkillReport};

const FACTS_SCHEMA: &str = "{\"company_name\": string, \"sector\": string, \"recent_news\": [string], \
\"financial_highlights\": [string], \"key_events\": [string], \"sources\": [string]}";

const MAX_OBSERVATION_CHARS: usize = 4000;

pub const RESEARCH_TOOLS: &[&str] = &[
    "search",
    "read_skill_instructions",
    "read_reference",
    "read_asset",
    "run_script",
    "check_structure",
];

pub fn targeted_query(company: &str) -> String {
    format!("{company} quarterly earnings revenue")
}

/// One model call over a targeted mock search report.
pub struct SearchResearcher {
    llm: Arc<dyn LlmClient>,
}

impl SearchResearcher {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Researcher for SearchResearcher {
    async fn research(&self, company: &str) -> Result<CompanyFacts> {
        let query = targeted_query(company);
        let report = web_search(&query);
        tracing::info!(company, query = %query, "researcher searched");

        let request = CompletionRequest::new(
            format!(
                "You are a financial research analyst. Extract structured facts about a public \
                 company from search results. Use 3-5 recent news items, at least 2 financial \
                 highlights, at least 1 key event, and list every source URL you relied on. \
                 Only use information present in the search results.\n\
                 Respond with a single JSON object and nothing else:\n{FACTS_SCHEMA}"
            ),
            format!("Company: {company}\n\nSearch results:\n{report}"),
        );
        let content = self.llm.complete(&request).await?;
        parse_structured::<CompanyFacts>("researcher", &content)
            .with_context(|| format!("researcher failed for '{company}'"))
    }
}

/// Tool-using researcher. Each model turn picks one tool or finalizes.
pub struct AgenticResearcher {
    llm: Arc<dyn LlmClient>,
    skill: SkillLoader,
    max_steps: usize,
}

impl AgenticResearcher {
    pub fn new(llm: Arc<dyn LlmClient>, skill: SkillLoader, max_steps: usize) -> Self {
        Self {
            llm,
            skill,
            max_steps: max_steps.max(1),
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You research a public company and extract structured facts.\n\n{}\n\n\
             Tools:\n\
             - search {{\"query\": string}}: web search. Targeted queries return more detail.\n\
             - read_skill_instructions {{}}: full research methodology.\n\
             - read_reference {{\"name\": string}}: a file from the skill's references/ folder.\n\
             - read_asset {{\"name\": string}}: a file from the skill's assets/ folder.\n\
             - run_script {{\"name\": string, \"input\": string}}: run a skill script with input on stdin.\n\
             - check_structure {{\"company_facts\": object}}: validate facts before finalizing.\n\n\
             Start by reading the skill instructions, then use the other tools as needed. \
             Always check_structure before finalizing.\n\
             Reply with exactly one JSON object per turn:\n\
             {{\"action\": \"<tool>\", \"input\": {{...}}}}\n\
             or, when done:\n\
             {{\"action\": \"final\", \"company_facts\": {FACTS_SCHEMA}}}",
            self.skill.metadata_prompt()
        )
    }

    /// Run one tool. Failures come back as observation text, never as errors.
    pub async fn dispatch(&self, action: &str, input: &Value) -> String {
        if RESEARCH_TOOLS.contains(&action) {
            self.skill.record_tool_call(action);
        }
        let text_field = |key: &str| {
            input
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        match action {
            "search" => web_search(&text_field("query")),
            "read_skill_instructions" => self.skill.read_skill(),
            "read_reference" => self.skill.read_reference(&text_field("name")),
            "read_asset" => self.skill.read_asset(&text_field("name")),
            "run_script" => {
                let script_input = match input.get("input") {
                    Some(Value::String(raw)) => raw.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                self.skill.run_script(&text_field("name"), &script_input).await
            }
            "check_structure" => {
                let candidate = input.get("company_facts").unwrap_or(input).clone();
                match serde_json::from_value::<CompanyFacts>(candidate) {
                    Ok(facts) => {
                        let issues = check_facts_structure(&facts);
                        if issues.is_empty() {
                            "PASS".to_string()
                        } else {
                            format!("FAIL: {}", issues.join("; "))
                        }
                    }
                    Err(err) => format!("FAIL: company_facts does not match the schema: {err}"),
                }
            }
            other => format!(
                "Error: unknown tool '{other}'. Use one of: {}, or action 'final'.",
                RESEARCH_TOOLS.join(", ")
            ),
        }
    }
}

#[async_trait]
impl Researcher for AgenticResearcher {
    async fn research(&self, company: &str) -> Result<CompanyFacts> {
        let system = self.system_prompt();
        let mut transcript = String::new();

        for step in 1..=self.max_steps {
            let user = format!("Company to research: {company}\n{transcript}");
            let content = self
                .llm
                .complete(&CompletionRequest::new(system.clone(), user))
                .await?;
            let turn = match parse_json_object("researcher", &content) {
                Ok(turn) => turn,
                Err(err) => {
                    tracing::warn!(company, step, error = %err, "researcher turn was not JSON");
                    transcript.push_str(&format!(
                        "\nStep {step}: your reply was not a JSON object ({err}).\n\
                         Reply with exactly one JSON object: a tool action or the final answer.\n"
                    ));
                    continue;
                }
            };
            let action = turn
                .get("action")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            if action == "final" {
                let facts = turn.get("company_facts").cloned().ok_or_else(|| {
                    CollaboratorError::malformed("researcher", "final action without company_facts")
                })?;
                let facts =
                    parse_structured::<CompanyFacts>("researcher", &facts.to_string())?;
                tracing::info!(company, steps = step, "agentic researcher finished");
                return Ok(facts);
            }

            let input = turn.get("input").cloned().unwrap_or(Value::Null);
            tracing::info!(company, step, tool = %action, "researcher tool call");
            let observation = self.dispatch(&action, &input).await;
            transcript.push_str(&format!(
                "\nStep {step} action: {action} {}\nObservation:\n{}\n",
                to_pretty_json(&input),
                truncate_chars(&observation, MAX_OBSERVATION_CHARS)
            ));
        }

        Err(anyhow::anyhow!(
            "researcher exceeded {} tool steps without producing company facts for '{company}'",
            self.max_steps
        ))
    }

    fn skill_report(&self) -> Option<SkillReport> {
        Some(self.skill.report())
    }
}
