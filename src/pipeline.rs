/// Research pipeline: researcher, writer, then a bounded gate/review/rewrite loop.
///
/// The loop is a small state machine. `next_state` is the only place that
/// decides where a run goes next; `ResearchPipeline::run` just performs the
/// collaborator call each state asks for and feeds the resulting event back in.
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::agents::{Researcher, Reviewer, Writer};
use crate::cli::PipelineVariant;
use crate::gate::{structural_check, structural_feedback};
use crate::models::{AnalystSummary, CompanyFacts, ReviewResult};
use crate::skill::SkillReport;
use crate::workspace::DumpSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Researching,
    Writing,
    StructuralCheck,
    Reviewing,
    Rewriting,
    Done,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    FactsReady,
    DraftReady,
    GatePassed,
    GateFailed,
    Approved,
    Rejected,
}

impl LoopState {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoopState::Done | LoopState::Exhausted)
    }
}

/// Pure transition function. `iteration` is the number of the inner pass that
/// produced `event` (0 before the first gate check). Returns `None` for an
/// event the state does not accept.
pub fn next_state(
    state: LoopState,
    event: LoopEvent,
    iteration: u32,
    max_iterations: u32,
) -> Option<LoopState> {
    use LoopEvent::*;
    use LoopState::*;

    let after_draft = if iteration >= max_iterations {
        Exhausted
    } else {
        StructuralCheck
    };

    match (state, event) {
        (Researching, FactsReady) => Some(Writing),
        (Writing, DraftReady) => Some(after_draft),
        (StructuralCheck, GatePassed) => Some(Reviewing),
        (StructuralCheck, GateFailed) => Some(Rewriting),
        (Reviewing, Approved) => Some(Done),
        (Reviewing, Rejected) => Some(Rewriting),
        (Rewriting, DraftReady) => Some(after_draft),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Termination {
    Approved,
    Exhausted,
}

/// One inner pass of the loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationRecord {
    pub iteration: u32,
    pub gate_issues: Vec<String>,
    pub reviewed: bool,
    pub approved: Option<bool>,
    /// Feedback handed to the rewriter, if a rewrite followed.
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub facts: CompanyFacts,
    pub summary: AnalystSummary,
    /// `None` when no review call happened during the run.
    pub review: Option<ReviewResult>,
    pub iterations: u32,
    pub termination: Termination,
    pub history: Vec<IterationRecord>,
    pub skill_report: Option<SkillReport>,
}

impl PipelineOutcome {
    pub fn approved(&self) -> bool {
        self.termination == Termination::Approved
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub variant: PipelineVariant,
    pub max_iterations: u32,
}

pub struct ResearchPipeline {
    config: PipelineConfig,
    researcher: Arc<dyn Researcher>,
    writer: Arc<dyn Writer>,
    reviewer: Arc<dyn Reviewer>,
    sink: Arc<dyn DumpSink>,
}

fn dump_json<T: Serialize>(sink: &dyn DumpSink, name: &str, value: &T) {
    match serde_json::to_value(value) {
        Ok(json) => sink.dump(name, &json),
        Err(err) => tracing::warn!(name, error = %err, "could not serialize dump"),
    }
}

/// Feedback for the rewriter after a rejected review.
pub fn review_feedback(review: &ReviewResult) -> String {
    if review.issues.is_empty() {
        review.feedback.clone()
    } else {
        format!("{} Issues: {}", review.feedback, review.issues.join("; "))
    }
}

impl ResearchPipeline {
    pub fn new(
        config: PipelineConfig,
        researcher: Arc<dyn Researcher>,
        writer: Arc<dyn Writer>,
        reviewer: Arc<dyn Reviewer>,
        sink: Arc<dyn DumpSink>,
    ) -> Self {
        Self {
            config,
            researcher,
            writer,
            reviewer,
            sink,
        }
    }

    fn advance(&self, state: LoopState, event: LoopEvent, iteration: u32) -> Result<LoopState> {
        let next = next_state(state, event, iteration, self.config.max_iterations).ok_or_else(
            || anyhow::anyhow!("invalid pipeline transition: {state:?} on {event:?}"),
        )?;
        tracing::debug!(from = ?state, to = ?next, iteration, "pipeline transition");
        Ok(next)
    }

    async fn research(&self, company: &str) -> Result<(CompanyFacts, Option<SkillReport>)> {
        tracing::info!(company, run_id = self.sink.run_id(), "Researching company");
        let facts = self
            .researcher
            .research(company)
            .await
            .with_context(|| format!("research failed for '{company}'"))?;
        dump_json(self.sink.as_ref(), "01_company_facts", &facts);

        let skill_report = self.researcher.skill_report();
        if let Some(report) = skill_report.as_ref() {
            dump_json(self.sink.as_ref(), "01b_skill_tracker", report);
        }
        tracing::info!(
            company = %facts.company_name,
            sources = facts.sources.len(),
            news = facts.recent_news.len(),
            "Facts ready"
        );
        Ok((facts, skill_report))
    }

    pub async fn run(&self, company: &str) -> Result<PipelineOutcome> {
        let outcome = match self.config.variant {
            PipelineVariant::Loop => self.run_loop(company).await?,
            PipelineVariant::Chain => self.run_chain(company).await?,
        };
        dump_json(self.sink.as_ref(), "04_final_output", &outcome);
        tracing::info!(
            company = %outcome.facts.company_name,
            termination = ?outcome.termination,
            iterations = outcome.iterations,
            "Pipeline finished"
        );
        Ok(outcome)
    }

    /// Researcher, writer, one review. No gate and no rewrites.
    async fn run_chain(&self, company: &str) -> Result<PipelineOutcome> {
        let (facts, skill_report) = self.research(company).await?;
        let summary = self.writer.write(&facts).await.context("writer failed")?;
        dump_json(self.sink.as_ref(), "02_summary_v1", &summary);

        let review = self
            .reviewer
            .review(&summary, &facts)
            .await
            .context("reviewer failed")?;
        dump_json(self.sink.as_ref(), "03_review_v1", &review);

        let termination = if review.approved {
            Termination::Approved
        } else {
            Termination::Exhausted
        };
        let history = vec![IterationRecord {
            iteration: 1,
            gate_issues: Vec::new(),
            reviewed: true,
            approved: Some(review.approved),
            feedback: None,
        }];

        Ok(PipelineOutcome {
            facts,
            summary,
            review: Some(review),
            iterations: 1,
            termination,
            history,
            skill_report,
        })
    }

    async fn run_loop(&self, company: &str) -> Result<PipelineOutcome> {
        let max_iterations = self.config.max_iterations;
        let mut iteration = 0u32;
        let mut draft_version = 1u32;

        let (facts, skill_report) = self.research(company).await?;
        let mut state = self.advance(LoopState::Researching, LoopEvent::FactsReady, iteration)?;

        let mut summary = self.writer.write(&facts).await.context("writer failed")?;
        dump_json(self.sink.as_ref(), "02_summary_v1", &summary);
        state = self.advance(state, LoopEvent::DraftReady, iteration)?;

        let mut review: Option<ReviewResult> = None;
        let mut history: Vec<IterationRecord> = Vec::new();
        let mut feedback = String::new();

        while !state.is_terminal() {
            let event = match state {
                LoopState::StructuralCheck => {
                    iteration += 1;
                    let issues = structural_check(&summary, &facts);
                    let mut record = IterationRecord {
                        iteration,
                        gate_issues: issues.clone(),
                        reviewed: false,
                        approved: None,
                        feedback: None,
                    };
                    if issues.is_empty() {
                        tracing::info!(iteration, max_iterations, "Structural gate passed");
                        history.push(record);
                        LoopEvent::GatePassed
                    } else {
                        tracing::info!(
                            iteration,
                            max_iterations,
                            issues = issues.len(),
                            "Structural gate failed, skipping review"
                        );
                        dump_json(
                            self.sink.as_ref(),
                            &format!("03_gate_v{iteration}"),
                            &issues,
                        );
                        feedback = structural_feedback(&issues);
                        record.feedback = Some(feedback.clone());
                        history.push(record);
                        LoopEvent::GateFailed
                    }
                }
                LoopState::Reviewing => {
                    let verdict = self
                        .reviewer
                        .review(&summary, &facts)
                        .await
                        .context("reviewer failed")?;
                    dump_json(
                        self.sink.as_ref(),
                        &format!("03_review_v{iteration}"),
                        &verdict,
                    );
                    tracing::info!(
                        iteration,
                        approved = verdict.approved,
                        accuracy = verdict.accuracy_ratio,
                        completeness = verdict.completeness_ratio,
                        conciseness = verdict.conciseness_rating,
                        "Review complete"
                    );

                    let approved = verdict.approved;
                    if !approved {
                        feedback = review_feedback(&verdict);
                    }
                    if let Some(record) = history.last_mut() {
                        record.reviewed = true;
                        record.approved = Some(approved);
                        if !approved {
                            record.feedback = Some(feedback.clone());
                        }
                    }
                    review = Some(verdict);
                    if approved {
                        LoopEvent::Approved
                    } else {
                        LoopEvent::Rejected
                    }
                }
                LoopState::Rewriting => {
                    summary = self
                        .writer
                        .rewrite(&facts, &summary.summary_text, &feedback)
                        .await
                        .context("rewriter failed")?;
                    draft_version += 1;
                    dump_json(
                        self.sink.as_ref(),
                        &format!("02_summary_v{draft_version}"),
                        &summary,
                    );
                    tracing::info!(iteration, draft_version, "Summary rewritten");
                    LoopEvent::DraftReady
                }
                other => {
                    return Err(anyhow::anyhow!(
                        "pipeline loop entered unexpected state {other:?}"
                    ));
                }
            };
            state = self.advance(state, event, iteration)?;
        }

        let termination = if state == LoopState::Done {
            Termination::Approved
        } else {
            tracing::warn!(
                iterations = iteration,
                max_iterations,
                "Iteration budget exhausted without approval"
            );
            Termination::Exhausted
        };

        Ok(PipelineOutcome {
            facts,
            summary,
            review,
            iterations: iteration,
            termination,
            history,
            skill_report,
        })
    }
}
