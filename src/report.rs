use std::fmt::Write as _;

use crate::pipeline::{PipelineOutcome, Termination};
use crate::skill::SkillReport;

fn bullet_list(out: &mut String, title: &str, items: &[String]) {
    let _ = writeln!(out, "{title}:");
    if items.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for item in items {
        let _ = writeln!(out, "  - {item}");
    }
}

fn pct(value: f64) -> String {
    format!("{:.0}%", value * 100.0)
}

/// Plain-text report printed by `research`.
pub fn render_report(outcome: &PipelineOutcome) -> String {
    let mut out = String::new();
    let facts = &outcome.facts;

    let _ = writeln!(out, "=== Company Facts: {} ({}) ===", facts.company_name, facts.sector);
    bullet_list(&mut out, "Recent news", &facts.recent_news);
    bullet_list(&mut out, "Financial highlights", &facts.financial_highlights);
    bullet_list(&mut out, "Key events", &facts.key_events);
    bullet_list(&mut out, "Sources", &facts.sources);

    let summary = &outcome.summary;
    let _ = writeln!(out, "\n=== Analyst Summary ({} words) ===", summary.word_count());
    let _ = writeln!(out, "{}", summary.summary_text);
    bullet_list(&mut out, "Key risks", &summary.key_risks);
    let _ = writeln!(out, "Outlook: {}", summary.outlook);
    let _ = writeln!(out, "Confidence: {:.2}", summary.confidence_score);

    let _ = writeln!(out, "\n=== Review ===");
    match outcome.review.as_ref() {
        None => {
            let _ = writeln!(out, "Review: not performed");
        }
        Some(review) => {
            let _ = writeln!(
                out,
                "Approved: {} | accuracy {} | completeness {} | conciseness {}/5",
                review.approved,
                pct(review.accuracy_ratio),
                pct(review.completeness_ratio),
                review.conciseness_rating
            );
            let _ = writeln!(
                out,
                "Claims supported: {}/{}",
                review.supported_claims(),
                review.claim_verifications.len()
            );
            let _ = writeln!(out, "Covered facets: {}", review.covered_facets.join(", "));
            if !review.feedback.trim().is_empty() {
                let _ = writeln!(out, "Feedback: {}", review.feedback);
            }
            if !review.issues.is_empty() {
                bullet_list(&mut out, "Issues", &review.issues);
            }
        }
    }

    let status = match outcome.termination {
        Termination::Approved => "approved",
        Termination::Exhausted => "not approved (iteration budget exhausted)",
    };
    let _ = writeln!(out, "\n=== Iterations: {} ({status}) ===", outcome.iterations);
    for record in &outcome.history {
        let verdict = match record.approved {
            Some(true) => "approved",
            Some(false) => "rejected",
            None => "not reviewed",
        };
        let gate = if record.gate_issues.is_empty() {
            "gate passed".to_string()
        } else {
            format!("gate failed: {}", record.gate_issues.join("; "))
        };
        let _ = writeln!(out, "  #{} {gate}, {verdict}", record.iteration);
    }

    if let Some(report) = outcome.skill_report.as_ref() {
        out.push('\n');
        out.push_str(&render_skill_report(report));
    }
    out
}

pub fn render_skill_report(report: &SkillReport) -> String {
    let mut out = String::new();
    let scores = &report.scores;
    let _ = writeln!(out, "=== Skill Usage ===");
    let _ = writeln!(out, "Skill read: {}", report.skill_read);
    let _ = writeln!(out, "References: {}", pct(scores.reference_coverage));
    let _ = writeln!(out, "Scripts: {}", pct(scores.script_coverage));
    let _ = writeln!(out, "Tools: {}", pct(scores.tool_coverage));
    let _ = writeln!(out, "Overall: {}", pct(scores.overall));
    let missed = report
        .references_missed
        .iter()
        .chain(&report.scripts_missed)
        .chain(&report.tools_missed)
        .cloned()
        .collect::<Vec<String>>();
    if !missed.is_empty() {
        let _ = writeln!(out, "Missed: {}", missed.join(", "));
    }
    out
}
