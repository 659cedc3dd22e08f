/// Structural gate - cheap deterministic checks run before any paid review call.
use url::Url;

use crate::models::{AnalystSummary, CompanyFacts};

pub const MAX_SUMMARY_WORDS: usize = 200;

/// Check a draft summary's shape. Returns every issue found; empty means pass.
pub fn structural_check(summary: &AnalystSummary, facts: &CompanyFacts) -> Vec<String> {
    let mut issues = Vec::new();

    let word_count = summary.word_count();
    if word_count > MAX_SUMMARY_WORDS {
        issues.push(format!(
            "Summary too long: {word_count} words (max {MAX_SUMMARY_WORDS})"
        ));
    }
    if summary.key_risks.is_empty() {
        issues.push("Missing key_risks".to_string());
    }
    if summary.outlook.trim().is_empty() {
        issues.push("Missing outlook".to_string());
    }
    if facts.sources.is_empty() {
        issues.push("No sources provided by researcher".to_string());
    }

    issues
}

/// Feedback handed to the rewriter when the gate rejects a draft.
pub fn structural_feedback(issues: &[String]) -> String {
    format!("Structural issues: {}", issues.join("; "))
}

/// Researcher-side self check used by the `check_structure` tool.
pub fn check_facts_structure(facts: &CompanyFacts) -> Vec<String> {
    let mut issues = Vec::new();

    if facts.company_name.trim().is_empty() {
        issues.push("Missing company_name".to_string());
    }
    if facts.sector.trim().is_empty() {
        issues.push("Missing sector".to_string());
    }
    let news = facts.recent_news.len();
    if !(3..=5).contains(&news) {
        issues.push(format!("Expected 3-5 recent_news items, got {news}"));
    }
    if facts.financial_highlights.len() < 2 {
        issues.push(format!(
            "Expected at least 2 financial_highlights, got {}",
            facts.financial_highlights.len()
        ));
    }
    if facts.key_events.is_empty() {
        issues.push("Expected at least 1 key_events item".to_string());
    }
    if facts.sources.is_empty() {
        issues.push("No sources provided".to_string());
    }
    for source in &facts.sources {
        if !is_valid_source_url(source) {
            issues.push(format!("Invalid source URL: {source}"));
        }
    }

    issues
}

pub fn is_valid_source_url(raw: &str) -> bool {
    match Url::parse(raw.trim()) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}
