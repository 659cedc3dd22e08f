/// Pipeline data models shared by the researcher, writer and reviewer.
use serde::{Deserialize, Serialize};

/// Facets a complete analyst summary is expected to touch on.
pub const EXPECTED_FACETS: &[&str] = &["news", "financials", "risks", "outlook", "events"];

/// Minimum accuracy and completeness ratios for an approved review.
pub const APPROVAL_THRESHOLD: f64 = 0.8;

/// Structured output of the researcher. Read-only once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyFacts {
    pub company_name: String,
    pub sector: String,
    pub recent_news: Vec<String>,
    pub financial_highlights: Vec<String>,
    pub key_events: Vec<String>,
    pub sources: Vec<String>,
}

/// Range checks applied to collaborator output after deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

impl Validate for CompanyFacts {
    fn validate(&self) -> Result<(), String> {
        if self.company_name.trim().is_empty() {
            return Err("company_name is empty".to_string());
        }
        Ok(())
    }
}

/// Structured output of the writer and rewriter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystSummary {
    pub summary_text: String,
    pub key_risks: Vec<String>,
    pub outlook: String,
    pub confidence_score: f64,
}

impl AnalystSummary {
    pub fn word_count(&self) -> usize {
        self.summary_text.split_whitespace().count()
    }
}

impl Validate for AnalystSummary {
    fn validate(&self) -> Result<(), String> {
        check_unit_interval("confidence_score", self.confidence_score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimVerification {
    pub claim: String,
    pub source_url: String,
    pub supported: bool,
    pub reasoning: String,
}

/// Reviewer verdict for one draft. Superseded, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub claim_verifications: Vec<ClaimVerification>,
    pub accuracy_ratio: f64,
    pub expected_facets: Vec<String>,
    pub covered_facets: Vec<String>,
    pub completeness_ratio: f64,
    pub conciseness_rating: u8,
    pub feedback: String,
    #[serde(default)]
    pub issues: Vec<String>,
    pub approved: bool,
}

impl Validate for ReviewResult {
    fn validate(&self) -> Result<(), String> {
        check_unit_interval("accuracy_ratio", self.accuracy_ratio)?;
        check_unit_interval("completeness_ratio", self.completeness_ratio)?;
        if !(1..=5).contains(&self.conciseness_rating) {
            return Err(format!(
                "conciseness_rating must be within 1..=5, got {}",
                self.conciseness_rating
            ));
        }
        Ok(())
    }
}

impl ReviewResult {
    /// Whether the ratios clear the approval bar, independent of `approved`.
    pub fn meets_thresholds(&self) -> bool {
        self.accuracy_ratio >= APPROVAL_THRESHOLD && self.completeness_ratio >= APPROVAL_THRESHOLD
    }

    pub fn supported_claims(&self) -> usize {
        self.claim_verifications
            .iter()
            .filter(|claim| claim.supported)
            .count()
    }
}

fn check_unit_interval(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{field} must be within [0, 1], got {value}"))
    }
}
