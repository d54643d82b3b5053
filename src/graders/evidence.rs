use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::graders::error::{GraderError, invalid_score};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational, not a problem.
    Info,
    /// Potential issue, does not fail the grader.
    Warn,
    /// Definite issue, fails the grader.
    Error,
}

/// One finding produced by a grader. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub check_name: String,
    pub description: String,
    pub severity: Severity,
    #[serde(default)]
    pub step_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl Evidence {
    pub fn new(
        check_name: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            check_name: check_name.into(),
            description: description.into(),
            severity,
            step_ids: Vec::new(),
            details: None,
        }
    }

    pub fn with_step_ids(mut self, step_ids: Vec<String>) -> Self {
        self.step_ids = step_ids;
        self
    }

    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details = Some(details);
        self
    }
}

/// Result from any grader, deterministic or judge-backed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraderResult {
    pub grader_name: String,
    pub passed: bool,
    pub score: f64,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl GraderResult {
    /// An out-of-range score is a construction error, never a silently
    /// clamped value.
    pub fn new(
        grader_name: impl Into<String>,
        passed: bool,
        score: f64,
        evidence: Vec<Evidence>,
        metadata: Option<Map<String, Value>>,
    ) -> Result<Self, GraderError> {
        if !(0.0..=1.0).contains(&score) {
            return Err(invalid_score(format!(
                "score must be between 0.0 and 1.0, got {}",
                score
            )));
        }
        Ok(Self {
            grader_name: grader_name.into(),
            passed,
            score,
            evidence,
            timestamp: OffsetDateTime::now_utc(),
            metadata,
        })
    }

    pub fn errors(&self) -> Vec<&Evidence> {
        self.evidence
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .collect()
    }

    pub fn warnings(&self) -> Vec<&Evidence> {
        self.evidence
            .iter()
            .filter(|e| e.severity == Severity::Warn)
            .collect()
    }

    /// Deterministic human-readable report. The layout is a contract for
    /// downstream consumers: header, PASS/FAIL with score, ERROR
    /// entries, WARN entries, then the info summary with its
    /// "correctly saved" sub-list.
    pub fn format_report(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        lines.push(String::new());
        lines.push("=".repeat(60));
        lines.push(format!("GRADER REPORT: {}", self.grader_name));
        lines.push("=".repeat(60));

        let (icon, status) = if self.passed {
            ("[OK]", "PASSED")
        } else {
            ("[FAIL]", "FAILED")
        };
        lines.push(String::new());
        lines.push(format!("Result: {} {}", icon, status));
        lines.push(format!("Score:  {:.2} / 1.00", self.score));

        let errors = self.errors();
        if !errors.is_empty() {
            lines.push(String::new());
            lines.push(format!("ERRORS ({}):", errors.len()));
            for e in errors {
                lines.push(format!("  [ERROR] {}", e.check_name));
                lines.push(format!("          {}", e.description));
            }
        }

        let warnings = self.warnings();
        if !warnings.is_empty() {
            lines.push(String::new());
            lines.push(format!("WARNINGS ({}):", warnings.len()));
            for e in warnings {
                lines.push(format!("  [WARN]  {}", e.check_name));
                lines.push(format!("          {}", e.description));
            }
        }

        let info: Vec<&Evidence> = self
            .evidence
            .iter()
            .filter(|e| e.severity == Severity::Info)
            .collect();
        if let Some(summary) = info.iter().find(|e| e.check_name == "judge_summary") {
            lines.push(String::new());
            lines.push("SUMMARY:".to_string());
            lines.push(format!("  {}", summary.description));
        }
        let correct_saves: Vec<&&Evidence> = info
            .iter()
            .filter(|e| e.check_name == "correct_save")
            .collect();
        if !correct_saves.is_empty() {
            lines.push(String::new());
            lines.push(format!("CORRECTLY SAVED ({}):", correct_saves.len()));
            for e in correct_saves {
                lines.push(format!("  [OK] {}", e.description));
            }
        }

        lines.push(String::new());
        lines.push("-".repeat(60));

        lines.join("\n")
    }
}
