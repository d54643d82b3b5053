use crate::graders::evidence::{Evidence, GraderResult, Severity};

/// Aggregate over the results of several graders run against one trace.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSummary {
    pub results: Vec<GraderResult>,
}

impl EvaluationSummary {
    pub fn new(results: Vec<GraderResult>) -> Self {
        Self { results }
    }

    /// True when every grader passed.
    pub fn passed(&self) -> bool {
        self.results.iter().all(|result| result.passed)
    }

    /// Mean score across graders; 1.0 when none ran.
    pub fn score(&self) -> f64 {
        if self.results.is_empty() {
            return 1.0;
        }
        let total: f64 = self.results.iter().map(|result| result.score).sum();
        total / self.results.len() as f64
    }

    pub fn errors(&self) -> Vec<&Evidence> {
        self.results
            .iter()
            .flat_map(|result| result.evidence.iter())
            .filter(|evidence| evidence.severity == Severity::Error)
            .collect()
    }

    pub fn format_report(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        lines.push(String::new());
        lines.push("=".repeat(60));
        lines.push("EVALUATION REPORT".to_string());
        lines.push("=".repeat(60));
        lines.push(String::new());
        lines.push(format!(
            "Overall: {} (score: {:.2})",
            if self.passed() { "PASSED" } else { "FAILED" },
            self.score()
        ));
        for result in &self.results {
            lines.push(result.format_report());
        }
        lines.join("\n")
    }
}
