use serde::Serialize;
use serde_json::Value;

/// A violated rule, as it appears in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssertionFailure {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl AssertionFailure {
    pub fn new(message: impl Into<String>, context: Option<Value>) -> Self {
        Self {
            message: message.into(),
            context,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Passed => write!(f, "PASS"),
            Outcome::Failed => write!(f, "FAIL"),
            Outcome::Skipped => write!(f, "SKIP"),
        }
    }
}

/// What one check produced during a run.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub id: String,
    pub description: String,
    pub outcome: Outcome,
    pub failures: Vec<AssertionFailure>,
}

impl CheckResult {
    pub fn finished(id: &str, description: &str, failures: Vec<AssertionFailure>) -> Self {
        let outcome = if failures.is_empty() {
            Outcome::Passed
        } else {
            Outcome::Failed
        };
        Self {
            id: id.to_string(),
            description: description.to_string(),
            outcome,
            failures,
        }
    }

    pub fn skipped(id: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            outcome: Outcome::Skipped,
            failures: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub assertions: usize,
}

impl RunSummary {
    pub fn from_results(results: &[CheckResult]) -> Self {
        let count = |o: Outcome| results.iter().filter(|r| r.outcome == o).count();
        Self {
            total: results.len(),
            passed: count(Outcome::Passed),
            failed: count(Outcome::Failed),
            skipped: count(Outcome::Skipped),
            assertions: results.iter().map(|r| r.failures.len()).sum(),
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_outcomes() {
        let results = vec![
            CheckResult::finished("a", "", vec![]),
            CheckResult::finished(
                "b",
                "",
                vec![AssertionFailure::new("x", None), AssertionFailure::new("y", None)],
            ),
            CheckResult::skipped("c", ""),
        ];
        let summary = RunSummary::from_results(&results);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.assertions, 2);
        assert!(summary.has_failures());
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::Passed.to_string(), "PASS");
        assert_eq!(Outcome::Failed.to_string(), "FAIL");
        assert_eq!(Outcome::Skipped.to_string(), "SKIP");
    }

    #[test]
    fn context_omitted_when_absent() {
        let json = serde_json::to_value(AssertionFailure::new("m", None)).unwrap();
        assert_eq!(json, serde_json::json!({"message": "m"}));
    }
}
