//! layout::report
//!
//! Validation results and their aggregation.
//!
//! # Design
//!
//! Structural validation failures are data, not exceptions: each node
//! appends one [`ValidationResult`]; the [`Report`] aggregates them.
//! Optional-node failures are downgraded to success when the result
//! is constructed, so `fails()` only ever counts required failures.

use sha2::{Digest, Sha256};

/// One validation verdict.
///
/// Results carry a stable, deterministic id derived from the node
/// description, so the same check reports under the same id across
/// runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    id: String,
    description: String,
    passed: bool,
    required: bool,
}

impl ValidationResult {
    /// Construct a result, applying the optional-downgrade: a failed
    /// but optional validation reports success.
    pub fn new(description: String, passed: bool, optional: bool) -> Self {
        let passed = if optional { true } else { passed };
        let mut hasher = Sha256::new();
        hasher.update(description.as_bytes());
        let digest = hasher.finalize();
        Self {
            id: format!("check:{}", hex::encode(&digest[..4])),
            description,
            passed,
            required: !optional,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// What was checked.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Did the check succeed (after the optional downgrade)?
    pub fn succeeded(&self) -> bool {
        self.passed
    }

    /// Did the check fail?
    pub fn failed(&self) -> bool {
        !self.passed
    }

    /// Was the check required?
    pub fn is_required(&self) -> bool {
        self.required
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verdict = if self.passed { "ok" } else { "failed" };
        write!(f, "[{verdict}] {} ({})", self.description, self.id)
    }
}

/// The outcome of one `validate()` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    results: Vec<ValidationResult>,
}

impl Report {
    pub(crate) fn new(results: Vec<ValidationResult>) -> Self {
        Self { results }
    }

    /// Every result, required and optional alike.
    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    /// Results of required checks only.
    pub fn required_results(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|r| r.is_required())
    }

    /// Number of failed required checks.
    pub fn fails(&self) -> usize {
        self.required_results().filter(|r| r.failed()).count()
    }

    /// The failing subset, for reporting.
    pub fn get_failed(&self) -> Vec<&ValidationResult> {
        self.required_results().filter(|r| r.failed()).collect()
    }

    /// True when no required check failed.
    pub fn is_ok(&self) -> bool {
        self.fails() == 0
    }

    /// Multi-line, human-readable rendering.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for result in &self.results {
            out.push_str(&result.to_string());
            out.push('\n');
        }
        out.push_str(&format!(
            "{} checks, {} required failure(s)\n",
            self.results.len(),
            self.fails()
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_failure_downgraded() {
        let result = ValidationResult::new("x".to_string(), false, true);
        assert!(result.succeeded());
        assert!(!result.is_required());
    }

    #[test]
    fn required_failure_kept() {
        let result = ValidationResult::new("x".to_string(), false, false);
        assert!(result.failed());
        assert!(result.is_required());
    }

    #[test]
    fn ids_are_stable() {
        let a = ValidationResult::new("same check".to_string(), true, false);
        let b = ValidationResult::new("same check".to_string(), false, false);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn fails_counts_required_only() {
        let report = Report::new(vec![
            ValidationResult::new("a".to_string(), false, false),
            ValidationResult::new("b".to_string(), false, true),
            ValidationResult::new("c".to_string(), true, false),
        ]);
        assert_eq!(report.fails(), 1);
        assert!(!report.is_ok());
        assert_eq!(report.get_failed().len(), 1);
        assert_eq!(report.get_failed()[0].description(), "a");
    }
}
