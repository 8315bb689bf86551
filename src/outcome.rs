//! Result shapes shared by the survey operations.
//!
//! Every public survey operation answers with an [`Outcome`], so callers
//! match on `status` instead of probing for error fields.

use serde::Serialize;

use crate::error::ApiError;

/// Why an operation, or one item of a batch, failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Credentials rejected or access forbidden.
    Auth,
    /// Project, draft or answer does not exist.
    NotFound,
    /// Connection error, timeout or unexpected API response.
    Api,
    /// Search text matched no answer above the threshold.
    UnresolvedText,
    /// Answer stayed blocked by unmet prerequisites.
    UnresolvedDependency,
    /// The draft could not be published.
    Commit,
}

impl From<&ApiError> for FailureKind {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::Auth(_) => FailureKind::Auth,
            ApiError::NotFound(_) => FailureKind::NotFound,
            ApiError::Api(_) => FailureKind::Api,
        }
    }
}

/// One failed item inside an otherwise completed operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    /// The answer id or search text the failure concerns.
    pub item: String,
    /// Failure category.
    pub kind: FailureKind,
    /// Human-readable detail.
    pub detail: String,
    /// What the caller could try next.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ItemFailure {
    /// Build a failure without a suggestion.
    pub fn new(item: impl Into<String>, kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            kind,
            detail: detail.into(),
            suggestion: None,
        }
    }

    /// Build a failure from an API error.
    pub fn from_api(item: impl Into<String>, err: &ApiError) -> Self {
        Self::new(item, FailureKind::from(err), err.to_string())
    }

    /// Attach a suggestion.
    pub fn with_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }
}

/// Result of a survey operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// Everything requested was applied.
    Success {
        /// Operation report.
        #[serde(flatten)]
        report: T,
    },
    /// The operation ran to completion but some items failed.
    PartialSuccess {
        /// Operation report.
        #[serde(flatten)]
        report: T,
        /// Items that could not be applied.
        failures: Vec<ItemFailure>,
    },
    /// The operation could not run at all.
    Failure {
        /// Failure category.
        kind: FailureKind,
        /// Human-readable detail.
        detail: String,
    },
}

impl<T> Outcome<T> {
    /// `Success` when `failures` is empty, `PartialSuccess` otherwise.
    pub fn from_report(report: T, failures: Vec<ItemFailure>) -> Self {
        if failures.is_empty() {
            Outcome::Success { report }
        } else {
            Outcome::PartialSuccess { report, failures }
        }
    }

    /// Whole-operation failure caused by the API.
    pub fn from_api_error(err: &ApiError) -> Self {
        Outcome::Failure {
            kind: FailureKind::from(err),
            detail: err.to_string(),
        }
    }

    /// The report, unless the operation failed outright.
    pub fn report(&self) -> Option<&T> {
        match self {
            Outcome::Success { report } | Outcome::PartialSuccess { report, .. } => Some(report),
            Outcome::Failure { .. } => None,
        }
    }

    /// Per-item failures (empty for `Success` and `Failure`).
    pub fn failures(&self) -> &[ItemFailure] {
        match self {
            Outcome::PartialSuccess { failures, .. } => failures,
            _ => &[],
        }
    }

    /// Whether the outcome is `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize)]
    struct Report {
        count: usize,
    }

    #[test]
    fn test_outcome_shapes() {
        let ok = Outcome::from_report(Report { count: 2 }, Vec::new());
        assert!(ok.is_success());
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({"status": "success", "count": 2})
        );

        let partial = Outcome::from_report(
            Report { count: 1 },
            vec![ItemFailure::new("COBOL", FailureKind::UnresolvedText, "no match")],
        );
        assert_eq!(partial.failures().len(), 1);
        let json = serde_json::to_value(&partial).unwrap();
        assert_eq!(json["status"], "partial_success");
        assert_eq!(json["count"], 1);
        assert_eq!(json["failures"][0]["kind"], "unresolved_text");
        assert!(json["failures"][0].get("suggestion").is_none());

        let failed: Outcome<Report> = Outcome::from_api_error(&ApiError::Auth("bad token".into()));
        assert!(failed.report().is_none());
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["kind"], "auth");
    }
}
