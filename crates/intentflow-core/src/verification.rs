//! Folding a screenshot comparison into the execution report.
//!
//! The similarity thresholds are fixed: above 80 is a match, 60 through 80
//! (inclusive) is partial, below 60 is a mismatch.

use intentflow_models::{ComparisonRecord, ComparisonResult, ComparisonStatus, ExecutionReport};
use std::path::Path;

/// Similarity strictly above this value counts as a match.
pub const SUCCESS_THRESHOLD: f64 = 80.0;
/// Similarity at or above this value (and not a match) is partial.
pub const PARTIAL_THRESHOLD: f64 = 60.0;

pub const NO_REFERENCE_SUGGESTION: &str = "No reference success-state screenshot was available; \
     record a known-good end state to enable visual verification";

/// Map a similarity score to its verdict and match flag.
pub fn classify_similarity(similarity: f64) -> (ComparisonStatus, bool) {
    if similarity > SUCCESS_THRESHOLD {
        (ComparisonStatus::Success, true)
    } else if similarity >= PARTIAL_THRESHOLD {
        (ComparisonStatus::Partial, false)
    } else {
        (ComparisonStatus::Mismatch, false)
    }
}

/// Record the comparison verdict, similarity and suggestions on `report`.
pub fn apply_comparison(
    report: &mut ExecutionReport,
    candidate: &Path,
    reference: &Path,
    result: ComparisonResult,
) -> ComparisonStatus {
    let (status, matched) = classify_similarity(result.similarity);

    report.success_state_match = Some(matched);
    report.comparison_similarity = Some(result.similarity);
    report.comparison_status = Some(status);

    match status {
        ComparisonStatus::Success => {}
        ComparisonStatus::Partial => {
            report.add_suggestion(format!(
                "Final state partially matches the success state ({:.1}% similar); review the reported differences",
                result.similarity
            ));
            let high: Vec<&str> = result
                .differences
                .iter()
                .filter(|difference| difference.is_high_severity())
                .map(|difference| difference.description.as_str())
                .collect();
            if !high.is_empty() {
                report.add_suggestion(format!(
                    "High-severity differences detected, manual review recommended: {}",
                    high.join("; ")
                ));
            }
        }
        ComparisonStatus::Mismatch => {
            report.add_suggestion(format!(
                "Final state does not match the success state ({:.1}% similar); verify the workflow completed",
                result.similarity
            ));
            report.add_suggestion(
                "Check for navigation errors or timing issues that left the page in an unexpected state",
            );
        }
    }

    report.suggestions.extend(result.suggestions.iter().cloned());
    report.comparison = Some(ComparisonRecord {
        candidate_path: candidate.display().to_string(),
        reference_path: reference.display().to_string(),
        result,
    });

    status
}
