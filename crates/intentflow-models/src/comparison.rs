//! Screenshot comparison verdicts.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DifferenceSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DifferenceLocation {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A single visual difference reported by a comparator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenshotDifference {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<DifferenceSeverity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<DifferenceLocation>,
}

impl ScreenshotDifference {
    pub fn is_high_severity(&self) -> bool {
        self.severity == Some(DifferenceSeverity::High)
    }
}

/// Raw output of a screenshot comparator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonResult {
    /// Visual closeness in the range 0..=100.
    pub similarity: f64,
    #[serde(rename = "match")]
    pub matched: bool,
    #[serde(default)]
    pub differences: Vec<ScreenshotDifference>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Verdict derived from a similarity score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonStatus {
    Success,
    Partial,
    Mismatch,
}

impl ComparisonStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Mismatch => "mismatch",
        }
    }
}

impl fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison kept on the report: both image locations and the comparator output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRecord {
    pub candidate_path: String,
    pub reference_path: String,
    pub result: ComparisonResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparator_payload_uses_match_and_type_keys() {
        let json = r#"{
            "similarity": 72.5,
            "match": false,
            "differences": [
                {"type": "layout", "description": "Header moved", "severity": "high",
                 "location": {"x": 0, "y": 10, "width": 100, "height": 20}},
                {"type": "text", "description": "Label changed"}
            ],
            "suggestions": ["Check the header"]
        }"#;
        let result: ComparisonResult = serde_json::from_str(json).unwrap();

        assert!(!result.matched);
        assert_eq!(result.differences.len(), 2);
        assert!(result.differences[0].is_high_severity());
        assert!(!result.differences[1].is_high_severity());
        assert_eq!(result.differences[0].kind, "layout");
    }
}
