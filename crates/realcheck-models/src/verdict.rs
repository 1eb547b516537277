//! Mapping from a classifier score to a user-facing verdict.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scores strictly below this are reported as AI.
pub const AI_THRESHOLD: f64 = 50.0;

/// Verdict label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerdictLabel {
    #[serde(rename = "AI")]
    Ai,
    #[serde(rename = "human")]
    Human,
}

impl VerdictLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictLabel::Ai => "AI",
            VerdictLabel::Human => "human",
        }
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Label plus confidence (0-100, one decimal) derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: VerdictLabel,
    pub confidence: f64,
}

impl Verdict {
    /// Derive a verdict from a score in `[0, 100]`.
    ///
    /// `p < 50` reads as AI with confidence `100 - p`; everything else reads
    /// as human with confidence `p`. Exactly 50 is human.
    pub fn from_score(score: f64) -> Self {
        if score < AI_THRESHOLD {
            Self {
                label: VerdictLabel::Ai,
                confidence: round1(100.0 - score),
            }
        } else {
            Self {
                label: VerdictLabel::Human,
                confidence: round1(score),
            }
        }
    }

    /// Rendered message, e.g. `"87.5% sure this is AI"`.
    pub fn message(&self) -> String {
        format!("{:.1}% sure this is {}", self.confidence, self.label)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Round to one decimal place, ties to even.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores_below_threshold_are_ai() {
        for p in [0.0, 0.1, 12.5, 26.8, 49.9] {
            let verdict = Verdict::from_score(p);
            assert_eq!(verdict.label, VerdictLabel::Ai, "score {p}");
            assert_eq!(verdict.confidence, round1(100.0 - p), "score {p}");
        }
    }

    #[test]
    fn test_scores_at_or_above_threshold_are_human() {
        for p in [50.0, 50.1, 73.2, 99.9, 100.0] {
            let verdict = Verdict::from_score(p);
            assert_eq!(verdict.label, VerdictLabel::Human, "score {p}");
            assert_eq!(verdict.confidence, round1(p), "score {p}");
        }
    }

    #[test]
    fn test_boundary_is_human() {
        let verdict = Verdict::from_score(50.0);
        assert_eq!(verdict.label, VerdictLabel::Human);
        assert_eq!(verdict.confidence, 50.0);
        assert_eq!(verdict.message(), "50.0% sure this is human");
    }

    #[test]
    fn test_message_format() {
        assert_eq!(Verdict::from_score(12.5).message(), "87.5% sure this is AI");
        assert_eq!(Verdict::from_score(0.0).message(), "100.0% sure this is AI");
        assert_eq!(Verdict::from_score(73.2).to_string(), "73.2% sure this is human");
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(26.799999999999997), 26.8);
        assert_eq!(round1(33.333), 33.3);
        assert_eq!(round1(66.66), 66.7);
    }

    #[test]
    fn test_round1_ties_go_to_even() {
        assert_eq!(round1(12.25), 12.2);
        assert_eq!(round1(12.75), 12.8);
        assert_eq!(round1(0.25), 0.2);
        assert_eq!(Verdict::from_score(87.75).message(), "87.8% sure this is human");
        assert_eq!(Verdict::from_score(12.25).message(), "87.8% sure this is AI");
    }

    #[test]
    fn test_label_serialization() {
        assert_eq!(serde_json::to_string(&VerdictLabel::Ai).unwrap(), "\"AI\"");
        assert_eq!(serde_json::to_string(&VerdictLabel::Human).unwrap(), "\"human\"");
    }
}
