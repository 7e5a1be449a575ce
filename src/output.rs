//! Detection output record
//!
//! Everything observable about one analyzed frame: the blended confidence,
//! the categorical failure, whether the user must change something before a
//! retry can help, and per-metric diagnostics. Failures are data on this
//! record, not errors; the pipeline never aborts on a bad chart.

use serde::{Deserialize, Serialize};

use crate::constants::scoring;
use crate::geometry::PointF;

/// Why a frame did not verify, if it didn't
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    /// No failure; the frame may still fall short of the pass threshold
    None,
    /// No chart in the frame, or sampled colors unrelated to the reference
    NotFound,
    /// Contrast too low for reliable color sampling
    Lighting,
    /// Image too soft; focus or motion blur
    Blur,
    /// Chart visible but too small or cut off
    Partial,
}

impl FailureReason {
    /// Short instruction for the capture UI, or `None` when nothing failed
    pub fn user_hint(&self) -> Option<&'static str> {
        match self {
            FailureReason::None => None,
            FailureReason::NotFound => Some("Move the chart into the frame."),
            FailureReason::Lighting => Some("Improve the lighting or reduce glare."),
            FailureReason::Blur => Some("Hold the camera steady and refocus."),
            FailureReason::Partial => Some("Bring the chart closer and fully into view."),
        }
    }
}

/// Average and maximum ΔE2000 over the 24 sampled patches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatchScores {
    pub avg_delta_e: f64,
    pub max_delta_e: f64,
}

/// Per-metric diagnostics for one analyzed frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Chart bounding-box area as a fraction of the frame area
    pub area_score: f64,
    /// Closeness of the bounding-box aspect to the expected 1.5, in [0,1]
    pub aspect_score: f64,
    /// Normalized intensity spread, in [0,1]
    pub contrast_score: f64,
    /// Normalized Laplacian variance, in [0,1]
    pub blur_score: f64,
    /// Blended color agreement with the reference table, in [0,1]
    pub color_score: f64,
    pub avg_delta_e: Option<f64>,
    pub max_delta_e: Option<f64>,
    /// Ordered TL,TR,BR,BL corners, or empty when no panel was found
    pub primary_quad: Vec<PointF>,
    pub secondary_quad: Vec<PointF>,
    /// Whether the secondary panel reads as a grayscale ramp
    pub secondary_valid: bool,
    pub frame_width: i32,
    pub frame_height: i32,
    /// Capture rotation metadata, passed through unchanged
    pub rotation_degrees: i32,
}

/// Result of analyzing one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionOutput {
    /// Blended confidence in [0,1]
    pub confidence: f32,
    pub failure_reason: FailureReason,
    /// True when retrying the same scene cannot succeed and the user must
    /// act first
    pub needs_input: bool,
    pub metrics: Option<Metrics>,
}

impl DetectionOutput {
    /// Output for an unusable frame or an internal fault
    pub fn invalid_input() -> Self {
        Self {
            confidence: 0.0,
            failure_reason: FailureReason::NotFound,
            needs_input: true,
            metrics: None,
        }
    }

    /// Output for a clean frame in which no chart candidate was located
    pub fn nothing_detected() -> Self {
        Self {
            confidence: 0.0,
            failure_reason: FailureReason::NotFound,
            needs_input: false,
            metrics: None,
        }
    }

    /// Consumer-visible pass predicate: confident, no failure, nothing
    /// required from the user
    pub fn passes(&self) -> bool {
        self.confidence >= scoring::CONFIDENCE_THRESHOLD
            && self.failure_reason == FailureReason::None
            && !self.needs_input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason_wire_names() {
        let json = serde_json::to_string(&FailureReason::NotFound).unwrap();
        assert_eq!(json, "\"NOT_FOUND\"");
        let json = serde_json::to_string(&FailureReason::None).unwrap();
        assert_eq!(json, "\"NONE\"");
    }

    #[test]
    fn test_user_hints() {
        assert!(FailureReason::None.user_hint().is_none());
        assert!(FailureReason::Blur.user_hint().unwrap().contains("steady"));
    }

    #[test]
    fn test_pass_predicate_at_threshold() {
        let output = DetectionOutput {
            confidence: 0.70,
            failure_reason: FailureReason::None,
            needs_input: false,
            metrics: None,
        };
        assert!(output.passes());
    }

    #[test]
    fn test_pass_predicate_rejects_failures() {
        let mut output = DetectionOutput {
            confidence: 0.95,
            failure_reason: FailureReason::Blur,
            needs_input: false,
            metrics: None,
        };
        assert!(!output.passes());

        output.failure_reason = FailureReason::None;
        output.confidence = 0.699;
        assert!(!output.passes());
    }

    #[test]
    fn test_invalid_vs_nothing_detected() {
        assert!(DetectionOutput::invalid_input().needs_input);
        assert!(!DetectionOutput::nothing_detected().needs_input);
        assert_eq!(
            DetectionOutput::nothing_detected().failure_reason,
            FailureReason::NotFound
        );
    }

    #[test]
    fn test_output_serialization_roundtrip() {
        let output = DetectionOutput {
            confidence: 0.83,
            failure_reason: FailureReason::None,
            needs_input: false,
            metrics: Some(Metrics {
                area_score: 0.25,
                aspect_score: 1.0,
                contrast_score: 0.8,
                blur_score: 0.9,
                color_score: 0.95,
                avg_delta_e: Some(1.4),
                max_delta_e: Some(3.2),
                primary_quad: vec![
                    PointF::new(0.0, 0.0),
                    PointF::new(600.0, 0.0),
                    PointF::new(600.0, 400.0),
                    PointF::new(0.0, 400.0),
                ],
                secondary_quad: Vec::new(),
                secondary_valid: false,
                frame_width: 1280,
                frame_height: 720,
                rotation_degrees: 90,
            }),
        };

        let json = serde_json::to_string(&output).unwrap();
        let back: DetectionOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(output, back);
    }
}
