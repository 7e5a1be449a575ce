//! Confidence blending and failure classification
//!
//! Geometric and photometric measurements are blended into one confidence
//! value, and the dominant problem, if any, is classified into the four
//! observable failures. Classification is ordered: blur masks everything
//! else, a too-small chart masks lighting, and color disagreement only
//! matters once geometry and exposure are plausible.

use crate::config::ScoringConfig;
use crate::constants::scoring;
use crate::geometry::{BoundingBox, PointF};
use crate::output::{DetectionOutput, FailureReason, Metrics, PatchScores};

/// Everything the scorer needs about one analyzed frame
#[derive(Debug, Clone)]
pub struct ScoreInput<'a> {
    pub frame_width: i32,
    pub frame_height: i32,
    pub rotation_degrees: i32,
    /// Axis-aligned extent of the primary panel
    pub bbox: BoundingBox,
    pub laplacian_variance: f64,
    pub contrast_score: f64,
    pub patch_scores: PatchScores,
    /// Ordered TL,TR,BR,BL corners of the primary panel
    pub primary_quad: &'a [PointF],
    pub secondary_quad: &'a [PointF],
    pub secondary_valid: bool,
}

/// Final aggregation of one frame's measurements
pub trait ScoreDetection {
    fn score(&self, input: ScoreInput<'_>) -> DetectionOutput;
}

/// Production scorer
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    config: ScoringConfig,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self::with_config(ScoringConfig::default())
    }

    pub fn with_config(config: ScoringConfig) -> Self {
        Self { config }
    }
}

impl ScoreDetection for ConfidenceScorer {
    fn score(&self, input: ScoreInput<'_>) -> DetectionOutput {
        let cfg = &self.config;

        let frame_area = f64::from(input.frame_width) * f64::from(input.frame_height);
        let area_score = input.bbox.area() / frame_area.max(1.0);

        let aspect = input.bbox.width / input.bbox.height.max(1.0);
        let aspect_score =
            (1.0 - (aspect - cfg.expected_aspect).abs() / cfg.expected_aspect).clamp(0.0, 1.0);

        let blur_score = (input.laplacian_variance / cfg.blur_reference).clamp(0.0, 1.0);
        let contrast_score = input.contrast_score.clamp(0.0, 1.0);

        let avg_sub =
            (1.0 - input.patch_scores.avg_delta_e / cfg.pass_avg_delta_e).clamp(0.0, 1.0);
        let max_sub =
            (1.0 - input.patch_scores.max_delta_e / cfg.pass_max_delta_e).clamp(0.0, 1.0);
        let color_score = (scoring::AVG_COLOR_WEIGHT * avg_sub + scoring::MAX_COLOR_WEIGHT * max_sub)
            .clamp(0.0, 1.0);

        let boosted_area = (area_score * cfg.area_boost).clamp(0.0, 1.0);

        // Accumulate in f64, narrow to f32 only at the end.
        let confidence = (scoring::AREA_WEIGHT * boosted_area
            + scoring::ASPECT_WEIGHT * aspect_score
            + scoring::CONTRAST_WEIGHT * contrast_score
            + scoring::BLUR_WEIGHT * blur_score
            + scoring::COLOR_WEIGHT * color_score)
            .clamp(0.0, 1.0) as f32;

        let failure = if blur_score < cfg.blur_fail_below {
            FailureReason::Blur
        } else if area_score < cfg.partial_area_below {
            FailureReason::Partial
        } else if contrast_score < cfg.lighting_contrast_below {
            FailureReason::Lighting
        } else if input.patch_scores.avg_delta_e
            > cfg.pass_avg_delta_e * cfg.not_found_delta_e_factor
        {
            FailureReason::NotFound
        } else {
            FailureReason::None
        };

        DetectionOutput {
            confidence,
            failure_reason: failure,
            needs_input: failure == FailureReason::NotFound,
            metrics: Some(Metrics {
                area_score,
                aspect_score,
                contrast_score,
                blur_score,
                color_score,
                avg_delta_e: Some(input.patch_scores.avg_delta_e),
                max_delta_e: Some(input.patch_scores.max_delta_e),
                primary_quad: input.primary_quad.to_vec(),
                secondary_quad: input.secondary_quad.to_vec(),
                secondary_valid: input.secondary_valid,
                frame_width: input.frame_width,
                frame_height: input.frame_height,
                rotation_degrees: input.rotation_degrees,
            }),
        }
    }
}
