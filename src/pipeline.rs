//! Frame analysis orchestration
//!
//! The verifier sequences the four capabilities over one frame: wrap the
//! RGBA buffer, derive BGR and smoothed grayscale working images, measure
//! quality, locate candidate quads, score the primary panel, validate the
//! secondary panel, aggregate. Every native buffer is a scoped local and is
//! released on all exit paths by drop order; nothing survives the call.
//!
//! `detect` is not reentrant: callers must serialize invocations on one
//! verifier instance. Separate instances are independent. Each call is a
//! pure function of the frame, so repeated analysis of the same buffer
//! yields the same output.

use std::cmp::Ordering;

use opencv::{
    core::{self, Mat, Size},
    imgproc,
    prelude::*,
};

use crate::color::{AnalyzePatches, PatchAnalyzer};
use crate::config::VerifierConfig;
use crate::constants::quality::SMOOTHING_KERNEL;
use crate::detection::{ChartLocator, LocateCharts};
use crate::error::{Result, VerifyError};
use crate::frame::Frame;
use crate::geometry::{bounding_box, order_corners, Quad};
use crate::output::DetectionOutput;
use crate::quality::{MeasureQuality, QualityAnalyzer};
use crate::runtime;
use crate::scoring::{ConfidenceScorer, ScoreDetection, ScoreInput};

/// Chart verification pipeline.
///
/// Generic over its capabilities so tests can substitute fakes; production
/// code uses [`ChartVerifier::new`] or [`ChartVerifier::with_config`] and
/// never names the type parameters.
pub struct ChartVerifier<
    L = ChartLocator,
    Q = QualityAnalyzer,
    P = PatchAnalyzer,
    S = ConfidenceScorer,
> {
    locator: L,
    quality: Q,
    patches: P,
    scorer: S,
}

impl ChartVerifier {
    /// Verifier with the calibrated default configuration
    pub fn new() -> Self {
        Self::with_config(VerifierConfig::default())
    }

    /// Verifier with explicit configuration
    pub fn with_config(config: VerifierConfig) -> Self {
        Self {
            locator: ChartLocator::with_config(config.locator),
            quality: QualityAnalyzer::new(),
            patches: PatchAnalyzer::with_config(config.warp, config.panel),
            scorer: ConfidenceScorer::with_config(config.scoring),
        }
    }
}

impl Default for ChartVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl<L, Q, P, S> ChartVerifier<L, Q, P, S>
where
    L: LocateCharts,
    Q: MeasureQuality,
    P: AnalyzePatches,
    S: ScoreDetection,
{
    /// Verifier from explicit components
    pub fn with_components(locator: L, quality: Q, patches: P, scorer: S) -> Self {
        Self {
            locator,
            quality,
            patches,
            scorer,
        }
    }

    /// Analyze one frame.
    ///
    /// Never panics and never returns an error: an unusable frame or an
    /// internal fault collapses to confidence 0, `NOT_FOUND`, and
    /// `needs_input = true`, with the incident reported to the log sink.
    pub fn detect(&self, frame: &Frame<'_>) -> DetectionOutput {
        if !frame.is_valid() {
            log::debug!(
                "rejecting frame: {}x{} with {} bytes",
                frame.width,
                frame.height,
                frame.pixels.len()
            );
            return DetectionOutput::invalid_input();
        }

        if let Err(err) = runtime::ensure_runtime() {
            log::warn!("vision runtime unavailable: {err}");
            return DetectionOutput::invalid_input();
        }

        match self.run(frame) {
            Ok(output) => output,
            Err(err) => {
                log::warn!("frame analysis aborted: {err}");
                DetectionOutput::invalid_input()
            }
        }
    }

    fn run(&self, frame: &Frame<'_>) -> Result<DetectionOutput> {
        // Zero-copy wrap of the caller's RGBA bytes; trailing padding is
        // sliced off before reshaping.
        let expected = frame.required_bytes();
        let flat = Mat::from_slice(&frame.pixels[..expected])
            .map_err(|e| VerifyError::opencv("wrap frame pixels", e))?;
        let rgba = flat
            .reshape(4, frame.height)
            .map_err(|e| VerifyError::opencv("reshape frame pixels", e))?;

        let mut bgr = Mat::default();
        imgproc::cvt_color(
            &*rgba,
            &mut bgr,
            imgproc::COLOR_RGBA2BGR,
            0,
            core::AlgorithmHint::ALGO_HINT_DEFAULT,
        )
        .map_err(|e| VerifyError::opencv("convert frame to BGR", e))?;

        let mut gray = Mat::default();
        imgproc::cvt_color(
            &bgr,
            &mut gray,
            imgproc::COLOR_BGR2GRAY,
            0,
            core::AlgorithmHint::ALGO_HINT_DEFAULT,
        )
        .map_err(|e| VerifyError::opencv("convert frame to grayscale", e))?;

        let mut smoothed = Mat::default();
        imgproc::gaussian_blur(
            &gray,
            &mut smoothed,
            Size::new(SMOOTHING_KERNEL, SMOOTHING_KERNEL),
            0.0,
            0.0,
            core::BORDER_DEFAULT,
            core::AlgorithmHint::ALGO_HINT_DEFAULT,
        )
        .map_err(|e| VerifyError::opencv("smooth grayscale frame", e))?;

        let laplacian_variance = self.quality.laplacian_variance(&smoothed)?;

        let mut quads = self.locator.locate_all(&bgr)?;
        if quads.is_empty() {
            return Ok(DetectionOutput::nothing_detected());
        }

        // Largest panel first; the sort is stable, so equal areas keep
        // detector emission order.
        quads.sort_by(|a, b| {
            let area = |q: &Quad| bounding_box(q).area();
            area(b).partial_cmp(&area(a)).unwrap_or(Ordering::Equal)
        });
        let primary = quads[0];
        let secondary = quads.get(1).copied();

        let ordered_primary = order_corners(&primary);
        let patch_scores = self.patches.score_patches(&bgr, &primary)?;
        let primary_bbox = bounding_box(&ordered_primary);

        let (ordered_secondary, secondary_valid) = match secondary {
            Some(quad) => {
                let ordered = order_corners(&quad);
                let valid = self.patches.validate_grayscale_panel(&bgr, &quad)?;
                (ordered.to_vec(), valid)
            }
            None => (Vec::new(), false),
        };

        let contrast_score = self.quality.contrast(&smoothed)?;

        Ok(self.scorer.score(ScoreInput {
            frame_width: frame.width,
            frame_height: frame.height,
            rotation_degrees: frame.rotation_degrees,
            bbox: primary_bbox,
            laplacian_variance,
            contrast_score,
            patch_scores,
            primary_quad: &ordered_primary,
            secondary_quad: &ordered_secondary,
            secondary_valid,
        }))
    }
}
