//! Patch sampling and photometric validation
//!
//! A detected quad is rectified into a fixed 600×400 canvas, converted to
//! 8-bit Lab, and sampled on the 6×4 grid. Each sampling ROI is the central
//! half of its cell, which keeps patch borders and bleed out of the mean.
//! The primary panel is scored by ΔE2000 against the reference table; the
//! secondary panel of a passport is validated as a grayscale ramp.

use opencv::{
    core::{self, Mat, Point2f, Rect, Scalar, Size, Vector},
    imgproc,
    prelude::*,
};

use super::delta_e::ciede2000;
use super::reference::{reference_chart, LabSample, PATCH_COUNT};
use crate::config::{PanelConfig, WarpConfig};
use crate::constants::warp;
use crate::error::{Result, VerifyError};
use crate::geometry::{order_corners, Quad};
use crate::output::PatchScores;

/// Photometric analysis of a detected panel
pub trait AnalyzePatches {
    /// Average and maximum ΔE2000 of the 24 sampled patches against the
    /// reference table, index for index
    fn score_patches(&self, bgr: &Mat, quad: &Quad) -> Result<PatchScores>;

    /// Whether the panel reads as a neutral ramp: low chroma throughout and
    /// per-row mean lightness quasi-monotonically non-increasing
    fn validate_grayscale_panel(&self, bgr: &Mat, quad: &Quad) -> Result<bool>;
}

/// Production patch analyzer
#[derive(Debug, Clone)]
pub struct PatchAnalyzer {
    warp: WarpConfig,
    panel: PanelConfig,
    reference: [LabSample; PATCH_COUNT],
}

impl Default for PatchAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchAnalyzer {
    /// Create a patch analyzer with the calibrated defaults
    pub fn new() -> Self {
        Self::with_config(WarpConfig::default(), PanelConfig::default())
    }

    /// Create a patch analyzer with custom warp and panel parameters
    pub fn with_config(warp: WarpConfig, panel: PanelConfig) -> Self {
        Self {
            warp,
            panel,
            reference: reference_chart(),
        }
    }

    /// Rectify the quad into the canonical canvas and convert to 8-bit Lab
    fn rectify_to_lab(&self, bgr: &Mat, quad: &Quad) -> Result<Mat> {
        let ordered = order_corners(quad);
        let width = self.warp.canvas_width;
        let height = self.warp.canvas_height;

        let mut src = Vector::<Point2f>::new();
        for p in &ordered {
            src.push(Point2f::new(p.x, p.y));
        }
        let mut dst = Vector::<Point2f>::new();
        dst.push(Point2f::new(0.0, 0.0));
        dst.push(Point2f::new(width as f32, 0.0));
        dst.push(Point2f::new(width as f32, height as f32));
        dst.push(Point2f::new(0.0, height as f32));

        let transform = imgproc::get_perspective_transform(&src, &dst, core::DECOMP_LU)
            .map_err(|e| VerifyError::opencv("perspective transform from quad", e))?;

        let mut warped = Mat::default();
        imgproc::warp_perspective(
            bgr,
            &mut warped,
            &transform,
            Size::new(width, height),
            imgproc::INTER_LINEAR,
            core::BORDER_CONSTANT,
            Scalar::default(),
        )
        .map_err(|e| VerifyError::opencv("warp quad to canvas", e))?;

        let mut lab = Mat::default();
        imgproc::cvt_color(
            &warped,
            &mut lab,
            imgproc::COLOR_BGR2Lab,
            0,
            core::AlgorithmHint::ALGO_HINT_DEFAULT,
        )
        .map_err(|e| VerifyError::opencv("convert canvas to Lab", e))?;

        Ok(lab)
    }

    /// Sample the 6×4 grid in reading order, one mean Lab value per patch
    fn sample_grid(&self, lab: &Mat) -> Result<[LabSample; PATCH_COUNT]> {
        let cell_w = self.warp.canvas_width / warp::GRID_COLS;
        let cell_h = self.warp.canvas_height / warp::GRID_ROWS;
        let roi_w = (cell_w / 2).max(warp::MIN_ROI_SIDE);
        let roi_h = (cell_h / 2).max(warp::MIN_ROI_SIDE);

        let mut samples = [LabSample::new(0.0, 0.0, 0.0); PATCH_COUNT];
        for row in 0..warp::GRID_ROWS {
            for col in 0..warp::GRID_COLS {
                let window = Rect::new(
                    col * cell_w + cell_w / 4,
                    row * cell_h + cell_h / 4,
                    roi_w,
                    roi_h,
                );
                let roi = Mat::roi(lab, window)
                    .map_err(|e| VerifyError::opencv("patch sampling window", e))?;
                let mean = core::mean(&*roi, &core::no_array())
                    .map_err(|e| VerifyError::opencv("patch mean", e))?;
                samples[(row * warp::GRID_COLS + col) as usize] =
                    decode_lab8(mean[0], mean[1], mean[2]);
            }
        }
        Ok(samples)
    }
}

impl AnalyzePatches for PatchAnalyzer {
    fn score_patches(&self, bgr: &Mat, quad: &Quad) -> Result<PatchScores> {
        let lab = self.rectify_to_lab(bgr, quad)?;
        let samples = self.sample_grid(&lab)?;

        let mut sum = 0.0;
        let mut max = 0.0f64;
        for (sample, reference) in samples.iter().zip(self.reference.iter()) {
            let delta = ciede2000(*sample, *reference);
            sum += delta;
            max = max.max(delta);
        }

        Ok(PatchScores {
            avg_delta_e: sum / PATCH_COUNT as f64,
            max_delta_e: max,
        })
    }

    fn validate_grayscale_panel(&self, bgr: &Mat, quad: &Quad) -> Result<bool> {
        let lab = self.rectify_to_lab(bgr, quad)?;
        let samples = self.sample_grid(&lab)?;

        let mut chroma_sum = 0.0;
        let mut chroma_max = 0.0f64;
        for sample in &samples {
            let chroma = (sample.a * sample.a + sample.b * sample.b).sqrt();
            chroma_sum += chroma;
            chroma_max = chroma_max.max(chroma);
        }
        let chroma_mean = chroma_sum / PATCH_COUNT as f64;
        if chroma_mean >= self.panel.mean_chroma_limit
            || chroma_max >= self.panel.max_chroma_limit
        {
            return Ok(false);
        }

        let cols = warp::GRID_COLS as usize;
        let mut previous = f64::INFINITY;
        for row in 0..warp::GRID_ROWS as usize {
            let mean_l =
                samples[row * cols..(row + 1) * cols].iter().map(|s| s.l).sum::<f64>()
                    / cols as f64;
            if previous < mean_l - self.panel.luminance_descent_slack {
                return Ok(false);
            }
            previous = mean_l;
        }

        Ok(true)
    }
}

/// Decode 8-bit Lab channel means back to floating-point L*a*b*
fn decode_lab8(l: f64, a: f64, b: f64) -> LabSample {
    LabSample::new(l * 100.0 / 255.0, a - 128.0, b - 128.0)
}
