//! Focus and contrast metrics on the grayscale frame
//!
//! Two scalar measurements feed the confidence blend: intensity spread
//! (contrast) and variance of the Laplacian response (sharpness). Both are
//! pure functions of the input image; repeated calls on the same buffer
//! return identical values.

use opencv::{
    core::{self, Mat, Vector},
    imgproc,
    prelude::*,
};

use crate::constants::quality;
use crate::error::{Result, VerifyError};

/// Aperture of the Laplacian used for the sharpness response
const LAPLACIAN_APERTURE: i32 = 3;

/// Scalar quality measurements on a single-channel 8-bit image
pub trait MeasureQuality {
    /// Normalized intensity spread in [0,1]
    fn contrast(&self, gray: &Mat) -> Result<f64>;

    /// Variance of the 64-bit Laplacian response, ≥ 0
    fn laplacian_variance(&self, gray: &Mat) -> Result<f64>;
}

/// Production quality analyzer
#[derive(Debug, Clone)]
pub struct QualityAnalyzer {
    /// Intensity σ mapping to a contrast score of 1.0
    contrast_normalization: f64,
}

impl Default for QualityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl QualityAnalyzer {
    pub fn new() -> Self {
        Self {
            contrast_normalization: quality::CONTRAST_NORMALIZATION,
        }
    }

    fn intensity_sigma(gray: &Mat) -> Result<f64> {
        let mut mean = Vector::<f64>::new();
        let mut stddev = Vector::<f64>::new();
        core::mean_std_dev(gray, &mut mean, &mut stddev, &core::no_array())
            .map_err(|e| VerifyError::opencv("intensity statistics", e))?;
        stddev
            .get(0)
            .map_err(|e| VerifyError::opencv("read intensity sigma", e))
    }
}

impl MeasureQuality for QualityAnalyzer {
    fn contrast(&self, gray: &Mat) -> Result<f64> {
        let sigma = Self::intensity_sigma(gray)?;
        Ok((sigma / self.contrast_normalization).clamp(0.0, 1.0))
    }

    fn laplacian_variance(&self, gray: &Mat) -> Result<f64> {
        let mut response = Mat::default();
        imgproc::laplacian(
            gray,
            &mut response,
            core::CV_64F,
            LAPLACIAN_APERTURE,
            1.0,
            0.0,
            core::BORDER_DEFAULT,
        )
        .map_err(|e| VerifyError::opencv("Laplacian filter", e))?;

        let sigma = Self::intensity_sigma(&response)?;
        Ok(sigma * sigma)
    }
}
