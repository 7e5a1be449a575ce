//! Configuration for the verification pipeline
//!
//! Defaults reproduce the calibrated constants in [`crate::constants`];
//! experiments override individual knobs programmatically or load a whole
//! configuration from JSON:
//!
//! ```no_run
//! use chartcheck::VerifierConfig;
//! use std::path::Path;
//!
//! let config = VerifierConfig::from_json_file(Path::new("verifier.json"))?;
//! # Ok::<(), chartcheck::VerifyError>(())
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{detector, locator, panel, scoring, warp};
use crate::error::{Result, VerifyError};

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub locator: LocatorConfig,
    pub warp: WarpConfig,
    pub panel: PanelConfig,
    pub scoring: ScoringConfig,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            locator: LocatorConfig::default(),
            warp: WarpConfig::default(),
            panel: PanelConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl VerifierConfig {
    /// Load a configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults, so a file may override
    /// only the knobs an experiment cares about.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| VerifyError::config(format!("cannot read {}", path.display()), e))?;
        serde_json::from_str(&contents)
            .map_err(|e| VerifyError::config(format!("cannot parse {}", path.display()), e))
    }
}

/// Candidate localization parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Mean corner distance strictly below this merges two candidates
    pub dedup_distance_px: f64,
    pub detector: DetectorConfig,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            dedup_distance_px: locator::DEDUP_DISTANCE_PX,
            detector: DetectorConfig::default(),
        }
    }
}

/// Classical quad detector parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub canny_low: f64,
    pub canny_high: f64,
    /// Polygon approximation epsilon as a fraction of perimeter
    pub poly_epsilon: f64,
    pub min_quad_area_px: f64,
    pub min_bbox_aspect: f64,
    pub max_bbox_aspect: f64,
    pub grid_probe_min_distance: f64,
    pub grid_probe_min_fraction: f64,
    pub adaptive_block_size: i32,
    pub adaptive_offset: f64,
    pub min_patch_area_px: f64,
    pub max_patch_area_ratio: f64,
    pub patch_min_aspect: f64,
    pub patch_max_aspect: f64,
    pub min_cluster_patches: usize,
    pub cluster_reach: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            canny_low: detector::CANNY_LOW,
            canny_high: detector::CANNY_HIGH,
            poly_epsilon: detector::POLY_EPSILON,
            min_quad_area_px: detector::MIN_QUAD_AREA_PX,
            min_bbox_aspect: detector::MIN_BBOX_ASPECT,
            max_bbox_aspect: detector::MAX_BBOX_ASPECT,
            grid_probe_min_distance: detector::GRID_PROBE_MIN_DISTANCE,
            grid_probe_min_fraction: detector::GRID_PROBE_MIN_FRACTION,
            adaptive_block_size: detector::ADAPTIVE_BLOCK_SIZE,
            adaptive_offset: detector::ADAPTIVE_OFFSET,
            min_patch_area_px: detector::MIN_PATCH_AREA_PX,
            max_patch_area_ratio: detector::MAX_PATCH_AREA_RATIO,
            patch_min_aspect: detector::PATCH_MIN_ASPECT,
            patch_max_aspect: detector::PATCH_MAX_ASPECT,
            min_cluster_patches: detector::MIN_CLUSTER_PATCHES,
            cluster_reach: detector::CLUSTER_REACH,
        }
    }
}

/// Canonical warp canvas dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    pub canvas_width: i32,
    pub canvas_height: i32,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            canvas_width: warp::CANVAS_WIDTH,
            canvas_height: warp::CANVAS_HEIGHT,
        }
    }
}

/// Grayscale-panel acceptance limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub mean_chroma_limit: f64,
    pub max_chroma_limit: f64,
    pub luminance_descent_slack: f64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            mean_chroma_limit: panel::MEAN_CHROMA_LIMIT,
            max_chroma_limit: panel::MAX_CHROMA_LIMIT,
            luminance_descent_slack: panel::LUMINANCE_DESCENT_SLACK,
        }
    }
}

/// Confidence blending and failure classification parameters.
///
/// The scoring-scale ΔE values (`pass_avg_delta_e`, `pass_max_delta_e`) and
/// the acceptance guard (`not_found_delta_e_factor`) are deliberately
/// separate knobs; collapsing them changes behavior near the NotFound
/// boundary and needs measurement first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub expected_aspect: f64,
    pub area_boost: f64,
    pub blur_reference: f64,
    pub pass_avg_delta_e: f64,
    pub pass_max_delta_e: f64,
    pub not_found_delta_e_factor: f64,
    pub blur_fail_below: f64,
    pub partial_area_below: f64,
    pub lighting_contrast_below: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            expected_aspect: scoring::EXPECTED_ASPECT,
            area_boost: scoring::AREA_BOOST,
            blur_reference: scoring::BLUR_REFERENCE,
            pass_avg_delta_e: scoring::PASS_AVG_DELTA_E,
            pass_max_delta_e: scoring::PASS_MAX_DELTA_E,
            not_found_delta_e_factor: scoring::NOT_FOUND_DELTA_E_FACTOR,
            blur_fail_below: scoring::BLUR_FAIL_BELOW,
            partial_area_below: scoring::PARTIAL_AREA_BELOW,
            lighting_contrast_below: scoring::LIGHTING_CONTRAST_BELOW,
        }
    }
}
