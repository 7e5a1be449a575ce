//! Compile-time defaults for chart verification
//!
//! Every threshold the pipeline applies lives here, grouped by the stage
//! that consumes it. [`crate::config::VerifierConfig`] mirrors these values
//! and lets experiments override them; the constants are the calibrated
//! baseline.

/// Confidence scoring weights and failure thresholds
pub mod scoring {
    /// Expected chart aspect ratio (width / height) of a 6×4 panel
    pub const EXPECTED_ASPECT: f64 = 1.5;

    /// Multiplier lifting the raw frame-area fraction into a usable score.
    /// Empirical fit for phone-range framing distances; treat as a tunable,
    /// not a law.
    pub const AREA_BOOST: f64 = 8.0;

    /// Laplacian variance that maps to a blur score of 1.0
    pub const BLUR_REFERENCE: f64 = 120.0;

    /// Average ΔE2000 that maps the average-color sub-score to zero
    pub const PASS_AVG_DELTA_E: f64 = 24.0;

    /// Maximum ΔE2000 that maps the max-color sub-score to zero
    pub const PASS_MAX_DELTA_E: f64 = 40.0;

    /// Average ΔE above `PASS_AVG_DELTA_E × factor` means the sampled
    /// colors cannot belong to the chart at all
    pub const NOT_FOUND_DELTA_E_FACTOR: f64 = 1.3;

    /// Consumer-visible pass threshold on the final confidence
    pub const CONFIDENCE_THRESHOLD: f32 = 0.70;

    /// Blur score strictly below this classifies as a blur failure
    pub const BLUR_FAIL_BELOW: f64 = 0.15;

    /// Area score strictly below this classifies as a partial view
    pub const PARTIAL_AREA_BELOW: f64 = 0.005;

    /// Contrast score strictly below this classifies as a lighting failure
    pub const LIGHTING_CONTRAST_BELOW: f64 = 0.08;

    /// Blend of average vs. maximum ΔE inside the color score
    pub const AVG_COLOR_WEIGHT: f64 = 0.7;
    pub const MAX_COLOR_WEIGHT: f64 = 0.3;

    /// Confidence blend weights (sum to 1.0)
    pub const AREA_WEIGHT: f64 = 0.7;
    pub const ASPECT_WEIGHT: f64 = 0.1;
    pub const CONTRAST_WEIGHT: f64 = 0.05;
    pub const BLUR_WEIGHT: f64 = 0.05;
    pub const COLOR_WEIGHT: f64 = 0.1;
}

/// Canonical warp canvas and sampling grid
pub mod warp {
    /// Rectified canvas size the detected quad is projected into
    pub const CANVAS_WIDTH: i32 = 600;
    pub const CANVAS_HEIGHT: i32 = 400;

    /// Patch grid of the 24-patch chart, reading order row-major
    pub const GRID_COLS: i32 = 6;
    pub const GRID_ROWS: i32 = 4;

    /// Lower bound on the per-patch sampling ROI side
    pub const MIN_ROI_SIDE: i32 = 4;
}

/// Grayscale-panel acceptance limits
pub mod panel {
    /// Mean chroma across all 24 samples must stay below this
    pub const MEAN_CHROMA_LIMIT: f64 = 55.0;

    /// No single sample may exceed this chroma
    pub const MAX_CHROMA_LIMIT: f64 = 90.0;

    /// Per-row mean L* may rise at most this much between adjacent rows
    /// while still counting as non-increasing
    pub const LUMINANCE_DESCENT_SLACK: f64 = 2.0;
}

/// Focus and contrast measurement
pub mod quality {
    /// Intensity standard deviation that maps to a contrast score of 1.0
    pub const CONTRAST_NORMALIZATION: f64 = 64.0;

    /// Kernel side of the Gaussian smoothing applied to the gray frame
    pub const SMOOTHING_KERNEL: i32 = 5;
}

/// Candidate localization
pub mod locator {
    /// Quads whose mean corner distance is strictly below this are the
    /// same physical detection
    pub const DEDUP_DISTANCE_PX: f64 = 40.0;
}

/// Classical quad detector defaults
pub mod detector {
    /// Canny hysteresis thresholds on the smoothed gray image
    pub const CANNY_LOW: f64 = 50.0;
    pub const CANNY_HIGH: f64 = 150.0;

    /// Polygon approximation epsilon as a fraction of contour perimeter
    pub const POLY_EPSILON: f64 = 0.02;

    /// Candidate quads below this area are noise
    pub const MIN_QUAD_AREA_PX: f64 = 400.0;

    /// Bounding-box aspect band a candidate chart may occupy under
    /// perspective
    pub const MIN_BBOX_ASPECT: f64 = 0.4;
    pub const MAX_BBOX_ASPECT: f64 = 4.0;

    /// Grid probe: BGR distance for two neighboring grid cells to count as
    /// distinct, and the fraction of distinct horizontal neighbors a real
    /// patch grid must show. The distance floor sits just above warp
    /// interpolation noise so charts stay recognizable under compressed
    /// exposures while uniform surfaces still read as structureless.
    pub const GRID_PROBE_MIN_DISTANCE: f64 = 2.5;
    pub const GRID_PROBE_MIN_FRACTION: f64 = 0.55;

    /// Probe canvas; a scaled-down rectification used only to inspect grid
    /// structure
    pub const PROBE_CANVAS_WIDTH: i32 = 120;
    pub const PROBE_CANVAS_HEIGHT: i32 = 80;

    /// Adaptive threshold window and offset for the patch-clustering
    /// fallback
    pub const ADAPTIVE_BLOCK_SIZE: i32 = 51;
    pub const ADAPTIVE_OFFSET: f64 = 7.0;

    /// Individual patch candidates for the clustering fallback
    pub const MIN_PATCH_AREA_PX: f64 = 64.0;
    pub const MAX_PATCH_AREA_RATIO: f64 = 0.125;

    /// Squarish aspect band an individual patch candidate may occupy under
    /// perspective
    pub const PATCH_MIN_ASPECT: f64 = 0.4;
    pub const PATCH_MAX_ASPECT: f64 = 2.5;

    /// A cluster must gather at least this many patch candidates before it
    /// is promoted to a chart hypothesis
    pub const MIN_CLUSTER_PATCHES: usize = 6;

    /// Neighbor reach when clustering, in units of √patch-area
    pub const CLUSTER_REACH: f64 = 2.5;
}
