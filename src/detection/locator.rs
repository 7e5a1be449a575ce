//! Two-stage chart localization
//!
//! Stage 1 runs the detector over the full frame, which is fast and covers
//! single panels as well as close-together dual panels. If fewer than two
//! candidates come back, stage 2 reruns the detector on the left and right
//! halves; widely separated passport panels that blur into the background
//! of a full-frame pass are recovered there. Half-frame coordinates are
//! translated back before the candidate lists are merged and deduplicated.

use opencv::{
    core::{Mat, Rect},
    prelude::*,
};

use super::detector::QuadDetector;
use crate::config::LocatorConfig;
use crate::error::{Result, VerifyError};
use crate::geometry::{mean_corner_distance, PointF, Quad};

/// Candidate chart localization over a BGR frame
pub trait LocateCharts {
    /// Zero or more deduplicated candidate quads in full-image coordinates
    fn locate_all(&self, bgr: &Mat) -> Result<Vec<Quad>>;
}

/// Production locator wrapping the classical quad detector
#[derive(Debug, Clone)]
pub struct ChartLocator {
    detector: QuadDetector,
    dedup_distance_px: f64,
}

impl Default for ChartLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartLocator {
    pub fn new() -> Self {
        Self::with_config(LocatorConfig::default())
    }

    pub fn with_config(config: LocatorConfig) -> Self {
        Self {
            detector: QuadDetector::with_config(config.detector),
            dedup_distance_px: config.dedup_distance_px,
        }
    }
}

impl LocateCharts for ChartLocator {
    fn locate_all(&self, bgr: &Mat) -> Result<Vec<Quad>> {
        let mut found = self.detector.detect(bgr)?;

        // Two candidates from the full pass mean both passport panels are
        // already accounted for.
        if found.len() < 2 {
            let width = bgr.cols();
            let height = bgr.rows();
            let half = width / 2;
            if half > 0 && width - half > 0 {
                for (origin, span) in [(0, half), (half, width - half)] {
                    let view = Mat::roi(bgr, Rect::new(origin, 0, span, height))
                        .map_err(|e| VerifyError::opencv("half-frame view", e))?;
                    let half_frame = view
                        .try_clone()
                        .map_err(|e| VerifyError::opencv("half-frame copy", e))?;
                    for quad in self.detector.detect(&half_frame)? {
                        found.push(quad.map(|p| PointF::new(p.x + origin as f32, p.y)));
                    }
                }
            }
        }

        Ok(dedup_quads(found, self.dedup_distance_px))
    }
}

/// Keep the first of any group of quads whose mean corner distance is
/// strictly below the merge threshold. Corner order is compared as emitted.
fn dedup_quads(quads: Vec<Quad>, merge_below: f64) -> Vec<Quad> {
    let mut kept: Vec<Quad> = Vec::with_capacity(quads.len());
    for quad in quads {
        let duplicate = kept
            .iter()
            .any(|seen| mean_corner_distance(seen, &quad) < merge_below);
        if !duplicate {
            kept.push(quad);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_at(x: f32, y: f32, w: f32, h: f32) -> Quad {
        [
            PointF::new(x, y),
            PointF::new(x + w, y),
            PointF::new(x + w, y + h),
            PointF::new(x, y + h),
        ]
    }

    #[test]
    fn test_dedup_merges_near_duplicates() {
        let a = quad_at(100.0, 100.0, 300.0, 200.0);
        let b = quad_at(110.0, 105.0, 300.0, 200.0); // mean distance ≈ 11.2
        let kept = dedup_quads(vec![a, b], 40.0);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0], a);
    }

    #[test]
    fn test_dedup_keeps_distinct_quads() {
        let a = quad_at(100.0, 100.0, 300.0, 200.0);
        let b = quad_at(700.0, 100.0, 300.0, 200.0);
        let kept = dedup_quads(vec![a, b], 40.0);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_dedup_threshold_is_strict() {
        let a = quad_at(0.0, 0.0, 100.0, 100.0);
        // Every corner exactly 40 px away: mean distance is exactly 40.
        let b: Quad = [
            PointF::new(40.0, 0.0),
            PointF::new(140.0, 0.0),
            PointF::new(140.0, 100.0),
            PointF::new(40.0, 100.0),
        ];
        assert_eq!(dedup_quads(vec![a, b], 40.0).len(), 2);

        let c: Quad = [
            PointF::new(39.9, 0.0),
            PointF::new(139.9, 0.0),
            PointF::new(139.9, 100.0),
            PointF::new(39.9, 100.0),
        ];
        assert_eq!(dedup_quads(vec![a, c], 40.0).len(), 1);
    }

    #[test]
    fn test_dedup_chain_keeps_first() {
        // b is close to a, c is close to b but not to a; b merges into a,
        // and c survives because it is compared against the kept list only.
        let a = quad_at(0.0, 0.0, 100.0, 100.0);
        let b = quad_at(30.0, 0.0, 100.0, 100.0);
        let c = quad_at(60.0, 0.0, 100.0, 100.0);
        let kept = dedup_quads(vec![a, b, c], 40.0);
        assert_eq!(kept, vec![a, c]);
    }
}
