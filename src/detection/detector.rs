//! Classical 24-patch chart detector
//!
//! Two complementary strategies on the same smoothed grayscale image:
//!
//! 1. **Boundary quads.** Canny edges, a closing dilation, external
//!    contours, polygon approximation. Candidate quadrilaterals are kept
//!    only when a low-resolution rectification shows actual patch-grid
//!    structure (neighboring cells with distinct colors), which discards
//!    plain rectangles (paper, screens) and half-chart cutouts.
//! 2. **Patch clustering.** When no boundary quad survives, an adaptive
//!    threshold segments individual patch interiors, squarish candidates
//!    are clustered by proximity, and each sufficiently large cluster is
//!    promoted to a chart hypothesis spanning its corner extremes. This
//!    recovers charts whose outer boundary does not contour cleanly, e.g.
//!    dark frames on dark backgrounds. Cluster hypotheses pass through the
//!    same grid probe before they are emitted.
//!
//! All buffers are scoped to a single call; nothing is cached between
//! frames.

use std::collections::HashMap;

use opencv::{
    core::{self, Mat, Point, Point2f, Rect, Scalar, Size, Vector},
    imgproc,
    prelude::*,
};

use crate::config::DetectorConfig;
use crate::constants::detector::{PROBE_CANVAS_HEIGHT, PROBE_CANVAS_WIDTH};
use crate::constants::warp::{GRID_COLS, GRID_ROWS};
use crate::error::{Result, VerifyError};
use crate::geometry::{bounding_box, order_corners, PointF, Quad};

/// One segmented patch interior, input to clustering
struct PatchCandidate {
    center: PointF,
    area: f64,
    corners: [PointF; 4],
}

/// Classical quad detector over a BGR image
#[derive(Debug, Clone)]
pub struct QuadDetector {
    config: DetectorConfig,
}

impl Default for QuadDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadDetector {
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    pub fn with_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Detect candidate chart quads in full-image coordinates
    pub fn detect(&self, bgr: &Mat) -> Result<Vec<Quad>> {
        let gray = smoothed_gray(bgr)?;

        let mut quads = Vec::new();
        for quad in self.boundary_candidates(&gray)? {
            if self.looks_like_patch_grid(bgr, &quad)? {
                quads.push(quad);
            }
        }
        if quads.is_empty() {
            for quad in self.cluster_candidates(&gray)? {
                if self.looks_like_patch_grid(bgr, &quad)? {
                    quads.push(quad);
                }
            }
        }
        Ok(quads)
    }

    /// Large convex quadrilaterals from external edge contours
    fn boundary_candidates(&self, gray: &Mat) -> Result<Vec<Quad>> {
        let mut edges = Mat::default();
        imgproc::canny(
            gray,
            &mut edges,
            self.config.canny_low,
            self.config.canny_high,
            3,
            false,
        )
        .map_err(|e| VerifyError::opencv("Canny edge detection", e))?;

        let kernel = imgproc::get_structuring_element(
            imgproc::MORPH_RECT,
            Size::new(3, 3),
            Point::new(-1, -1),
        )
        .map_err(|e| VerifyError::opencv("structuring element", e))?;

        let mut closed = Mat::default();
        imgproc::dilate(
            &edges,
            &mut closed,
            &kernel,
            Point::new(-1, -1),
            1,
            core::BORDER_CONSTANT,
            Scalar::all(0.0),
        )
        .map_err(|e| VerifyError::opencv("edge dilation", e))?;

        let mut contours = Vector::<Vector<Point>>::new();
        imgproc::find_contours(
            &closed,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )
        .map_err(|e| VerifyError::opencv("contour extraction", e))?;

        let mut quads = Vec::new();
        for contour in contours.iter() {
            if let Some(quad) = self.quad_from_contour(&contour)? {
                quads.push(quad);
            }
        }
        Ok(quads)
    }

    /// Approximate a contour to a convex quadrilateral within the area and
    /// aspect bands, or reject it
    fn quad_from_contour(&self, contour: &Vector<Point>) -> Result<Option<Quad>> {
        let area = imgproc::contour_area(contour, false)
            .map_err(|e| VerifyError::opencv("contour area", e))?;
        if area < self.config.min_quad_area_px {
            return Ok(None);
        }

        let perimeter = imgproc::arc_length(contour, true)
            .map_err(|e| VerifyError::opencv("contour perimeter", e))?;
        let mut approx = Vector::<Point>::new();
        // Noisy or softened boundaries need a coarser tolerance before
        // they settle into four corners; the grid probe rejects whatever
        // the coarse passes let through.
        for scale in [1.0, 2.5, 5.0] {
            imgproc::approx_poly_dp(
                contour,
                &mut approx,
                self.config.poly_epsilon * perimeter * scale,
                true,
            )
            .map_err(|e| VerifyError::opencv("polygon approximation", e))?;
            if approx.len() == 4 {
                break;
            }
        }

        if approx.len() != 4 {
            return Ok(None);
        }
        if !imgproc::is_contour_convex(&approx)
            .map_err(|e| VerifyError::opencv("convexity test", e))?
        {
            return Ok(None);
        }

        let mut quad = [PointF::new(0.0, 0.0); 4];
        for (i, p) in approx.iter().enumerate() {
            quad[i] = PointF::new(p.x as f32, p.y as f32);
        }

        let bb = bounding_box(&quad);
        let aspect = bb.width / bb.height.max(1.0);
        if aspect < self.config.min_bbox_aspect || aspect > self.config.max_bbox_aspect {
            return Ok(None);
        }
        Ok(Some(quad))
    }

    /// Rectify the candidate at low resolution and require that enough
    /// horizontally adjacent grid cells carry distinct colors
    fn looks_like_patch_grid(&self, bgr: &Mat, quad: &Quad) -> Result<bool> {
        let ordered = order_corners(quad);
        let mut src = Vector::<Point2f>::new();
        for p in &ordered {
            src.push(Point2f::new(p.x, p.y));
        }
        let mut dst = Vector::<Point2f>::new();
        dst.push(Point2f::new(0.0, 0.0));
        dst.push(Point2f::new(PROBE_CANVAS_WIDTH as f32, 0.0));
        dst.push(Point2f::new(
            PROBE_CANVAS_WIDTH as f32,
            PROBE_CANVAS_HEIGHT as f32,
        ));
        dst.push(Point2f::new(0.0, PROBE_CANVAS_HEIGHT as f32));

        let transform = imgproc::get_perspective_transform(&src, &dst, core::DECOMP_LU)
            .map_err(|e| VerifyError::opencv("probe transform", e))?;
        let mut probe = Mat::default();
        imgproc::warp_perspective(
            bgr,
            &mut probe,
            &transform,
            Size::new(PROBE_CANVAS_WIDTH, PROBE_CANVAS_HEIGHT),
            imgproc::INTER_LINEAR,
            core::BORDER_CONSTANT,
            Scalar::default(),
        )
        .map_err(|e| VerifyError::opencv("probe warp", e))?;

        let cell_w = PROBE_CANVAS_WIDTH / GRID_COLS;
        let cell_h = PROBE_CANVAS_HEIGHT / GRID_ROWS;
        let mut cells = [[0.0f64; 3]; (GRID_COLS * GRID_ROWS) as usize];
        for row in 0..GRID_ROWS {
            for col in 0..GRID_COLS {
                let window = Rect::new(
                    col * cell_w + cell_w / 4,
                    row * cell_h + cell_h / 4,
                    cell_w / 2,
                    cell_h / 2,
                );
                let roi = Mat::roi(&probe, window)
                    .map_err(|e| VerifyError::opencv("probe window", e))?;
                let mean = core::mean(&*roi, &core::no_array())
                    .map_err(|e| VerifyError::opencv("probe mean", e))?;
                cells[(row * GRID_COLS + col) as usize] = [mean[0], mean[1], mean[2]];
            }
        }

        let mut distinct = 0usize;
        let mut pairs = 0usize;
        for row in 0..GRID_ROWS as usize {
            for col in 0..(GRID_COLS - 1) as usize {
                let left = cells[row * GRID_COLS as usize + col];
                let right = cells[row * GRID_COLS as usize + col + 1];
                let distance = (0..3)
                    .map(|ch| (left[ch] - right[ch]) * (left[ch] - right[ch]))
                    .sum::<f64>()
                    .sqrt();
                pairs += 1;
                if distance >= self.config.grid_probe_min_distance {
                    distinct += 1;
                }
            }
        }

        Ok(distinct as f64 / pairs as f64 >= self.config.grid_probe_min_fraction)
    }

    /// Segment individual patch interiors and promote dense clusters to
    /// chart hypotheses
    fn cluster_candidates(&self, gray: &Mat) -> Result<Vec<Quad>> {
        let image_area = f64::from(gray.cols()) * f64::from(gray.rows());

        let mut binary = Mat::default();
        imgproc::adaptive_threshold(
            gray,
            &mut binary,
            255.0,
            imgproc::ADAPTIVE_THRESH_MEAN_C,
            imgproc::THRESH_BINARY,
            self.config.adaptive_block_size,
            self.config.adaptive_offset,
        )
        .map_err(|e| VerifyError::opencv("adaptive threshold", e))?;

        let mut contours = Vector::<Vector<Point>>::new();
        imgproc::find_contours(
            &binary,
            &mut contours,
            imgproc::RETR_LIST,
            imgproc::CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )
        .map_err(|e| VerifyError::opencv("patch contour extraction", e))?;

        let mut candidates = Vec::new();
        for contour in contours.iter() {
            if let Some(candidate) = self.patch_from_contour(&contour, image_area)? {
                candidates.push(candidate);
            }
        }

        Ok(self.promote_clusters(&candidates))
    }

    /// A patch candidate must be a small squarish convex quadrilateral
    fn patch_from_contour(
        &self,
        contour: &Vector<Point>,
        image_area: f64,
    ) -> Result<Option<PatchCandidate>> {
        let area = imgproc::contour_area(contour, false)
            .map_err(|e| VerifyError::opencv("patch area", e))?;
        if area < self.config.min_patch_area_px
            || area > image_area * self.config.max_patch_area_ratio
        {
            return Ok(None);
        }

        let perimeter = imgproc::arc_length(contour, true)
            .map_err(|e| VerifyError::opencv("patch perimeter", e))?;
        let mut approx = Vector::<Point>::new();
        imgproc::approx_poly_dp(
            contour,
            &mut approx,
            self.config.poly_epsilon * perimeter * 2.0,
            true,
        )
        .map_err(|e| VerifyError::opencv("patch approximation", e))?;
        if approx.len() != 4 {
            return Ok(None);
        }
        if !imgproc::is_contour_convex(&approx)
            .map_err(|e| VerifyError::opencv("patch convexity", e))?
        {
            return Ok(None);
        }

        let rect = imgproc::bounding_rect(&approx)
            .map_err(|e| VerifyError::opencv("patch bounding rect", e))?;
        let aspect = f64::from(rect.width) / f64::from(rect.height.max(1));
        if aspect < self.config.patch_min_aspect || aspect > self.config.patch_max_aspect {
            return Ok(None);
        }

        let mut corners = [PointF::new(0.0, 0.0); 4];
        let mut cx = 0.0f32;
        let mut cy = 0.0f32;
        for (i, p) in approx.iter().enumerate() {
            corners[i] = PointF::new(p.x as f32, p.y as f32);
            cx += p.x as f32;
            cy += p.y as f32;
        }

        Ok(Some(PatchCandidate {
            center: PointF::new(cx / 4.0, cy / 4.0),
            area,
            corners,
        }))
    }

    /// Union-find over candidate proximity; clusters with enough members
    /// become chart quads spanning their corner extremes
    fn promote_clusters(&self, candidates: &[PatchCandidate]) -> Vec<Quad> {
        let n = candidates.len();
        let mut parent: Vec<usize> = (0..n).collect();

        for i in 0..n {
            for j in (i + 1)..n {
                let reach =
                    self.config.cluster_reach * candidates[i].area.max(candidates[j].area).sqrt();
                let dx = f64::from(candidates[i].center.x - candidates[j].center.x);
                let dy = f64::from(candidates[i].center.y - candidates[j].center.y);
                if (dx * dx + dy * dy).sqrt() < reach {
                    union(&mut parent, i, j);
                }
            }
        }

        let mut clusters: HashMap<usize, Vec<usize>> = HashMap::new();
        for i in 0..n {
            clusters.entry(find(&mut parent, i)).or_default().push(i);
        }

        let mut quads = Vec::new();
        // Deterministic output order regardless of hash iteration.
        let mut roots: Vec<usize> = clusters.keys().copied().collect();
        roots.sort_unstable();
        for root in roots {
            let members = &clusters[&root];
            if members.len() < self.config.min_cluster_patches {
                continue;
            }
            let quad = corner_extremes(members.iter().flat_map(|&i| candidates[i].corners));
            let bb = bounding_box(&quad);
            let aspect = bb.width / bb.height.max(1.0);
            if bb.area() >= self.config.min_quad_area_px
                && aspect >= self.config.min_bbox_aspect
                && aspect <= self.config.max_bbox_aspect
            {
                quads.push(quad);
            }
        }
        quads
    }
}

/// Grayscale with a light Gaussian against sensor noise, then stretched to
/// full range so the fixed edge thresholds behave the same under dim or
/// washed-out exposures. Featureless images are left untouched.
fn smoothed_gray(bgr: &Mat) -> Result<Mat> {
    let mut gray = Mat::default();
    imgproc::cvt_color(
        bgr,
        &mut gray,
        imgproc::COLOR_BGR2GRAY,
        0,
        core::AlgorithmHint::ALGO_HINT_DEFAULT,
    )
    .map_err(|e| VerifyError::opencv("grayscale conversion", e))?;

    let mut smoothed = Mat::default();
    imgproc::gaussian_blur(
        &gray,
        &mut smoothed,
        Size::new(5, 5),
        0.0,
        0.0,
        core::BORDER_DEFAULT,
        core::AlgorithmHint::ALGO_HINT_DEFAULT,
    )
    .map_err(|e| VerifyError::opencv("Gaussian smoothing", e))?;

    let mut lo = 0.0;
    let mut hi = 0.0;
    core::min_max_loc(
        &smoothed,
        Some(&mut lo),
        Some(&mut hi),
        None,
        None,
        &core::no_array(),
    )
    .map_err(|e| VerifyError::opencv("intensity range", e))?;
    if hi - lo < 1.0 {
        return Ok(smoothed);
    }

    let mut stretched = Mat::default();
    core::normalize(
        &smoothed,
        &mut stretched,
        0.0,
        255.0,
        core::NORM_MINMAX,
        -1,
        &core::no_array(),
    )
    .map_err(|e| VerifyError::opencv("contrast stretch", e))?;
    Ok(stretched)
}

/// TL/TR/BR/BL extremes of a point cloud by coordinate sums and differences
fn corner_extremes(points: impl IntoIterator<Item = PointF>) -> Quad {
    let mut iter = points.into_iter();
    let first = iter.next().unwrap_or(PointF::new(0.0, 0.0));
    let mut tl = first;
    let mut tr = first;
    let mut br = first;
    let mut bl = first;
    for p in iter {
        if p.x + p.y < tl.x + tl.y {
            tl = p;
        }
        if p.x - p.y > tr.x - tr.y {
            tr = p;
        }
        if p.x + p.y > br.x + br.y {
            br = p;
        }
        if p.x - p.y < bl.x - bl.y {
            bl = p;
        }
    }
    [tl, tr, br, bl]
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[rb] = ra;
    }
}
