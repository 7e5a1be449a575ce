//! Quad geometry: corner ordering, bounding boxes, corner distances
//!
//! Detected charts are quadrilaterals in frame coordinates. Downstream
//! stages require a canonical corner order (top-left, top-right,
//! bottom-right, bottom-left), defined by coordinate sums and differences:
//! TL minimizes x+y, BR maximizes x+y, and of the remaining two corners TR
//! maximizes x−y while BL minimizes it. Ties resolve to the earlier corner
//! in insertion order.

use serde::{Deserialize, Serialize};

/// A point in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Four corner points of a detected chart panel
pub type Quad = [PointF; 4];

/// Axis-aligned extent of a quad, clamped nonnegative
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Order corners as TL, TR, BR, BL.
///
/// Strict comparisons scan in index order, so equal keys keep the earlier
/// corner and the function is idempotent on already-ordered quads.
pub fn order_corners(quad: &Quad) -> Quad {
    let sum = |p: &PointF| f64::from(p.x) + f64::from(p.y);
    let diff = |p: &PointF| f64::from(p.x) - f64::from(p.y);

    let mut tl = 0;
    for i in 1..4 {
        if sum(&quad[i]) < sum(&quad[tl]) {
            tl = i;
        }
    }

    let mut br = if tl == 0 { 1 } else { 0 };
    for i in 0..4 {
        if i != tl && sum(&quad[i]) > sum(&quad[br]) {
            br = i;
        }
    }

    let mut rest = (0..4).filter(|&i| i != tl && i != br);
    let first = rest.next().unwrap_or(0);
    let second = rest.next().unwrap_or(0);
    let (tr, bl) = if diff(&quad[second]) > diff(&quad[first]) {
        (second, first)
    } else {
        (first, second)
    };

    [quad[tl], quad[tr], quad[br], quad[bl]]
}

/// Axis-aligned bounding box of a point set.
///
/// An empty slice yields a zero-sized box.
pub fn bounding_box(points: &[PointF]) -> BoundingBox {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for p in points {
        min_x = min_x.min(f64::from(p.x));
        min_y = min_y.min(f64::from(p.y));
        max_x = max_x.max(f64::from(p.x));
        max_y = max_y.max(f64::from(p.y));
    }

    BoundingBox {
        width: (max_x - min_x).max(0.0),
        height: (max_y - min_y).max(0.0),
    }
}

/// Average Euclidean distance between corresponding corners of two quads.
///
/// Corner order is compared as emitted; callers decide whether to
/// canonicalize first.
pub fn mean_corner_distance(a: &Quad, b: &Quad) -> f64 {
    let total: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(p, q)| {
            let dx = f64::from(p.x) - f64::from(q.x);
            let dy = f64::from(p.y) - f64::from(q.y);
            (dx * dx + dy * dy).sqrt()
        })
        .sum();
    total / 4.0
}
