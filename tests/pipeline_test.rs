//! Integration tests for the complete frame verification pipeline
//!
//! Scenes are synthesized in memory: the 24 reference colors painted as a
//! 6×4 grid on a dark background, with passport variants adding a neutral
//! gray ramp as a second panel. The tests validate end-to-end behavior:
//! localization, patch scoring, panel validation, failure taxonomy, and
//! determinism.

use chartcheck::color::reference_chart_srgb8;
use chartcheck::{verify_frame, ChartVerifier, DetectionOutput, FailureReason, Frame, PointF};

// ============================================================================
// Scene synthesis helpers
// ============================================================================

struct Canvas {
    width: i32,
    height: i32,
    pixels: Vec<u8>,
}

impl Canvas {
    fn filled(width: i32, height: i32, rgb: [u8; 3]) -> Self {
        let mut pixels = vec![0u8; (width * height * 4) as usize];
        for px in pixels.chunks_exact_mut(4) {
            px[0] = rgb[0];
            px[1] = rgb[1];
            px[2] = rgb[2];
            px[3] = 255;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Paint a 6×4 grid of patches with its top-left at (ox, oy)
    fn paint_grid(&mut self, ox: i32, oy: i32, cell_w: i32, cell_h: i32, colors: &[[u8; 3]; 24]) {
        for row in 0..4 {
            for col in 0..6 {
                let rgb = colors[(row * 6 + col) as usize];
                for y in oy + row * cell_h..oy + (row + 1) * cell_h {
                    for x in ox + col * cell_w..ox + (col + 1) * cell_w {
                        let at = ((y * self.width + x) * 4) as usize;
                        self.pixels[at] = rgb[0];
                        self.pixels[at + 1] = rgb[1];
                        self.pixels[at + 2] = rgb[2];
                    }
                }
            }
        }
    }

    fn frame(&self, rotation_degrees: i32) -> Frame<'_> {
        Frame::new(self.width, self.height, rotation_degrees, &self.pixels)
    }
}

/// Neutral ramp descending in reading order, 24 distinct gray steps
fn gray_ramp_colors() -> [[u8; 3]; 24] {
    let mut colors = [[0u8; 3]; 24];
    for (i, rgb) in colors.iter_mut().enumerate() {
        let level = (240 - i as i32 * 9) as u8;
        *rgb = [level, level, level];
    }
    colors
}

/// The reference chart centered in a 1200×800 frame on a dark background
fn perfect_chart_canvas() -> Canvas {
    let mut canvas = Canvas::filled(1200, 800, [0, 0, 0]);
    canvas.paint_grid(300, 200, 100, 100, &reference_chart_srgb8());
    canvas
}

/// Separable Gaussian convolution over the RGB channels, clamped borders
fn gaussian_blur_canvas(canvas: &mut Canvas, sigma: f64) {
    const RADIUS: i32 = 10; // 21×21 kernel

    let mut kernel = [0.0f64; (2 * RADIUS + 1) as usize];
    let mut total = 0.0;
    for (i, weight) in kernel.iter_mut().enumerate() {
        let d = i as f64 - RADIUS as f64;
        *weight = (-d * d / (2.0 * sigma * sigma)).exp();
        total += *weight;
    }
    for weight in kernel.iter_mut() {
        *weight /= total;
    }

    let (w, h) = (canvas.width, canvas.height);
    let mut scratch = canvas.pixels.clone();
    for y in 0..h {
        for x in 0..w {
            for ch in 0..3usize {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = (x + k as i32 - RADIUS).clamp(0, w - 1);
                    acc += weight * f64::from(canvas.pixels[((y * w + sx) * 4) as usize + ch]);
                }
                scratch[((y * w + x) * 4) as usize + ch] = acc.round() as u8;
            }
        }
    }
    for y in 0..h {
        for x in 0..w {
            for ch in 0..3usize {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let sy = (y + k as i32 - RADIUS).clamp(0, h - 1);
                    acc += weight * f64::from(scratch[((sy * w + x) * 4) as usize + ch]);
                }
                canvas.pixels[((y * w + x) * 4) as usize + ch] = acc.round() as u8;
            }
        }
    }
}

/// Deterministic speckle offsets, the texture a real sensor would add
fn speckle(mut seed: u32) -> impl FnMut() -> i32 {
    move || {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        ((seed >> 16) % 25) as i32 - 12
    }
}

fn corner_near(p: PointF, x: f32, y: f32) {
    assert!(
        (p.x - x).abs() < 8.0 && (p.y - y).abs() < 8.0,
        "corner {:?} not near ({x}, {y})",
        p
    );
}

// ============================================================================
// Single-panel scenarios
// ============================================================================

#[test]
fn test_perfect_chart_verifies() {
    let canvas = perfect_chart_canvas();
    let verifier = ChartVerifier::new();
    let output = verifier.detect(&canvas.frame(0));

    assert_eq!(output.failure_reason, FailureReason::None);
    assert!(!output.needs_input);
    assert!(output.confidence >= 0.9, "confidence {}", output.confidence);
    assert!(output.passes());

    let metrics = output.metrics.expect("metrics for a located chart");
    assert_eq!(metrics.primary_quad.len(), 4);
    corner_near(metrics.primary_quad[0], 300.0, 200.0);
    corner_near(metrics.primary_quad[1], 900.0, 200.0);
    corner_near(metrics.primary_quad[2], 900.0, 600.0);
    corner_near(metrics.primary_quad[3], 300.0, 600.0);

    // A single panel: the split pass must not invent a second quad.
    assert!(metrics.secondary_quad.is_empty());
    assert!(!metrics.secondary_valid);

    let avg = metrics.avg_delta_e.expect("avg ΔE");
    let max = metrics.max_delta_e.expect("max ΔE");
    assert!(avg < 3.0, "avg ΔE {avg}");
    assert!(max >= avg);
    assert!((metrics.area_score - 0.25).abs() < 0.02);
    assert!(metrics.aspect_score > 0.95);
}

#[test]
fn test_metric_invariants_hold() {
    let canvas = perfect_chart_canvas();
    let output = ChartVerifier::new().detect(&canvas.frame(0));
    let metrics = output.metrics.expect("metrics");

    assert!((0.0..=1.0).contains(&output.confidence));
    for score in [
        metrics.aspect_score,
        metrics.contrast_score,
        metrics.blur_score,
        metrics.color_score,
    ] {
        assert!((0.0..=1.0).contains(&score), "score {score} out of range");
    }
    assert!(metrics.avg_delta_e.unwrap() >= 0.0);
    assert!(metrics.max_delta_e.unwrap() >= metrics.avg_delta_e.unwrap());

    // Corner order satisfies the TL/TR/BR/BL predicate.
    let q = &metrics.primary_quad;
    for p in q {
        assert!(q[0].x + q[0].y <= p.x + p.y + 1e-3);
        assert!(q[2].x + q[2].y >= p.x + p.y - 1e-3);
    }
    assert!(q[1].x - q[1].y >= q[3].x - q[3].y);
}

#[test]
fn test_empty_frame_reports_not_found() {
    let canvas = Canvas::filled(1280, 720, [128, 128, 128]);
    let output = ChartVerifier::new().detect(&canvas.frame(0));

    assert_eq!(output.confidence, 0.0);
    assert_eq!(output.failure_reason, FailureReason::NotFound);
    assert!(!output.needs_input);
    assert!(output.metrics.is_none());
}

#[test]
fn test_invalid_frames_need_input() {
    let verifier = ChartVerifier::new();

    for frame in [
        Frame::new(0, 720, 0, &[]),
        Frame::new(1280, -3, 0, &[]),
        Frame::new(16, 16, 0, &[0u8; 15]),
    ] {
        let output = verifier.detect(&frame);
        assert_eq!(output, DetectionOutput::invalid_input());
        assert!(output.needs_input);
    }
}

#[test]
fn test_detect_is_idempotent() {
    let canvas = perfect_chart_canvas();
    let verifier = ChartVerifier::new();
    let first = verifier.detect(&canvas.frame(0));
    let second = verifier.detect(&canvas.frame(0));
    assert_eq!(first, second);
}

#[test]
fn test_rotation_metadata_is_passthrough() {
    let canvas = perfect_chart_canvas();
    let output = ChartVerifier::new().detect(&canvas.frame(180));
    assert_eq!(output.metrics.expect("metrics").rotation_degrees, 180);
}

#[test]
fn test_blurred_chart_reports_blur() {
    let mut canvas = perfect_chart_canvas();
    gaussian_blur_canvas(&mut canvas, 2.0);

    let output = ChartVerifier::new().detect(&canvas.frame(0));
    assert_eq!(output.failure_reason, FailureReason::Blur);
    assert!(!output.needs_input);

    let metrics = output.metrics.expect("blurred chart still locates");
    assert!(metrics.blur_score < 0.15, "blur_score {}", metrics.blur_score);
}

#[test]
fn test_tiny_chart_reports_partial() {
    // Speckled mid-gray background: the frame itself is sharp, only the
    // chart is far away.
    let mut canvas = Canvas::filled(1920, 1080, [128, 128, 128]);
    let mut noise = speckle(7);
    for px in canvas.pixels.chunks_exact_mut(4) {
        let level = (128 + noise()).clamp(0, 255) as u8;
        px[0] = level;
        px[1] = level;
        px[2] = level;
    }
    // The chart at 1/20 linear scale: 5-pixel cells, 30×20 overall.
    canvas.paint_grid(500, 400, 5, 5, &reference_chart_srgb8());

    let output = ChartVerifier::new().detect(&canvas.frame(0));
    assert_eq!(output.failure_reason, FailureReason::Partial);
    assert!(!output.needs_input);

    let metrics = output.metrics.expect("tiny chart still locates");
    assert!(metrics.area_score < 0.005, "area_score {}", metrics.area_score);
    assert!(metrics.blur_score >= 0.15);
}

#[test]
fn test_low_contrast_chart_reports_lighting() {
    // The chart on mid-gray padding, with fine stripe texture away from
    // the chart keeping the sharpness response alive, every pixel then
    // linearly remapped into [110, 140].
    let mut canvas = Canvas::filled(1200, 800, [128, 128, 128]);
    canvas.paint_grid(300, 200, 100, 100, &reference_chart_srgb8());
    for y in 0..canvas.height {
        for x in 0..canvas.width {
            if (240..960).contains(&x) && (140..660).contains(&y) {
                continue;
            }
            let offset: i32 = if (x / 2) % 2 == 0 { 50 } else { -50 };
            let at = ((y * canvas.width + x) * 4) as usize;
            for ch in 0..3 {
                let v = i32::from(canvas.pixels[at + ch]) + offset;
                canvas.pixels[at + ch] = v.clamp(0, 255) as u8;
            }
        }
    }
    for px in canvas.pixels.chunks_exact_mut(4) {
        for ch in 0..3 {
            px[ch] = (110.0 + f64::from(px[ch]) * 30.0 / 255.0).round() as u8;
        }
    }

    let output = ChartVerifier::new().detect(&canvas.frame(0));
    assert_eq!(output.failure_reason, FailureReason::Lighting);
    assert!(!output.needs_input);

    let metrics = output.metrics.expect("low-contrast chart still locates");
    assert!(
        metrics.contrast_score < 0.08,
        "contrast_score {}",
        metrics.contrast_score
    );
    assert!(metrics.blur_score >= 0.15);
}

// ============================================================================
// Passport scenario
// ============================================================================

#[test]
fn test_passport_with_gray_ramp_panel() {
    let mut canvas = Canvas::filled(2600, 900, [0, 0, 0]);
    // Color panel slightly larger so primary selection is unambiguous.
    canvas.paint_grid(388, 242, 104, 104, &reference_chart_srgb8());
    canvas.paint_grid(1600, 258, 96, 96, &gray_ramp_colors());

    let output = ChartVerifier::new().detect(&canvas.frame(0));
    assert_eq!(output.failure_reason, FailureReason::None);
    assert!(!output.needs_input);
    assert!(output.confidence >= 0.7, "confidence {}", output.confidence);

    let metrics = output.metrics.expect("metrics");
    assert_eq!(metrics.primary_quad.len(), 4);
    assert_eq!(metrics.secondary_quad.len(), 4);
    assert!(metrics.secondary_valid, "gray ramp panel must validate");

    // The color panel is the primary.
    corner_near(metrics.primary_quad[0], 388.0, 242.0);
    corner_near(metrics.secondary_quad[0], 1600.0, 258.0);
}

#[test]
fn test_passport_with_color_second_panel_is_not_valid() {
    // Two color charts: the secondary is not a grayscale ramp.
    let mut canvas = Canvas::filled(2600, 900, [0, 0, 0]);
    canvas.paint_grid(388, 242, 104, 104, &reference_chart_srgb8());
    canvas.paint_grid(1600, 258, 96, 96, &reference_chart_srgb8());

    let output = ChartVerifier::new().detect(&canvas.frame(0));
    let metrics = output.metrics.expect("metrics");
    assert_eq!(metrics.secondary_quad.len(), 4);
    assert!(!metrics.secondary_valid);
}

// ============================================================================
// Output record
// ============================================================================

#[test]
fn test_output_serializes_for_the_wire() {
    let canvas = perfect_chart_canvas();
    let output = verify_frame(&canvas.frame(90));

    let json = serde_json::to_string(&output).expect("serialize");
    assert!(json.contains("\"failure_reason\":\"NONE\""));
    assert!(json.contains("\"rotation_degrees\":90"));

    let back: DetectionOutput = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(output, back);
}
