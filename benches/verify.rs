use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chartcheck::color::reference_chart_srgb8;
use chartcheck::{ChartVerifier, Frame};

/// 1280×720 frame with the reference chart filling a quarter of the view
fn synthetic_frame_pixels() -> Vec<u8> {
    let (width, height) = (1280i32, 720i32);
    let mut pixels = vec![0u8; (width * height * 4) as usize];
    for px in pixels.chunks_exact_mut(4) {
        px[3] = 255;
    }

    let srgb = reference_chart_srgb8();
    let (ox, oy, cell) = (400, 180, 80);
    for row in 0..4 {
        for col in 0..6 {
            let rgb = srgb[(row * 6 + col) as usize];
            for y in oy + row * cell..oy + (row + 1) * cell {
                for x in ox + col * cell..ox + (col + 1) * cell {
                    let at = ((y * width + x) * 4) as usize;
                    pixels[at] = rgb[0];
                    pixels[at + 1] = rgb[1];
                    pixels[at + 2] = rgb[2];
                }
            }
        }
    }
    pixels
}

fn benchmark_detect(c: &mut Criterion) {
    let pixels = synthetic_frame_pixels();
    let verifier = ChartVerifier::new();

    c.bench_function("detect_720p_chart", |b| {
        b.iter(|| {
            let frame = Frame::new(1280, 720, 0, black_box(&pixels));
            black_box(verifier.detect(&frame))
        })
    });

    let empty = vec![127u8; 1280 * 720 * 4];
    c.bench_function("detect_720p_empty", |b| {
        b.iter(|| {
            let frame = Frame::new(1280, 720, 0, black_box(&empty));
            black_box(verifier.detect(&frame))
        })
    });
}

criterion_group!(benches, benchmark_detect);
criterion_main!(benches);
