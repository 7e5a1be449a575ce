//! Synthetic passport demo
//!
//! Builds an in-memory frame containing a reference chart next to a
//! neutral-gray ramp panel, runs the verifier, and prints the structured
//! output record as JSON.

use chartcheck::color::reference_chart_srgb8;
use chartcheck::{ChartVerifier, Frame};

fn paint_grid(
    pixels: &mut [u8],
    width: i32,
    ox: i32,
    oy: i32,
    cell: i32,
    colors: &[[u8; 3]; 24],
) {
    for row in 0..4 {
        for col in 0..6 {
            let rgb = colors[(row * 6 + col) as usize];
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
}

fn main() {
    let (width, height) = (2200i32, 700i32);
    let mut pixels = vec![0u8; (width * height * 4) as usize];
    for px in pixels.chunks_exact_mut(4) {
        px[3] = 255;
    }

    // Color panel on the left, gray ramp panel on the right.
    paint_grid(&mut pixels, width, 200, 150, 96, &reference_chart_srgb8());
    let mut ramp = [[0u8; 3]; 24];
    for (i, rgb) in ramp.iter_mut().enumerate() {
        let level = (240 - i as i32 * 9) as u8;
        *rgb = [level, level, level];
    }
    paint_grid(&mut pixels, width, 1300, 170, 88, &ramp);

    let frame = Frame::new(width, height, 0, &pixels);
    let output = ChartVerifier::new().detect(&frame);

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("could not serialize output: {err}"),
    }

    println!();
    println!("passes: {}", output.passes());
    if let Some(hint) = output.failure_reason.user_hint() {
        println!("hint:   {hint}");
    }
}
