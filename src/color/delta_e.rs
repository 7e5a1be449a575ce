//! CIEDE2000 color difference
//!
//! Full CIEDE2000 with parametric weights k_L = k_C = k_H = 1, computed in
//! double precision throughout. The hue terms collapse as required when
//! either adjusted chroma is zero.

use std::f64::consts::{PI, TAU};

use super::reference::LabSample;

/// 25⁷, shared by the G and R_C chroma-compression terms
const POW7_25: f64 = 6_103_515_625.0;

/// CIEDE2000 difference between a measured and a reference color.
///
/// Symmetric in its arguments and zero for identical inputs.
pub fn ciede2000(measured: LabSample, reference: LabSample) -> f64 {
    let (l1, a1, b1) = (measured.l, measured.a, measured.b);
    let (l2, a2, b2) = (reference.l, reference.a, reference.b);

    let c1 = (a1 * a1 + b1 * b1).sqrt();
    let c2 = (a2 * a2 + b2 * b2).sqrt();
    let c_mean = 0.5 * (c1 + c2);
    let c_mean7 = c_mean.powi(7);
    let g = 0.5 * (1.0 - (c_mean7 / (c_mean7 + POW7_25)).sqrt());

    let ap1 = (1.0 + g) * a1;
    let ap2 = (1.0 + g) * a2;
    let cp1 = (ap1 * ap1 + b1 * b1).sqrt();
    let cp2 = (ap2 * ap2 + b2 * b2).sqrt();
    let hp1 = hue_angle(b1, ap1);
    let hp2 = hue_angle(b2, ap2);

    let delta_l = l2 - l1;
    let delta_c = cp2 - cp1;
    let delta_h_angle = if cp1 * cp2 == 0.0 {
        0.0
    } else {
        let d = hp2 - hp1;
        if d.abs() <= PI {
            d
        } else if d > PI {
            d - TAU
        } else {
            d + TAU
        }
    };
    let delta_h = 2.0 * (cp1 * cp2).sqrt() * (delta_h_angle / 2.0).sin();

    let l_mean = 0.5 * (l1 + l2);
    let l_shift = (l_mean - 50.0) * (l_mean - 50.0);
    let s_l = 1.0 + 0.015 * l_shift / (20.0 + l_shift).sqrt();

    let cp_mean = 0.5 * (cp1 + cp2);
    let s_c = 1.0 + 0.045 * cp_mean;

    let hp_mean = if cp1 * cp2 == 0.0 {
        hp1 + hp2
    } else if (hp1 - hp2).abs() <= PI {
        0.5 * (hp1 + hp2)
    } else if hp1 + hp2 < TAU {
        0.5 * (hp1 + hp2 + TAU)
    } else {
        0.5 * (hp1 + hp2 - TAU)
    };

    let t = 1.0 - 0.17 * (hp_mean - 30.0_f64.to_radians()).cos()
        + 0.24 * (2.0 * hp_mean).cos()
        + 0.32 * (3.0 * hp_mean + 6.0_f64.to_radians()).cos()
        - 0.20 * (4.0 * hp_mean - 63.0_f64.to_radians()).cos();
    let s_h = 1.0 + 0.015 * cp_mean * t;

    let delta_theta =
        30.0_f64.to_radians() * (-((hp_mean.to_degrees() - 275.0) / 25.0).powi(2)).exp();
    let cp_mean7 = cp_mean.powi(7);
    let r_c = 2.0 * (cp_mean7 / (cp_mean7 + POW7_25)).sqrt();
    let r_t = -r_c * (2.0 * delta_theta).sin();

    let term_l = delta_l / s_l;
    let term_c = delta_c / s_c;
    let term_h = delta_h / s_h;
    (term_l * term_l + term_c * term_c + term_h * term_h + r_t * term_c * term_h).sqrt()
}

/// Hue angle in [0, 2π), zero when both components vanish
fn hue_angle(b: f64, ap: f64) -> f64 {
    if b == 0.0 && ap == 0.0 {
        return 0.0;
    }
    let h = b.atan2(ap);
    if h < 0.0 {
        h + TAU
    } else {
        h
    }
}
