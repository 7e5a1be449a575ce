//! Color reference data, ΔE2000, and patch analysis
//!
//! This module owns everything photometric: the 24-entry reference table,
//! the CIEDE2000 color-difference metric, and the patch analyzer that
//! rectifies a detected quad and compares its sampled colors against the
//! reference.

pub mod delta_e;
pub mod patches;
pub mod reference;

pub use delta_e::ciede2000;
pub use patches::{AnalyzePatches, PatchAnalyzer};
pub use reference::{reference_chart, reference_chart_srgb8, LabSample};
