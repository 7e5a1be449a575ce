//! # chartcheck
//!
//! Real-time verification that a Macbeth-style 24-patch color reference
//! chart (optionally a two-panel "passport") is visible, in focus, and
//! photometrically consistent with its published reference values.
//!
//! Given a single decoded RGBA camera frame, the pipeline:
//! - locates candidate chart quadrilaterals with a classical
//!   contour-and-grid detector,
//! - measures focus (variance of Laplacian) and contrast,
//! - rectifies the primary panel, samples its 24 patches in CIE L*a*b*,
//!   and scores them with CIEDE2000 against the reference table,
//! - validates a secondary panel as a grayscale ramp,
//! - blends everything into a confidence in [0,1] with a categorical
//!   failure reason.
//!
//! Each call is stateless: the output is a pure function of the frame and
//! the immutable reference table. Capture, rotation handling, UI, and
//! persistence live outside this crate; logging goes through the [`log`]
//! facade.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chartcheck::{ChartVerifier, Frame};
//!
//! let pixels = vec![0u8; 1280 * 720 * 4];
//! let frame = Frame::new(1280, 720, 0, &pixels);
//!
//! let verifier = ChartVerifier::new();
//! let output = verifier.detect(&frame);
//! println!("confidence {:.2}, passes: {}", output.confidence, output.passes());
//! if let Some(hint) = output.failure_reason.user_hint() {
//!     println!("hint: {hint}");
//! }
//! ```

pub mod color;
pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod output;
pub mod pipeline;
pub mod quality;
mod runtime;
pub mod scoring;

pub use config::VerifierConfig;
pub use error::{Result, VerifyError};
pub use frame::Frame;
pub use geometry::{bounding_box, order_corners, BoundingBox, PointF, Quad};
pub use output::{DetectionOutput, FailureReason, Metrics, PatchScores};
pub use pipeline::ChartVerifier;

/// Analyze a single frame with the default configuration.
///
/// Convenience wrapper building a fresh [`ChartVerifier`]; hold on to a
/// verifier instance instead when analyzing a stream of frames.
pub fn verify_frame(frame: &Frame<'_>) -> DetectionOutput {
    ChartVerifier::new().detect(frame)
}
