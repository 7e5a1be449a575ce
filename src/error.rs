//! Error types for the chartcheck library

use thiserror::Error;

/// Result type alias for chartcheck operations
pub type Result<T> = std::result::Result<T, VerifyError>;

/// Faults raised while analyzing a frame.
///
/// Observable detection failures (chart missing, blur, lighting, partial
/// view) are *data* on [`crate::DetectionOutput`], never errors. This enum
/// covers only faults: invalid input, native-runtime problems, and geometry
/// that cannot be processed.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// Input frame failed validation
    #[error("Invalid frame: {reason}")]
    InvalidFrame { reason: String },

    /// OpenCV operation failed
    #[error("OpenCV error: {operation}")]
    OpenCv {
        operation: String,
        #[source]
        source: opencv::Error,
    },

    /// Quad or grid geometry could not be processed
    #[error("Geometry error: {message}")]
    Geometry { message: String },

    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl VerifyError {
    /// Create an OpenCV error with the failing operation attached
    pub fn opencv(operation: impl Into<String>, source: opencv::Error) -> Self {
        Self::OpenCv {
            operation: operation.into(),
            source,
        }
    }

    /// Create an invalid-frame error
    pub fn invalid_frame(reason: impl Into<String>) -> Self {
        Self::InvalidFrame {
            reason: reason.into(),
        }
    }

    /// Create a geometry error
    pub fn geometry(message: impl Into<String>) -> Self {
        Self::Geometry {
            message: message.into(),
        }
    }

    /// Create a configuration error with context
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
