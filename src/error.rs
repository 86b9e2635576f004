use thiserror::Error;

/// Failure taxonomy for the capture-and-verify cycle.
///
/// Backend and transport failures are converted into the fallback
/// `AnalysisResult` by the analysis client and never reach the UI as errors;
/// capture failures abort the cycle.
#[derive(Debug, Error)]
pub enum SnipError {
    #[error("no screen source available")]
    NoSourceAvailable,

    #[error("screen capture failed: {0}")]
    Capture(String),

    #[error("backend returned status {status}")]
    Backend { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request deadline expired")]
    Timeout,

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid capture payload: {0}")]
    Payload(String),

    #[error("crop region is empty after clamping")]
    EmptyCrop,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SnipError>;
