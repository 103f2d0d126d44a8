//! Screen capture domain: public API.
//!
//! This module owns "grab one screen" and nothing else. It returns PNG
//! bytes; persisting them and deciding which queue they land in is the
//! queue manager's job.

mod platform;

pub use platform::{capture_tool, CaptureTool, SystemCapture};

use async_trait::async_trait;

/// Produces the PNG bytes of one full-screen grab.
///
/// Implemented per platform by [`SystemCapture`]; tests substitute their own.
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    async fn capture(&self) -> Result<Vec<u8>, CaptureError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Screen capture is not supported on {0}")]
    UnsupportedPlatform(String),

    #[error("No screen capture tool found (tried: {0})")]
    ToolMissing(String),

    #[error("{tool} exited with {status}: {stderr}")]
    CommandFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Capture did not produce a PNG image: {0}")]
    InvalidImage(String),

    #[error("Capture I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Reject anything that is not a PNG; capture tools leave empty files
/// behind when the user denies screen-recording permission.
pub fn ensure_png(bytes: &[u8]) -> Result<(), CaptureError> {
    if bytes.is_empty() {
        return Err(CaptureError::InvalidImage("empty file".to_string()));
    }
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => Ok(()),
        Ok(other) => Err(CaptureError::InvalidImage(format!("{:?}", other))),
        Err(e) => Err(CaptureError::InvalidImage(e.to_string())),
    }
}
