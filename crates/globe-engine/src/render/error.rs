use thiserror::Error;

/// Reasons a surface cannot back a set of render targets.
///
/// A failed resize leaves the previously allocated targets in place.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResizeError {
    #[error("surface has zero area ({width}x{height})")]
    ZeroArea { width: u32, height: u32 },

    #[error("invalid surface scale factor {0}")]
    InvalidScaleFactor(f64),

    #[error("unsupported surface format {0:?}")]
    UnsupportedFormat(wgpu::TextureFormat),

    #[error("surface {width}x{height} exceeds the maximum target dimension {max}")]
    TooLarge { width: u32, height: u32, max: u32 },
}

/// Failure while producing a frame.
///
/// Never crosses the `Renderer::render` boundary; the scheduler consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The frame was dropped before submission; the next one may succeed.
    #[error("frame skipped: {0}")]
    Skipped(String),

    /// The context cannot produce further frames.
    #[error("fatal frame error: {0}")]
    Fatal(String),
}
