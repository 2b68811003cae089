use thiserror::Error;

/// Failures of the PDF/Word export pipeline.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The rendered view has no `.print` node to capture.
    #[error("printable resume content not found")]
    MarkerMissing,

    /// Another export of the same resume is still running.
    #[error("an export of this resume is already in progress")]
    Busy,

    #[error("printable content rendered to an empty {width}x{height} area")]
    EmptyNode { width: u32, height: u32 },

    #[error("no export font is loaded")]
    FontUnavailable,

    #[error("rasterization failed: {0}")]
    Rasterize(String),

    #[error("encoding failed: {0}")]
    Encode(String),

    #[error("export task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
