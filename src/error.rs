use thiserror::Error;

/// Every failure the download/convert core can report.
///
/// The `Display` text of each variant is what the UI shows in its error
/// dialog, so messages carry the underlying diagnostic verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Metadata resolution or thumbnail retrieval failed during preview
    #[error("{0}")]
    Preview(String),

    /// The resolved video has no progressive (audio + video) stream
    #[error("No progressive stream available for this video")]
    NoStreamAvailable,

    /// Network or write failure while fetching the media stream
    #[error("Download failed: {0}")]
    Download(String),

    /// The external transcoder exited with an error
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    /// A download is already running in this application instance
    #[error("A download is already in progress")]
    AlreadyInProgress,

    /// The format identifier is not in the catalog
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// The request did not pass validation and was never started
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The user cancelled the running download
    #[error("Download cancelled")]
    Cancelled,

    /// A phase ran longer than its configured limit
    #[error("{phase} timed out after {secs}s")]
    Timeout { phase: &'static str, secs: u64 },
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by a [`crate::source::VideoSource`] or [`crate::http::HttpFetch`].
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{0}")]
    Resolve(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP request failed with status: {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}
