//! Seam to the video-resolution service.

use async_trait::async_trait;

use crate::error::SourceError;

/// Called on every received chunk with `(bytes_transferred_total, bytes_remaining)`.
pub type ProgressFn<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// One downloadable rendition of a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStream {
    /// Direct media URL
    pub url: String,
    /// Container extension, e.g. "mp4"
    pub extension: String,
    /// Total size in bytes, 0 when the service does not know it
    pub filesize: u64,
    /// Audio and video multiplexed in a single stream
    pub progressive: bool,
    /// Extra request headers the service requires for `url`
    pub headers: Vec<(String, String)>,
}

/// Everything the resolution service reports for a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub title: String,
    pub duration: u64,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Best quality first
    pub streams: Vec<MediaStream>,
}

impl VideoInfo {
    /// First progressive mp4 stream, or the first progressive stream of any container.
    pub fn best_progressive(&self) -> Option<&MediaStream> {
        let mut progressive = self.streams.iter().filter(|s| s.progressive);
        let first = progressive.clone().next();
        progressive.find(|s| s.extension == "mp4").or(first)
    }
}

#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Resolves metadata and the available streams without fetching media.
    async fn resolve(&self, url: &str) -> Result<VideoInfo, SourceError>;

    /// Reads a whole stream into memory, reporting progress per chunk.
    async fn read_stream(
        &self,
        stream: &MediaStream,
        on_progress: ProgressFn<'_>,
    ) -> Result<Vec<u8>, SourceError>;
}
