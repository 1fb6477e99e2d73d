use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::http::HttpFetch;
use crate::model::{DESCRIPTION_PLACEHOLDER, VideoPreview};
use crate::source::VideoSource;

/// Resolves the metadata shown before a download, without fetching any media.
#[derive(Clone)]
pub struct PreviewFetcher {
    source: Arc<dyn VideoSource>,
    http: Arc<dyn HttpFetch>,
}

impl PreviewFetcher {
    pub fn new(source: Arc<dyn VideoSource>, http: Arc<dyn HttpFetch>) -> Self {
        Self { source, http }
    }

    /// One metadata resolution plus one thumbnail fetch. Any failure becomes
    /// [`CoreError::Preview`] with the collaborator's message; nothing is retried.
    pub async fn fetch_preview(&self, url: &str) -> CoreResult<VideoPreview> {
        let info = self
            .source
            .resolve(url)
            .await
            .map_err(|e| CoreError::Preview(e.to_string()))?;

        let thumbnail_url = info
            .thumbnail_url
            .as_deref()
            .ok_or_else(|| CoreError::Preview("video has no thumbnail".to_string()))?;
        let thumbnail = self
            .http
            .fetch_bytes(thumbnail_url)
            .await
            .map_err(|e| CoreError::Preview(e.to_string()))?;

        let description = match info.description {
            Some(d) if !d.trim().is_empty() => d,
            _ => DESCRIPTION_PLACEHOLDER.to_string(),
        };

        tracing::info!(title = %info.title, duration = info.duration, "preview resolved");
        Ok(VideoPreview { title: info.title, duration: info.duration, description, thumbnail })
    }
}
