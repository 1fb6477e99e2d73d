use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::error::SourceError;
use crate::source::ProgressFn;

/// Plain byte fetch, used for thumbnails.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

/// reqwest-backed fetcher shared by the preview and the stream download.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    request_timeout: Option<Duration>,
}

impl ReqwestFetcher {
    /// `request_timeout` bounds single-shot requests such as thumbnails;
    /// streamed downloads are bounded by the orchestrator instead.
    pub fn new(request_timeout: Option<Duration>) -> Result<Self, SourceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.connect_timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, request_timeout))
    }

    pub fn with_client(client: reqwest::Client, request_timeout: Option<Duration>) -> Self {
        Self { client, request_timeout }
    }

    /// Streams `url` into memory. `expected_total` of 0 falls back to the
    /// response's Content-Length; with no known total no progress is reported.
    pub async fn download(
        &self,
        url: &str,
        headers: &[(String, String)],
        expected_total: u64,
        on_progress: ProgressFn<'_>,
    ) -> Result<Vec<u8>, SourceError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SourceError::HttpStatus(response.status()));
        }

        let total = match expected_total {
            0 => response.content_length().unwrap_or(0),
            n => n,
        };
        let mut buffer = Vec::with_capacity(usize::try_from(total).unwrap_or(0));
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            buffer.extend_from_slice(&chunk?);
            let received = buffer.len() as u64;
            if total > 0 {
                on_progress(received, total.saturating_sub(received));
            }
        }

        tracing::debug!(url, bytes = buffer.len(), "stream download finished");
        Ok(buffer)
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let mut request = self.client.get(url);
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SourceError::HttpStatus(response.status()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
