//! Stub collaborators shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use tubeconvert::error::{CoreError, CoreResult, SourceError};
use tubeconvert::http::HttpFetch;
use tubeconvert::model::DownloadEvent;
use tubeconvert::source::{MediaStream, ProgressFn, VideoInfo, VideoSource};
use tubeconvert::transcoder::{PercentFn, Transcoder};

pub const THUMBNAIL_URL: &str = "https://i.ytimg.com/vi/abc/hqdefault.jpg";

pub fn progressive_mp4(size: u64) -> MediaStream {
    MediaStream {
        url: "https://cdn.example/18.mp4".into(),
        extension: "mp4".into(),
        filesize: size,
        progressive: true,
        headers: Vec::new(),
    }
}

pub fn video_info(title: &str, streams: Vec<MediaStream>) -> VideoInfo {
    VideoInfo {
        title: title.into(),
        duration: 212,
        description: Some("A classic".into()),
        thumbnail_url: Some(THUMBNAIL_URL.into()),
        streams,
    }
}

/// Video source returning a fixed `VideoInfo` and streaming `payload` in `chunks` pieces.
pub struct StubSource {
    pub info: Result<VideoInfo, String>,
    pub payload: Vec<u8>,
    pub chunks: usize,
    pub fail_read: Option<String>,
    /// When set, `read_stream` waits for a notification before returning
    pub gate: Option<Arc<Notify>>,
    pub resolve_calls: Mutex<Vec<String>>,
}

impl StubSource {
    pub fn new(info: VideoInfo, payload: Vec<u8>) -> Self {
        Self {
            info: Ok(info),
            payload,
            chunks: 4,
            fail_read: None,
            gate: None,
            resolve_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            info: Err(message.into()),
            payload: Vec::new(),
            chunks: 1,
            fail_read: None,
            gate: None,
            resolve_calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VideoSource for StubSource {
    async fn resolve(&self, url: &str) -> Result<VideoInfo, SourceError> {
        self.resolve_calls.lock().unwrap().push(url.to_string());
        self.info.clone().map_err(SourceError::Resolve)
    }

    async fn read_stream(
        &self,
        stream: &MediaStream,
        on_progress: ProgressFn<'_>,
    ) -> Result<Vec<u8>, SourceError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(message) = &self.fail_read {
            return Err(SourceError::Resolve(message.clone()));
        }
        let total = stream.filesize.max(self.payload.len() as u64);
        let step = self.payload.len().div_ceil(self.chunks.max(1)).max(1);
        let mut sent = 0usize;
        for chunk in self.payload.chunks(step) {
            sent += chunk.len();
            on_progress(sent as u64, total - sent as u64);
        }
        Ok(self.payload.clone())
    }
}

/// Thumbnail fetcher returning fixed bytes or a fixed error.
pub struct StubHttp {
    pub result: Result<Vec<u8>, String>,
    pub calls: Mutex<Vec<String>>,
}

impl StubHttp {
    pub fn ok(bytes: &[u8]) -> Self {
        Self { result: Ok(bytes.to_vec()), calls: Mutex::new(Vec::new()) }
    }

    pub fn failing(message: &str) -> Self {
        Self { result: Err(message.into()), calls: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl HttpFetch for StubHttp {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.result.clone().map_err(SourceError::Resolve)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertCall {
    pub input_len: usize,
    pub args: String,
    pub output: PathBuf,
}

/// Transcoder that records its calls, reports progress in quarters and
/// writes a marker file, or fails with `fail`.
#[derive(Default)]
pub struct RecordingTranscoder {
    pub calls: Mutex<Vec<ConvertCall>>,
    pub fail: Option<String>,
    pub wait_for_cancel: bool,
}

impl RecordingTranscoder {
    pub fn failing(message: &str) -> Self {
        Self { fail: Some(message.into()), ..Self::default() }
    }

    pub fn calls(&self) -> Vec<ConvertCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcoder for RecordingTranscoder {
    async fn convert(
        &self,
        input: Vec<u8>,
        args: &str,
        output: &Path,
        on_progress: PercentFn<'_>,
        cancel: &CancellationToken,
    ) -> CoreResult<()> {
        self.calls.lock().unwrap().push(ConvertCall {
            input_len: input.len(),
            args: args.to_string(),
            output: output.to_path_buf(),
        });
        if self.wait_for_cancel {
            cancel.cancelled().await;
            return Err(CoreError::Cancelled);
        }
        if let Some(message) = &self.fail {
            return Err(CoreError::ConversionFailed(message.clone()));
        }
        for pct in [25, 50, 75, 100] {
            on_progress(pct);
        }
        std::fs::write(output, b"converted").map_err(|e| CoreError::ConversionFailed(e.to_string()))
    }
}

/// Drains everything currently queued on a receiver.
pub fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<DownloadEvent>) -> Vec<DownloadEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Progress values between two phase markers.
pub fn progress_of(events: &[DownloadEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            DownloadEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect()
}
