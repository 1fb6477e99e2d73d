//! `VideoSource` backed by the yt-dlp executable.
//!
//! Metadata comes from `yt-dlp -J`; media bytes are then fetched straight from
//! the format's direct URL so progress can be reported per chunk.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::SourceError;
use crate::http::ReqwestFetcher;
use crate::source::{MediaStream, ProgressFn, VideoInfo, VideoSource};

pub struct YtDlpSource {
    bin: PathBuf,
    http: ReqwestFetcher,
}

impl YtDlpSource {
    pub fn new(bin: impl Into<PathBuf>, http: ReqwestFetcher) -> Self {
        Self { bin: bin.into(), http }
    }
}

#[async_trait]
impl VideoSource for YtDlpSource {
    async fn resolve(&self, url: &str) -> Result<VideoInfo, SourceError> {
        tracing::debug!(bin = %self.bin.display(), url, "resolving metadata");
        let output = Command::new(&self.bin)
            .args(["-J", "--no-playlist", "--no-warnings", url])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                SourceError::Resolve(format!("failed to run {}: {e}", self.bin.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::Resolve(summarize_stderr(&stderr, output.status.code())));
        }

        parse_info(&output.stdout)
    }

    async fn read_stream(
        &self,
        stream: &MediaStream,
        on_progress: ProgressFn<'_>,
    ) -> Result<Vec<u8>, SourceError> {
        self.http
            .download(&stream.url, &stream.headers, stream.filesize, on_progress)
            .await
    }
}

#[derive(Deserialize)]
struct RawInfo {
    title: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Deserialize)]
struct RawFormat {
    #[serde(default)]
    url: Option<String>,
    ext: String,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    filesize: Option<u64>,
    #[serde(default)]
    filesize_approx: Option<u64>,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
}

impl RawFormat {
    fn has_codec(codec: &Option<String>) -> bool {
        codec.as_deref().is_some_and(|c| c != "none")
    }

    /// Both tracks in one file, reachable with a plain GET.
    fn is_progressive(&self) -> bool {
        let plain_http = matches!(self.protocol.as_deref(), None | Some("http") | Some("https"));
        plain_http && Self::has_codec(&self.vcodec) && Self::has_codec(&self.acodec)
    }
}

/// Parses `yt-dlp -J` output. yt-dlp lists formats worst first; the result is best first.
pub fn parse_info(json: &[u8]) -> Result<VideoInfo, SourceError> {
    let raw: RawInfo = serde_json::from_slice(json)?;

    let streams = raw
        .formats
        .into_iter()
        .rev()
        .filter_map(|f| {
            let progressive = f.is_progressive();
            let mut headers: Vec<_> = f.http_headers.into_iter().collect();
            headers.sort();
            Some(MediaStream {
                url: f.url?,
                extension: f.ext,
                filesize: f.filesize.or(f.filesize_approx).unwrap_or(0),
                progressive,
                headers,
            })
        })
        .collect();

    Ok(VideoInfo {
        title: raw.title,
        duration: raw.duration.map(|d| d.max(0.0) as u64).unwrap_or(0),
        description: raw.description.filter(|d| !d.trim().is_empty()),
        thumbnail_url: raw.thumbnail,
        streams,
    })
}

/// The last `ERROR:` line yt-dlp printed, else its last non-empty line.
fn summarize_stderr(stderr: &str, code: Option<i32>) -> String {
    let lines: Vec<_> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if let Some(line) = lines.iter().rev().find(|l| l.starts_with("ERROR:")) {
        return line.trim_start_matches("ERROR:").trim().to_string();
    }
    match (lines.last(), code) {
        (Some(line), _) => (*line).to_string(),
        (None, Some(code)) => format!("yt-dlp exited with status {code}"),
        (None, None) => "yt-dlp was terminated".to_string(),
    }
}
