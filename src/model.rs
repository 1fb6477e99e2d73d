use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::format::{self, Format};

/// Shown when the source has no description for a video.
pub const DESCRIPTION_PLACEHOLDER: &str = "No description available";

/// File name used when a video title sanitizes to nothing.
const FALLBACK_FILE_STEM: &str = "video";

/// Metadata shown before downloading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoPreview {
    pub title: String,
    /// Length in seconds
    pub duration: u64,
    /// Never empty, see [`DESCRIPTION_PLACEHOLDER`]
    pub description: String,
    /// Raw thumbnail image bytes, decoded by the consumer
    pub thumbnail: Vec<u8>,
}

/// A validated request for the download orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub dest_dir: PathBuf,
    pub format: &'static Format,
}

impl DownloadRequest {
    /// Validates all three inputs. The destination must be an existing,
    /// writable directory; this is checked by creating and removing a probe file.
    pub fn new(url: &str, dest_dir: impl Into<PathBuf>, format_id: &str) -> CoreResult<Self> {
        let url = url.trim();
        let parsed = url::Url::parse(url)
            .map_err(|e| CoreError::InvalidRequest(format!("'{url}' is not a valid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CoreError::InvalidRequest(format!(
                "unsupported URL scheme '{}'",
                parsed.scheme()
            )));
        }

        let format = format::resolve(format_id)?;
        let dest_dir = dest_dir.into();
        ensure_writable_dir(&dest_dir)?;

        Ok(Self { url: url.to_string(), dest_dir, format })
    }

    /// `<dest_dir>/<title>.<extension>`
    pub fn output_path(&self, title: &str, extension: &str) -> PathBuf {
        self.dest_dir.join(format!("{}.{}", sanitize_file_stem(title), extension))
    }
}

fn ensure_writable_dir(dir: &Path) -> CoreResult<()> {
    let meta = fs_err::metadata(dir).map_err(|e| CoreError::InvalidRequest(e.to_string()))?;
    if !meta.is_dir() {
        return Err(CoreError::InvalidRequest(format!("destination {} is not a directory", dir.display())));
    }

    // unique name, removed on close
    let probe = tempfile::Builder::new().prefix(".tubeconvert-").tempfile_in(dir).map_err(|e| {
        CoreError::InvalidRequest(format!("destination {} is not writable: {e}", dir.display()))
    })?;
    probe.close().map_err(|e| {
        CoreError::InvalidRequest(format!("cannot clean up probe file in {}: {e}", dir.display()))
    })?;
    Ok(())
}

/// Replaces characters that are not allowed in file names.
pub fn sanitize_file_stem(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        FALLBACK_FILE_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Orchestrator state machine: `Idle -> Fetching -> (Converting) -> Done | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Idle,
    Fetching,
    Converting,
    Done,
    Failed,
}

/// Terminal result of one download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The media file was written to `path`
    Success { path: PathBuf },
    Failed(CoreError),
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }

    /// Text for the acknowledgment dialog
    pub fn message(&self) -> String {
        match self {
            DownloadOutcome::Success { .. } => crate::downloader::STATUS_COMPLETE.to_string(),
            DownloadOutcome::Failed(err) => err.to_string(),
        }
    }
}

/// Notifications produced by a running download, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    Phase(DownloadPhase),
    /// Percentage in 0..=100, restarting at 0 for each phase
    Progress(u8),
    Status(String),
    Finished(DownloadOutcome),
}

/// Renders seconds as e.g. "1 day 2 hours 3 minutes 4 seconds", omitting zero units.
pub fn format_duration(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = seconds % 86_400 / 3_600;
    let minutes = seconds % 3_600 / 60;
    let secs = seconds % 60;

    [(days, "day"), (hours, "hour"), (minutes, "minute"), (secs, "second")]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{n} {unit}{}", if n > 1 { "s" } else { "" }))
        .collect::<Vec<_>>()
        .join(" ")
}
