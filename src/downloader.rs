//! The download/convert orchestrator.
//!
//! One run goes `Idle -> Fetching -> (Converting) -> Done | Failed`. Every run
//! that starts ends with `Progress(0)`, a terminal status and `Finished`,
//! whichever way it exits.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::error::{CoreError, CoreResult};
use crate::model::{DownloadEvent, DownloadOutcome, DownloadPhase, DownloadRequest};
use crate::progress::{PhaseProgress, percent};
use crate::source::VideoSource;
use crate::transcoder::Transcoder;

pub const STATUS_DOWNLOADING: &str = "Downloading video...";
pub const STATUS_COMPLETE: &str = "Download complete!";
pub const STATUS_FAILED: &str = "Download failed";

/// Per-phase limits; `None` waits indefinitely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub resolve: Option<Duration>,
    pub fetch: Option<Duration>,
    pub convert: Option<Duration>,
}

pub struct Downloader {
    source: Arc<dyn VideoSource>,
    transcoder: Arc<dyn Transcoder>,
    timeouts: Timeouts,
    active: AtomicBool,
}

/// Clears the in-flight flag however the run ends.
struct ActiveGuard<'a>(&'a AtomicBool);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Downloader {
    pub fn new(source: Arc<dyn VideoSource>, transcoder: Arc<dyn Transcoder>, timeouts: Timeouts) -> Self {
        Self { source, transcoder, timeouts, active: AtomicBool::new(false) }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Runs one download, streaming [`DownloadEvent`]s to `events`.
    ///
    /// Returns `Err(AlreadyInProgress)` without emitting anything when another
    /// run is active. Otherwise every failure is folded into the returned
    /// [`DownloadOutcome`], which is also sent as the last event.
    pub async fn download(
        &self,
        request: DownloadRequest,
        events: UnboundedSender<DownloadEvent>,
        cancel: CancellationToken,
    ) -> CoreResult<DownloadOutcome> {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(url = %request.url, "rejecting overlapping download");
            return Err(CoreError::AlreadyInProgress);
        }
        let guard = ActiveGuard(&self.active);

        let emit = |event: DownloadEvent| {
            // the receiver going away only means nobody is watching
            let _ = events.send(event);
        };

        tracing::info!(url = %request.url, format = request.format.name, "download started");
        emit(DownloadEvent::Phase(DownloadPhase::Fetching));
        emit(DownloadEvent::Progress(0));
        emit(DownloadEvent::Status(STATUS_DOWNLOADING.to_string()));

        let (outcome, status) = match self.run(&request, &events, &cancel).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "download complete");
                emit(DownloadEvent::Phase(DownloadPhase::Done));
                (DownloadOutcome::Success { path }, STATUS_COMPLETE)
            }
            Err(err) => {
                tracing::error!(url = %request.url, error = %err, "download failed");
                emit(DownloadEvent::Phase(DownloadPhase::Failed));
                (DownloadOutcome::Failed(err), STATUS_FAILED)
            }
        };

        emit(DownloadEvent::Progress(0));
        emit(DownloadEvent::Status(status.to_string()));
        // whoever reacts to Finished may start the next run right away
        drop(guard);
        emit(DownloadEvent::Finished(outcome.clone()));
        Ok(outcome)
    }

    async fn run(
        &self,
        request: &DownloadRequest,
        events: &UnboundedSender<DownloadEvent>,
        cancel: &CancellationToken,
    ) -> CoreResult<PathBuf> {
        let info = bounded("resolve", self.timeouts.resolve, cancel, self.source.resolve(&request.url))
            .await?
            .map_err(|e| CoreError::Download(e.to_string()))?;
        let stream = info.best_progressive().ok_or(CoreError::NoStreamAvailable)?.clone();
        tracing::debug!(title = %info.title, ext = %stream.extension, size = stream.filesize, "selected stream");

        let fetch_progress = PhaseProgress::new();
        let on_fetch = |transferred: u64, remaining: u64| {
            let total = match stream.filesize {
                0 => transferred.saturating_add(remaining),
                n => n,
            };
            if let Some(pct) = fetch_progress.advance(percent(transferred, total)) {
                let _ = events.send(DownloadEvent::Progress(pct));
            }
        };
        let data = bounded("fetch", self.timeouts.fetch, cancel, self.source.read_stream(&stream, &on_fetch))
            .await?
            .map_err(|e| CoreError::Download(e.to_string()))?;

        let format = request.format;
        if format.extension == stream.extension {
            let path = request.output_path(&info.title, &stream.extension);
            fs_err::tokio::write(&path, &data)
                .await
                .map_err(|e| CoreError::Download(e.to_string()))?;
            return Ok(path);
        }

        let path = request.output_path(&info.title, format.extension);
        tracing::info!(from = %stream.extension, to = format.extension, "converting");
        let _ = events.send(DownloadEvent::Phase(DownloadPhase::Converting));
        let _ = events.send(DownloadEvent::Progress(0));
        let _ = events.send(DownloadEvent::Status(format!("Converting to {format}...")));

        let convert_progress = PhaseProgress::new();
        let on_convert = |pct: u8| {
            if let Some(pct) = convert_progress.advance(pct) {
                let _ = events.send(DownloadEvent::Progress(pct));
            }
        };
        bounded(
            "convert",
            self.timeouts.convert,
            cancel,
            self.transcoder.convert(data, format.ffmpeg_args, &path, &on_convert, cancel),
        )
        .await??;
        Ok(path)
    }
}

/// Races `fut` against the phase limit and the cancel token.
async fn bounded<F: Future>(
    phase: &'static str,
    limit: Option<Duration>,
    cancel: &CancellationToken,
    fut: F,
) -> CoreResult<F::Output> {
    let timed = async {
        match limit {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| CoreError::Timeout { phase, secs: limit.as_secs() }),
            None => Ok(fut.await),
        }
    };
    tokio::select! {
        res = timed => res,
        _ = cancel.cancelled() => Err(CoreError::Cancelled),
    }
}
