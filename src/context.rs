//! Owning application context: runtime, collaborators, state and the
//! channels that carry background results back to the UI thread.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, DEFAULT_URL};
use crate::downloader::Downloader;
use crate::error::{CoreError, CoreResult};
use crate::events::{AppEvent, EventBus, EventKind};
use crate::http::{HttpFetch, ReqwestFetcher};
use crate::model::{DownloadEvent, DownloadRequest, VideoPreview};
use crate::preview::PreviewFetcher;
use crate::source::VideoSource;
use crate::state::{AppState, StateSnapshot, StateUpdate};
use crate::transcoder::{FfmpegTranscoder, Transcoder};
use crate::ytdlp::YtDlpSource;

/// How long shutdown waits for background tasks.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Asks the UI toolkit to redraw; called from worker threads.
pub type RepaintFn = Arc<dyn Fn() + Send + Sync>;

/// The three external collaborators.
pub struct Collaborators {
    pub source: Arc<dyn VideoSource>,
    pub http: Arc<dyn HttpFetch>,
    pub transcoder: Arc<dyn Transcoder>,
}

impl Collaborators {
    /// yt-dlp for metadata, reqwest for bytes, ffmpeg for conversion.
    pub fn production(config: &Config) -> Result<Self> {
        let http = ReqwestFetcher::new(config.timeouts.fetch).context("failed to build HTTP client")?;
        Ok(Self {
            source: Arc::new(YtDlpSource::new(&config.ytdlp_bin, http.clone())),
            http: Arc::new(http),
            transcoder: Arc::new(FfmpegTranscoder::new(&config.ffmpeg_bin)),
        })
    }
}

enum DownloadMessage {
    Event(DownloadEvent),
    Rejected(CoreError),
}

pub struct AppContext {
    runtime: Option<Runtime>,
    preview: PreviewFetcher,
    downloader: Arc<Downloader>,
    state: AppState,
    bus: EventBus,
    preview_tx: UnboundedSender<CoreResult<VideoPreview>>,
    preview_rx: UnboundedReceiver<CoreResult<VideoPreview>>,
    download_tx: UnboundedSender<DownloadMessage>,
    download_rx: UnboundedReceiver<DownloadMessage>,
    preview_in_flight: bool,
    cancel: Option<CancellationToken>,
    repaint: RepaintFn,
}

impl AppContext {
    pub fn start(config: &Config) -> Result<Self> {
        let collaborators = Collaborators::production(config)?;
        Self::with_collaborators(config, collaborators)
    }

    pub fn with_collaborators(config: &Config, collaborators: Collaborators) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tubeconvert-worker")
            .enable_all()
            .build()
            .context("failed to start async runtime")?;

        let (preview_tx, preview_rx) = unbounded_channel();
        let (download_tx, download_rx) = unbounded_channel();

        tracing::info!(
            dir = %config.download_dir.display(),
            format = %config.default_format,
            "application context started"
        );
        Ok(Self {
            runtime: Some(runtime),
            preview: PreviewFetcher::new(collaborators.source.clone(), collaborators.http),
            downloader: Arc::new(Downloader::new(
                collaborators.source,
                collaborators.transcoder,
                config.timeouts,
            )),
            state: AppState::new(&config.download_dir, DEFAULT_URL, &config.default_format),
            bus: EventBus::new(),
            preview_tx,
            preview_rx,
            download_tx,
            download_rx,
            preview_in_flight: false,
            cancel: None,
            repaint: Arc::new(|| {}),
        })
    }

    pub fn set_repaint(&mut self, repaint: RepaintFn) {
        self.repaint = repaint;
    }

    pub fn state(&self) -> &StateSnapshot {
        self.state.snapshot()
    }

    pub fn update_state(&mut self, update: StateUpdate) -> bool {
        self.state.update(update)
    }

    pub fn on_state_change(&mut self, listener: impl FnMut(&StateSnapshot) + 'static) {
        self.state.on_change(listener);
    }

    pub fn subscribe(&mut self, kind: EventKind, callback: impl FnMut(&AppEvent) + 'static) {
        self.bus.subscribe(kind, callback);
    }

    pub fn is_preview_in_flight(&self) -> bool {
        self.preview_in_flight
    }

    /// Submission controls are enabled only while nothing is downloading.
    pub fn can_submit(&self) -> bool {
        !self.state.is_downloading()
    }

    fn runtime(&self) -> CoreResult<&Runtime> {
        self.runtime
            .as_ref()
            .ok_or_else(|| CoreError::InvalidRequest("application is shutting down".into()))
    }

    /// Starts a preview of the current URL in the background.
    pub fn submit_preview(&mut self) -> CoreResult<()> {
        if self.preview_in_flight {
            return Err(CoreError::AlreadyInProgress);
        }
        let url = self.state.snapshot().url.trim().to_string();
        let fetcher = self.preview.clone();
        let tx = self.preview_tx.clone();
        let repaint = Arc::clone(&self.repaint);

        self.runtime()?.spawn(async move {
            let result = fetcher.fetch_preview(&url).await;
            if let Err(e) = &result {
                tracing::warn!(url, error = %e, "preview failed");
            }
            let _ = tx.send(result);
            repaint();
        });
        self.preview_in_flight = true;
        Ok(())
    }

    /// Validates the current state into a request and starts it in the background.
    pub fn submit_download(&mut self) -> CoreResult<()> {
        if self.state.is_downloading() {
            return Err(CoreError::AlreadyInProgress);
        }
        let snap = self.state.snapshot();
        let request = DownloadRequest::new(&snap.url, snap.path.clone(), &snap.format)?;

        let downloader = Arc::clone(&self.downloader);
        let ui_tx = self.download_tx.clone();
        let repaint = Arc::clone(&self.repaint);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let runtime = self.runtime()?;

        let (tx, mut rx) = unbounded_channel();
        let forward_tx = ui_tx.clone();
        let forward_repaint = Arc::clone(&repaint);
        runtime.spawn(async move {
            while let Some(event) = rx.recv().await {
                let _ = forward_tx.send(DownloadMessage::Event(event));
                forward_repaint();
            }
        });
        runtime.spawn(async move {
            if let Err(err) = downloader.download(request, tx, token).await {
                let _ = ui_tx.send(DownloadMessage::Rejected(err));
                repaint();
            }
        });

        self.cancel = Some(cancel);
        self.state.update(StateUpdate::default().is_downloading(true));
        Ok(())
    }

    /// Requests cooperative cancellation of the running download.
    pub fn cancel_download(&mut self) -> bool {
        match &self.cancel {
            Some(token) => {
                tracing::info!("download cancellation requested");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Drains background results in arrival order and applies them on the
    /// calling (UI) thread. Returns the number of messages handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;

        while let Ok(result) = self.preview_rx.try_recv() {
            handled += 1;
            self.preview_in_flight = false;
            let event = match result {
                Ok(preview) => AppEvent::PreviewReady(preview),
                Err(err) => AppEvent::PreviewFailed(err.to_string()),
            };
            self.bus.publish(&event);
        }

        while let Ok(message) = self.download_rx.try_recv() {
            handled += 1;
            let event = match message {
                DownloadMessage::Event(DownloadEvent::Phase(phase)) => AppEvent::DownloadPhase(phase),
                DownloadMessage::Event(DownloadEvent::Progress(pct)) => AppEvent::DownloadProgress(pct),
                DownloadMessage::Event(DownloadEvent::Status(text)) => AppEvent::DownloadStatus(text),
                DownloadMessage::Event(DownloadEvent::Finished(outcome)) => {
                    self.cancel = None;
                    self.state.update(StateUpdate::default().is_downloading(false));
                    AppEvent::DownloadFinished(outcome)
                }
                DownloadMessage::Rejected(err) => {
                    let active = self.downloader.is_active();
                    if !active {
                        self.cancel = None;
                    }
                    self.state.update(StateUpdate::default().is_downloading(active));
                    AppEvent::DownloadRejected(err.to_string())
                }
            };
            self.bus.publish(&event);
        }

        handled
    }

    /// Cancels outstanding work and stops the runtime.
    pub fn shutdown(mut self) {
        self.cancel_download();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(SHUTDOWN_GRACE);
        }
        tracing::info!("application context stopped");
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
