//! Preview an online video and download it in a chosen format.
//!
//! The crate is the orchestration core behind the desktop window: it resolves
//! metadata through yt-dlp, fetches the best progressive stream and, when the
//! requested container differs, hands the bytes to ffmpeg.

pub mod config;
pub mod context;
pub mod downloader;
pub mod error;
pub mod events;
pub mod format;
pub mod http;
pub mod logging;
pub mod model;
pub mod preview;
pub mod progress;
pub mod source;
pub mod state;
pub mod transcoder;
pub mod ytdlp;

pub use context::AppContext;
pub use downloader::Downloader;
pub use error::{CoreError, CoreResult};
pub use preview::PreviewFetcher;
