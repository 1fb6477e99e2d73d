//! Runtime configuration, read from the environment (and an optional `.env`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::downloader::Timeouts;
use crate::format;

pub const ENV_YTDLP_BIN: &str = "TUBECONVERT_YTDLP_BIN";
pub const ENV_FFMPEG_BIN: &str = "TUBECONVERT_FFMPEG_BIN";
pub const ENV_DOWNLOAD_DIR: &str = "TUBECONVERT_DOWNLOAD_DIR";
pub const ENV_DEFAULT_FORMAT: &str = "TUBECONVERT_DEFAULT_FORMAT";
pub const ENV_RESOLVE_TIMEOUT: &str = "TUBECONVERT_RESOLVE_TIMEOUT_SECS";
pub const ENV_FETCH_TIMEOUT: &str = "TUBECONVERT_FETCH_TIMEOUT_SECS";
pub const ENV_CONVERT_TIMEOUT: &str = "TUBECONVERT_CONVERT_TIMEOUT_SECS";
pub const ENV_LOG_FILE: &str = "TUBECONVERT_LOG_FILE";

/// URL pre-filled in the input field
pub const DEFAULT_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub ytdlp_bin: PathBuf,
    pub ffmpeg_bin: PathBuf,
    pub download_dir: PathBuf,
    pub default_format: String,
    pub timeouts: Timeouts,
    /// Receives ERROR level log events
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ytdlp_bin: PathBuf::from("yt-dlp"),
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            download_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            default_format: "MP4".to_string(),
            timeouts: Timeouts::default(),
            log_file: PathBuf::from("error.log"),
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e).context("failed to load .env");
            }
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(bin) = get(ENV_YTDLP_BIN) {
            config.ytdlp_bin = PathBuf::from(bin);
        }
        if let Some(bin) = get(ENV_FFMPEG_BIN) {
            config.ffmpeg_bin = PathBuf::from(bin);
        }
        if let Some(dir) = get(ENV_DOWNLOAD_DIR) {
            config.download_dir = PathBuf::from(dir);
        }
        if let Some(fmt) = get(ENV_DEFAULT_FORMAT) {
            if format::resolve(&fmt).is_err() {
                bail!("{ENV_DEFAULT_FORMAT}={fmt} is not one of {:?}", format::identifiers().collect::<Vec<_>>());
            }
            config.default_format = fmt;
        }
        if let Some(path) = get(ENV_LOG_FILE) {
            config.log_file = PathBuf::from(path);
        }

        config.timeouts = Timeouts {
            resolve: parse_timeout(ENV_RESOLVE_TIMEOUT, get(ENV_RESOLVE_TIMEOUT))?,
            fetch: parse_timeout(ENV_FETCH_TIMEOUT, get(ENV_FETCH_TIMEOUT))?,
            convert: parse_timeout(ENV_CONVERT_TIMEOUT, get(ENV_CONVERT_TIMEOUT))?,
        };
        Ok(config)
    }
}

/// Seconds; `0` disables the limit.
fn parse_timeout(key: &str, value: Option<String>) -> Result<Option<Duration>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let secs: u64 = value
        .parse()
        .with_context(|| format!("{key}={value} is not a whole number of seconds"))?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}
