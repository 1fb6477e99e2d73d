//! Adapter around the external ffmpeg process.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::error::{CoreError, CoreResult};
use crate::progress::{parse_ffmpeg_progress_line, percent};

/// Receives conversion progress as a percentage.
pub type PercentFn<'a> = &'a (dyn Fn(u8) + Send + Sync);

/// Lines of ffmpeg stderr kept in a failure message.
const STDERR_TAIL_LINES: usize = 5;

#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Converts `input` to `output` using codec arguments such as `-c:a libmp3lame`.
    ///
    /// Progress is `floor(processed_bytes / input.len() * 100)`, a rough proxy
    /// since output and input sizes need not correlate.
    async fn convert(
        &self,
        input: Vec<u8>,
        args: &str,
        output: &Path,
        on_progress: PercentFn<'_>,
        cancel: &CancellationToken,
    ) -> CoreResult<()>;
}

pub struct FfmpegTranscoder {
    bin: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    fn command(&self, args: &str, output: &Path) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.args(["-hide_banner", "-nostats", "-loglevel", "error", "-y", "-i", "pipe:0"])
            .args(args.split_whitespace())
            .args(["-progress", "pipe:1"])
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn convert(
        &self,
        input: Vec<u8>,
        args: &str,
        output: &Path,
        on_progress: PercentFn<'_>,
        cancel: &CancellationToken,
    ) -> CoreResult<()> {
        let total = input.len() as u64;
        tracing::debug!(bin = %self.bin.display(), args, output = %output.display(), total, "starting ffmpeg");

        let mut child = self.command(args, output).spawn().map_err(|e| {
            CoreError::ConversionFailed(format!("failed to start {}: {e}", self.bin.display()))
        })?;

        let (Some(mut stdin), Some(stdout), Some(mut stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(CoreError::ConversionFailed("failed to capture ffmpeg pipes".into()));
        };

        // stdin is closed when the task finishes, which ends ffmpeg's input
        let writer = tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        });
        let stderr_reader = tokio::spawn(async move {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).await.map(|_| buf)
        });

        let mut lines = BufReader::new(stdout).lines();
        let pump_progress = async {
            while let Some(line) = lines.next_line().await? {
                if let Some(size) = parse_ffmpeg_progress_line(&line) {
                    on_progress(percent(size, total));
                }
            }
            Ok::<_, std::io::Error>(())
        };

        tokio::select! {
            res = pump_progress => {
                res.map_err(|e| CoreError::ConversionFailed(format!("reading ffmpeg progress: {e}")))?;
            }
            _ = cancel.cancelled() => {
                let _ = child.kill().await;
                writer.abort();
                stderr_reader.abort();
                return Err(CoreError::Cancelled);
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| CoreError::ConversionFailed(format!("waiting for ffmpeg: {e}")))?;
        let write_result = writer.await;
        let stderr_raw = match stderr_reader.await {
            Ok(Ok(buf)) => buf,
            _ => Vec::new(),
        };

        if !status.success() {
            let detail = summarize_ffmpeg_error(&String::from_utf8_lossy(&stderr_raw));
            tracing::error!(code = ?status.code(), %detail, "ffmpeg failed");
            return Err(CoreError::ConversionFailed(detail));
        }
        match write_result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(CoreError::ConversionFailed(format!("writing ffmpeg input: {e}"))),
            Err(e) => Err(CoreError::ConversionFailed(format!("ffmpeg input task: {e}"))),
        }
    }
}

/// Last few meaningful stderr lines joined into one message.
pub fn summarize_ffmpeg_error(stderr: &str) -> String {
    let lines: Vec<_> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != "Conversion failed!")
        .collect();
    if lines.is_empty() {
        return "unknown ffmpeg error".to_string();
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("; ")
}
