use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Result of one multiplexer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stderr: String,
}

/// The external media binaries: a duration prober and the multiplexer.
#[async_trait]
pub trait MediaTool: Send + Sync {
    async fn probe_duration(&self, path: &Path) -> Result<f64>;

    /// Runs the multiplexer with `args` (program name excluded) inside `cwd`.
    async fn mux(&self, args: &[String], cwd: &Path) -> std::io::Result<MuxOutput>;
}

#[derive(Debug, Clone)]
pub struct FfmpegTool {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegTool {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }
}

pub async fn ffprobe_duration_seconds(ffprobe: &Path, path: &Path) -> Result<f64> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe duration failed")?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("ffprobe failed"));
    }

    parse_duration(&String::from_utf8_lossy(&output.stdout))
}

fn parse_duration(text: &str) -> Result<f64> {
    let duration = text.trim().parse::<f64>().unwrap_or(-1.0);
    if !duration.is_finite() || duration <= 0.1 {
        return Err(anyhow::anyhow!("Invalid duration"));
    }
    Ok(duration)
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        ffprobe_duration_seconds(&self.ffprobe, path).await
    }

    async fn mux(&self, args: &[String], cwd: &Path) -> std::io::Result<MuxOutput> {
        let output = Command::new(&self.ffmpeg)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(MuxOutput {
            success: output.status.success(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
