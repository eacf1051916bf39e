use crate::error::{PipelineError, PipelineResult};
use crate::ffmpeg::MediaTool;
use crate::planner::ClipSequence;
use crate::{logi, logok, logw};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;

pub const OUTPUT_WIDTH: u32 = 1280;
pub const OUTPUT_HEIGHT: u32 = 720;
pub const OUTPUT_FPS: u32 = 30;
/// Background music level relative to the narration.
pub const MUSIC_VOLUME: f64 = 0.2;

pub const CONCAT_FILE: &str = "concat.txt";
pub const OUTPUT_FILE: &str = "final_video.mp4";

fn quote_concat_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', r"'\''"))
}

fn relative_name(path: &Path, run_dir: &Path) -> String {
    path.strip_prefix(run_dir)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Renders the concat demuxer input for `sequence`, naming clips relative to `run_dir`.
pub fn concat_description(sequence: &ClipSequence, run_dir: &Path) -> String {
    let mut out = String::new();
    for entry in &sequence.entries {
        let name = relative_name(&entry.clip.local_path, run_dir);
        let _ = writeln!(out, "file {}", quote_concat_name(&name));
        let _ = writeln!(out, "duration {:.2}", entry.display_duration);
    }
    let hold = relative_name(&sequence.hold.local_path, run_dir);
    let _ = writeln!(out, "file {}", quote_concat_name(&hold));
    out
}

fn video_filter() -> String {
    format!(
        "scale={}:{},setsar=1,fps={}",
        OUTPUT_WIDTH, OUTPUT_HEIGHT, OUTPUT_FPS
    )
}

/// `-t` value in whole milliseconds, rounded down so the output never outlasts the narration.
fn duration_cap(seconds: f64) -> String {
    format!("{:.3}", (seconds * 1000.0).floor() / 1000.0)
}

/// Arguments for the multiplexer (program name excluded). All paths except `music` are
/// relative to the run directory the multiplexer is started in.
pub fn build_invocation(
    concat: &str,
    narration: &str,
    music: Option<&Path>,
    narration_duration: f64,
    output: &str,
) -> Vec<String> {
    let mut args: Vec<String> = ["-y", "-hide_banner", "-f", "concat", "-safe", "0", "-i"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.push(concat.to_string());
    args.push("-i".to_string());
    args.push(narration.to_string());

    match music {
        Some(music) => {
            args.push("-i".to_string());
            args.push(music.display().to_string());
            args.push("-filter_complex".to_string());
            args.push(format!(
                "[0:v]{}[v];[2:a]volume={}[a_music];[1:a][a_music]amix=inputs=2:duration=first[a_out]",
                video_filter(),
                MUSIC_VOLUME
            ));
            args.extend(["-map", "[v]", "-map", "[a_out]"].iter().map(|s| s.to_string()));
        }
        None => {
            args.extend(["-map", "0:v", "-map", "1:a", "-vf"].iter().map(|s| s.to_string()));
            args.push(video_filter());
        }
    }

    args.extend(
        [
            "-c:v", "libx264", "-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p", "-c:a",
            "aac", "-b:a", "128k", "-t",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args.push(duration_cap(narration_duration));
    args.push(output.to_string());
    args
}

pub struct AssemblyRequest<'a> {
    pub sequence: &'a ClipSequence,
    pub narration_path: &'a Path,
    pub narration_duration: f64,
    pub music_path: Option<&'a Path>,
    pub run_dir: &'a Path,
}

/// Turns a planned clip sequence plus narration (and optional music) into the final video.
pub struct AssemblyDriver {
    tool: Arc<dyn MediaTool>,
    timeout: Option<Duration>,
}

impl AssemblyDriver {
    pub fn new(tool: Arc<dyn MediaTool>) -> Self {
        Self {
            tool,
            timeout: None,
        }
    }

    /// Wall-clock cap for the multiplexer. Expiry kills the process.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn assemble(&self, req: AssemblyRequest<'_>) -> PipelineResult<PathBuf> {
        let concat_path = req.run_dir.join(CONCAT_FILE);
        let description = concat_description(req.sequence, req.run_dir);
        fs::write(&concat_path, description.as_bytes())
            .await
            .map_err(|e| PipelineError::io(&concat_path, e))?;
        logi(format!(
            "Concat description: {} entries + hold ({:.2}s of {:.2}s timed)",
            req.sequence.entries.len(),
            req.sequence.total_duration(),
            req.sequence.target_duration
        ));

        let music = match req.music_path {
            Some(path) => Some(
                std::path::absolute(path).map_err(|e| PipelineError::io(path, e))?,
            ),
            None => None,
        };
        match &music {
            Some(path) => logi(format!("Using background music: {}", path.display())),
            None => logw("Music file not found. Creating video without background music."),
        }

        let narration = relative_name(req.narration_path, req.run_dir);
        let args = build_invocation(
            CONCAT_FILE,
            &narration,
            music.as_deref(),
            req.narration_duration,
            OUTPUT_FILE,
        );

        logi("Assembling final video with FFmpeg...");
        let run = self.tool.mux(&args, req.run_dir);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(PipelineError::Assembly {
                        message: format!("ffmpeg did not finish within {}s", limit.as_secs()),
                        diagnostics: String::new(),
                    });
                }
            },
            None => run.await,
        };

        let output = result.map_err(|e| PipelineError::Assembly {
            message: format!("failed to start ffmpeg: {}", e),
            diagnostics: String::new(),
        })?;

        if !output.success {
            let status = output
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(PipelineError::Assembly {
                message: format!("ffmpeg exited with status {}", status),
                diagnostics: output.stderr,
            });
        }

        let final_path = req.run_dir.join(OUTPUT_FILE);
        if fs::metadata(&final_path).await.is_err() {
            return Err(PipelineError::Assembly {
                message: "ffmpeg reported success but wrote no output".to_string(),
                diagnostics: output.stderr,
            });
        }

        logok(format!("Assembled: {}", final_path.display()));
        Ok(final_path)
    }
}
