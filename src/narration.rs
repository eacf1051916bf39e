use crate::error::PipelineResult;
use crate::ffmpeg::MediaTool;
use crate::{logok, logw};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Used when the narration cannot be probed. The result reports `estimated = true`
/// so callers can tell the output length was not measured.
pub const FALLBACK_NARRATION_SECONDS: f64 = 60.0;

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesizes `text` and writes the audio to `out_path`.
    async fn synthesize(&self, text: &str, out_path: &Path) -> PipelineResult<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrationAsset {
    pub local_path: PathBuf,
    pub duration: f64,
    pub estimated: bool,
}

impl NarrationAsset {
    pub async fn probe(tool: &dyn MediaTool, local_path: PathBuf) -> Self {
        match tool.probe_duration(&local_path).await {
            Ok(duration) => {
                logok(format!("Audio duration: {:.2} seconds", duration));
                Self {
                    local_path,
                    duration,
                    estimated: false,
                }
            }
            Err(err) => {
                logw(format!(
                    "Could not probe narration duration ({}); assuming {:.0}s",
                    err, FALLBACK_NARRATION_SECONDS
                ));
                Self {
                    local_path,
                    duration: FALLBACK_NARRATION_SECONDS,
                    estimated: true,
                }
            }
        }
    }
}
