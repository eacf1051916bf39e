use crate::api::{ElevenLabsSynthesizer, GeminiScriptGenerator, PexelsFootageSource};
use crate::assembly::{AssemblyDriver, AssemblyRequest};
use crate::config::Config;
use crate::content::{ContentPackage, ScriptGenerator};
use crate::error::{PipelineError, PipelineResult};
use crate::ffmpeg::{FfmpegTool, MediaTool};
use crate::footage::{DownloadedClip, FootageSource};
use crate::narration::{NarrationAsset, SpeechSynthesizer};
use crate::planner;
use crate::selector;
use crate::topic::{MusicMood, Topic};
use crate::transport::Transport;
use crate::workspace::RunWorkspace;
use crate::{init, loge, logi, logok, logw};
use anyhow::Result;
use futures_util::future::join_all;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;

pub const CLIPS_PER_KEYWORD: usize = 2;
pub const VIDEOS_PER_KEYWORD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    GeneratingContent,
    SynthesizingAudio,
    FetchingClips,
    Planning,
    Assembling,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::GeneratingContent => "generating_content",
            PipelineState::SynthesizingAudio => "synthesizing_audio",
            PipelineState::FetchingClips => "fetching_clips",
            PipelineState::Planning => "planning",
            PipelineState::Assembling => "assembling",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed run and the step it failed in.
#[derive(Debug)]
pub struct RunFailure {
    pub state: PipelineState,
    pub error: PipelineError,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed while {}: {}", self.state, self.error)
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// The finished video as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoDescriptor {
    pub title: String,
    pub url: String,
    pub duration: String,
    pub duration_seconds: f64,
    pub duration_estimated: bool,
    pub run_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GenerateResponse {
    Videos {
        videos: Vec<VideoDescriptor>,
    },
    Error {
        error: String,
        kind: &'static str,
        stage: String,
    },
}

impl GenerateResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerateResponse::Videos { .. })
    }

    fn failure(state: PipelineState, error: &PipelineError) -> Self {
        GenerateResponse::Error {
            error: error.user_message(),
            kind: error.kind(),
            stage: state.to_string(),
        }
    }
}

impl From<Result<VideoDescriptor, RunFailure>> for GenerateResponse {
    fn from(result: Result<VideoDescriptor, RunFailure>) -> Self {
        match result {
            Ok(video) => GenerateResponse::Videos {
                videos: vec![video],
            },
            Err(failure) => GenerateResponse::failure(failure.state, &failure.error),
        }
    }
}

pub struct Collaborators {
    pub script: Arc<dyn ScriptGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub footage: Arc<dyn FootageSource>,
    pub media: Arc<dyn MediaTool>,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Parent of the per-run directories.
    pub output_root: PathBuf,
    /// Holds `<mood>.mp3` background tracks.
    pub music_dir: PathBuf,
    /// Directory the returned video URL is made relative to.
    pub public_root: PathBuf,
    pub clips_per_keyword: usize,
    pub videos_per_keyword: usize,
    pub assembly_timeout: Option<Duration>,
}

impl PipelineSettings {
    pub fn new(output_root: impl Into<PathBuf>, music_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            music_dir: music_dir.into(),
            public_root: PathBuf::from("."),
            clips_per_keyword: CLIPS_PER_KEYWORD,
            videos_per_keyword: VIDEOS_PER_KEYWORD,
            assembly_timeout: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            public_root: config.public_root.clone(),
            assembly_timeout: config.assembly_timeout_secs.map(Duration::from_secs),
            ..Self::new(&config.output_dir, &config.music_dir)
        }
    }
}

/// Drives one topic through content generation, narration, footage, planning and assembly.
pub struct Pipeline {
    collaborators: Collaborators,
    settings: PipelineSettings,
    assembly: AssemblyDriver,
}

/// What a run has produced so far; read by the failure path and by cleanup.
struct RunProgress {
    state: PipelineState,
    clips: Vec<DownloadedClip>,
}

impl RunProgress {
    fn enter(&mut self, state: PipelineState) {
        self.state = state;
        logi(format!("Step: {}", state));
    }
}

struct Produced {
    package: ContentPackage,
    narration: NarrationAsset,
    final_path: PathBuf,
}

impl Pipeline {
    pub fn new(collaborators: Collaborators, settings: PipelineSettings) -> Self {
        let assembly = AssemblyDriver::new(Arc::clone(&collaborators.media))
            .with_timeout(settings.assembly_timeout);
        Self {
            collaborators,
            settings,
            assembly,
        }
    }

    /// Wires the real Gemini, ElevenLabs, Pexels and ffmpeg collaborators over one shared
    /// HTTP client.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = Transport::new()?;
        let collaborators = Collaborators {
            script: Arc::new(GeminiScriptGenerator::with_base_url(
                transport.clone(),
                config.gemini_api_key.clone(),
                config.gemini_model.clone(),
                config.endpoints.gemini.clone(),
            )),
            speech: Arc::new(ElevenLabsSynthesizer::with_base_url(
                transport.clone(),
                config.elevenlabs_api_key.clone(),
                config.eleven_voice_id.clone(),
                config.eleven_model_id.clone(),
                config.endpoints.elevenlabs.clone(),
            )),
            footage: Arc::new(PexelsFootageSource::with_base_url(
                transport,
                config.pexels_api_key.clone(),
                config.endpoints.pexels.clone(),
            )),
            media: Arc::new(FfmpegTool::new(&config.ffmpeg_path, &config.ffprobe_path)),
        };
        Ok(Self::new(collaborators, PipelineSettings::from_config(config)))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Parses the raw topic label before any external call, then runs the pipeline.
    pub async fn handle_request(&self, raw_topic: &str) -> GenerateResponse {
        match raw_topic.parse::<Topic>() {
            Ok(topic) => self.run(topic).await.into(),
            Err(err) => {
                logw(err.user_message());
                GenerateResponse::failure(PipelineState::Idle, &err)
            }
        }
    }

    /// Runs every step for `topic` in its own run directory. Scratch files are removed
    /// whether the run succeeds or fails.
    pub async fn run(&self, topic: Topic) -> Result<VideoDescriptor, RunFailure> {
        logi(format!("=== Generating video: {} ===", topic.label()));
        let workspace = RunWorkspace::create(&self.settings.output_root)
            .await
            .map_err(|error| RunFailure {
                state: PipelineState::Idle,
                error,
            })?;
        logi(format!("Run directory: {}", workspace.dir().display()));

        let mut progress = RunProgress {
            state: PipelineState::Idle,
            clips: Vec::new(),
        };
        let outcome = self.execute(topic, &workspace, &mut progress).await;
        let run_id = workspace.run_id().to_string();
        let report = workspace.cleanup(&progress.clips, outcome.is_ok()).await;
        if report.failed > 0 {
            logw(format!(
                "{} scratch files of run {} could not be removed",
                report.failed, run_id
            ));
        }

        match outcome {
            Ok(produced) => {
                progress.enter(PipelineState::Done);
                let video = self.describe(produced, run_id);
                logok(format!("Video ready: {} ({})", video.url, video.duration));
                Ok(video)
            }
            Err(error) => {
                let failed_in = progress.state;
                progress.enter(PipelineState::Failed);
                loge(format!(
                    "Run {} failed while {}: {}",
                    run_id, failed_in, error
                ));
                Err(RunFailure {
                    state: failed_in,
                    error,
                })
            }
        }
    }

    async fn execute(
        &self,
        topic: Topic,
        workspace: &RunWorkspace,
        progress: &mut RunProgress,
    ) -> PipelineResult<Produced> {
        progress.enter(PipelineState::GeneratingContent);
        let package = self.collaborators.script.generate(topic).await?;
        logok(format!(
            "Content package: \"{}\" ({} keywords, mood {})",
            package.title,
            package.visual_keywords.len(),
            package.music_mood
        ));

        progress.enter(PipelineState::SynthesizingAudio);
        let narration_path = workspace.narration_path();
        self.collaborators
            .speech
            .synthesize(&package.script, &narration_path)
            .await?;
        let narration =
            NarrationAsset::probe(self.collaborators.media.as_ref(), narration_path).await;

        progress.enter(PipelineState::FetchingClips);
        progress.clips = self
            .fetch_clips(workspace, &package.visual_keywords)
            .await?;
        if progress.clips.is_empty() {
            return Err(PipelineError::NoClipsFound);
        }
        logok(format!("Downloaded {} clips", progress.clips.len()));

        progress.enter(PipelineState::Planning);
        let sequence = planner::plan(&progress.clips, narration.duration)?;
        let order: Vec<&str> = sequence
            .entries
            .iter()
            .map(|e| e.clip.source_keyword.as_str())
            .collect();
        logi(format!("Clip order: {}", order.join(" | ")));
        let shortfall = sequence.shortfall();
        if shortfall > 0.0 {
            logw(format!(
                "Clip sequence is {:.2}s short of the narration",
                shortfall
            ));
        }

        progress.enter(PipelineState::Assembling);
        let music = self.music_for(package.music_mood).await;
        let final_path = self
            .assembly
            .assemble(AssemblyRequest {
                sequence: &sequence,
                narration_path: &narration.local_path,
                narration_duration: narration.duration,
                music_path: music.as_deref(),
                run_dir: workspace.dir(),
            })
            .await?;

        Ok(Produced {
            package,
            narration,
            final_path,
        })
    }

    /// Fetches every keyword concurrently. The pool keeps keyword order; a rejected API key
    /// aborts the whole step.
    async fn fetch_clips(
        &self,
        workspace: &RunWorkspace,
        keywords: &[String],
    ) -> PipelineResult<Vec<DownloadedClip>> {
        let fetches = keywords
            .iter()
            .enumerate()
            .map(|(index, keyword)| self.fetch_keyword(workspace, index, keyword));
        let results = join_all(fetches).await;

        let mut pool = Vec::new();
        for (keyword, result) in keywords.iter().zip(results) {
            match result {
                Ok(clips) => pool.extend(clips),
                Err(err) if err.is_credential() => return Err(err),
                Err(err) => logw(format!("Search for \"{}\" failed: {}", keyword, err)),
            }
        }
        Ok(pool)
    }

    async fn fetch_keyword(
        &self,
        workspace: &RunWorkspace,
        index: usize,
        keyword: &str,
    ) -> PipelineResult<Vec<DownloadedClip>> {
        let footage = &self.collaborators.footage;
        let videos = footage.search(keyword).await?;
        if videos.is_empty() {
            logw(format!("No stock footage for \"{}\"", keyword));
        }

        let mut clips = Vec::new();
        for (video_index, video) in videos
            .iter()
            .take(self.settings.videos_per_keyword)
            .enumerate()
        {
            if clips.len() >= self.settings.clips_per_keyword {
                break;
            }
            let Some(selection) = selector::select(&video.files) else {
                continue;
            };

            let dest = workspace.clip_path(index, video_index);
            match footage.download(&selection.file.url, &dest).await {
                Ok(()) => {
                    logi(format!(
                        "Clip for \"{}\": {}px ({:?}) -> {}",
                        keyword,
                        selection.file.width,
                        selection.tier,
                        dest.display()
                    ));
                    clips.push(DownloadedClip::new(dest, keyword));
                }
                Err(err) if err.is_credential() => return Err(err),
                Err(err) => logw(format!("Download for \"{}\" failed: {}", keyword, err)),
            }
        }
        Ok(clips)
    }

    async fn music_for(&self, mood: MusicMood) -> Option<PathBuf> {
        let path = self.settings.music_dir.join(format!("{}.mp3", mood));
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(path),
            _ => None,
        }
    }

    fn describe(&self, produced: Produced, run_id: String) -> VideoDescriptor {
        let duration = produced.narration.duration;
        VideoDescriptor {
            title: produced.package.title,
            url: public_url(&produced.final_path, &self.settings.public_root),
            duration: format!("{:.1}s", duration),
            duration_seconds: duration,
            duration_estimated: produced.narration.estimated,
            run_id,
        }
    }
}

/// `/`-rooted URL of `path` relative to `public_root`, with forward slashes.
pub fn public_url(path: &Path, public_root: &Path) -> String {
    let absolute = |p: &Path| std::path::absolute(p).unwrap_or_else(|_| p.to_path_buf());
    let relative = pathdiff::diff_paths(absolute(path), absolute(public_root))
        .unwrap_or_else(|| path.to_path_buf());
    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{}", joined.trim_start_matches('/'))
}

/// Loads the configuration, prepares the working directories and runs one request.
/// Shared by the CLI and the desktop front-end.
pub async fn run_for_topic(config_path: impl AsRef<Path>, topic: &str) -> Result<GenerateResponse> {
    let config = Config::load_or_default(config_path).await?;
    init::ensure_directories(&config).await?;
    if !init::check_ffmpeg(&config.ffmpeg_path).await {
        logw(format!(
            "FFmpeg not found at {}. Please install FFmpeg.",
            config.ffmpeg_path.display()
        ));
    }
    let pipeline = Pipeline::from_config(&config)?;
    Ok(pipeline.handle_request(topic).await)
}
