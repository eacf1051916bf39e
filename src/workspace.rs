use crate::assembly::{CONCAT_FILE, OUTPUT_FILE};
use crate::error::{PipelineError, PipelineResult};
use crate::footage::DownloadedClip;
use crate::{logi, logw};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

pub const NARRATION_FILE: &str = "narration.mp3";

/// Scratch directory for one request: `<output_root>/<run_id>/`.
///
/// `cleanup` consumes the workspace, so scratch files are removed exactly once.
#[derive(Debug)]
pub struct RunWorkspace {
    run_id: String,
    dir: PathBuf,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub failed: usize,
}

pub fn new_run_id() -> String {
    format!(
        "{}-{:08x}",
        chrono::Local::now().format("%Y%m%d-%H%M%S"),
        rand::random::<u32>()
    )
}

async fn remove_file_quiet(path: &Path, report: &mut CleanupReport) {
    match fs::remove_file(path).await {
        Ok(()) => report.removed += 1,
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            logw(format!("Failed to remove {}: {}", path.display(), e));
            report.failed += 1;
        }
    }
}

impl RunWorkspace {
    pub async fn create(output_root: &Path) -> PipelineResult<Self> {
        Self::create_with_id(output_root, new_run_id()).await
    }

    pub async fn create_with_id(output_root: &Path, run_id: String) -> PipelineResult<Self> {
        let dir = output_root.join(&run_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| PipelineError::io(&dir, e))?;
        Ok(Self { run_id, dir })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn narration_path(&self) -> PathBuf {
        self.dir.join(NARRATION_FILE)
    }

    pub fn concat_path(&self) -> PathBuf {
        self.dir.join(CONCAT_FILE)
    }

    pub fn final_video_path(&self) -> PathBuf {
        self.dir.join(OUTPUT_FILE)
    }

    pub fn clip_path(&self, keyword_index: usize, video_index: usize) -> PathBuf {
        self.dir
            .join(format!("clip_{}_{}.mp4", keyword_index, video_index))
    }

    /// Deletes the clips, the concat description and the narration. When `keep_output`
    /// is set the final video stays and every other file in the run directory is swept;
    /// otherwise the whole run directory is removed.
    pub async fn cleanup(self, clips: &[DownloadedClip], keep_output: bool) -> CleanupReport {
        let mut report = CleanupReport::default();

        for clip in clips {
            remove_file_quiet(&clip.local_path, &mut report).await;
        }
        remove_file_quiet(&self.concat_path(), &mut report).await;
        remove_file_quiet(&self.narration_path(), &mut report).await;

        if keep_output {
            let keep = self.final_video_path();
            let leftovers: Vec<PathBuf> = WalkDir::new(&self.dir)
                .min_depth(1)
                .contents_first(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.into_path())
                .filter(|p| *p != keep)
                .collect();
            for path in leftovers {
                if path.is_dir() {
                    let _ = fs::remove_dir(&path).await;
                } else {
                    remove_file_quiet(&path, &mut report).await;
                }
            }
        } else if let Err(e) = fs::remove_dir_all(&self.dir).await {
            if e.kind() != ErrorKind::NotFound {
                logw(format!("Failed to remove run dir {}: {}", self.dir.display(), e));
                report.failed += 1;
            }
        }

        logi(format!(
            "Cleaned run {} ({} files removed)",
            self.run_id, report.removed
        ));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_unique() {
        let a = new_run_id();
        let b = new_run_id();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn runs_get_separate_directories() {
        let root = tempfile::tempdir().unwrap();
        let a = RunWorkspace::create(root.path()).await.unwrap();
        let b = RunWorkspace::create(root.path()).await.unwrap();
        assert_ne!(a.dir(), b.dir());
        assert_ne!(a.clip_path(0, 0), b.clip_path(0, 0));
        assert!(a.dir().is_dir());
    }

    #[tokio::test]
    async fn successful_cleanup_keeps_only_final_video() {
        let root = tempfile::tempdir().unwrap();
        let ws = RunWorkspace::create_with_id(root.path(), "run".to_string())
            .await
            .unwrap();
        let clip = DownloadedClip::new(ws.clip_path(0, 0), "fog");
        for path in [
            clip.local_path.clone(),
            ws.clip_path(3, 2),
            ws.concat_path(),
            ws.narration_path(),
            ws.final_video_path(),
        ] {
            std::fs::write(&path, b"x").unwrap();
        }
        let dir = ws.dir().to_path_buf();
        let final_path = ws.final_video_path();

        let report = ws.cleanup(&[clip], true).await;
        assert_eq!(report.removed, 4);
        assert_eq!(report.failed, 0);
        let remaining: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
        assert_eq!(remaining.len(), 1);
        assert!(final_path.exists());
    }

    #[tokio::test]
    async fn failed_run_removes_directory_and_tolerates_missing_clips() {
        let root = tempfile::tempdir().unwrap();
        let ws = RunWorkspace::create(root.path()).await.unwrap();
        let gone = DownloadedClip::new(ws.clip_path(1, 0), "never written");
        let dir = ws.dir().to_path_buf();

        let report = ws.cleanup(&[gone], false).await;
        assert_eq!(report.failed, 0);
        assert!(!dir.exists());
    }
}
