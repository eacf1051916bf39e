use crate::config::Config;
use crate::logi;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// Creates the output and music directories named by `config` when missing.
pub async fn ensure_directories(config: &Config) -> Result<()> {
    for dir in [&config.output_dir, &config.music_dir] {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            logi(format!("Created directory: {}", dir.display()));
        }
    }
    Ok(())
}

pub async fn check_ffmpeg(ffmpeg: &Path) -> bool {
    match tokio::process::Command::new(ffmpeg)
        .arg("-version")
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_directories() {
        let root = tempfile::tempdir().unwrap();
        let config = Config {
            output_dir: root.path().join("static/output"),
            music_dir: root.path().join("music"),
            ..Config::default()
        };
        ensure_directories(&config).await.unwrap();
        assert!(config.output_dir.is_dir());
        assert!(config.music_dir.is_dir());
        ensure_directories(&config).await.unwrap();
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        assert!(!check_ffmpeg(Path::new("/nonexistent/ffmpeg-binary")).await);
    }
}
