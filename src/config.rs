use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gemini_api_key: String,
    #[serde(default)]
    pub elevenlabs_api_key: String,
    #[serde(default)]
    pub pexels_api_key: String,
    #[serde(default = "default_voice_id")]
    pub eleven_voice_id: String,
    #[serde(default = "default_model_id")]
    pub eleven_model_id: String,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_music_dir")]
    pub music_dir: PathBuf,
    /// Directory the returned video URL is expressed relative to.
    #[serde(default = "default_public_root")]
    pub public_root: PathBuf,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: PathBuf,
    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: PathBuf,
    #[serde(default)]
    pub assembly_timeout_secs: Option<u64>,
    #[serde(default)]
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_gemini_base")]
    pub gemini: String,
    #[serde(default = "default_elevenlabs_base")]
    pub elevenlabs: String,
    #[serde(default = "default_pexels_base")]
    pub pexels: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            gemini: default_gemini_base(),
            elevenlabs: default_elevenlabs_base(),
            pexels: default_pexels_base(),
        }
    }
}

fn default_voice_id() -> String {
    "21m00Tcm4TlvDq8ikWAM".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("static/output")
}

fn default_music_dir() -> PathBuf {
    PathBuf::from("music")
}

fn default_public_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_gemini_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_elevenlabs_base() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_pexels_base() -> String {
    "https://api.pexels.com".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            elevenlabs_api_key: String::new(),
            pexels_api_key: String::new(),
            eleven_voice_id: default_voice_id(),
            eleven_model_id: default_model_id(),
            gemini_model: default_gemini_model(),
            output_dir: default_output_dir(),
            music_dir: default_music_dir(),
            public_root: default_public_root(),
            ffmpeg_path: default_ffmpeg(),
            ffprobe_path: default_ffprobe(),
            assembly_timeout_secs: None,
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
        Ok(config)
    }

    /// Reads `path` when it exists (defaults otherwise) and applies the API key
    /// environment variables on top.
    pub async fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = if fs::metadata(&path).await.is_ok() {
            Self::load(&path).await?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let pairs: [(&str, &mut String); 3] = [
            ("GEMINI_API_KEY", &mut self.gemini_api_key),
            ("ELEVENLABS_API_KEY", &mut self.elevenlabs_api_key),
            ("PEXELS_API_KEY", &mut self.pexels_api_key),
        ];
        for (name, slot) in pairs {
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                *slot = value.trim().to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_unset_fields() {
        let cfg = Config::default();
        assert_eq!(cfg.eleven_voice_id, "21m00Tcm4TlvDq8ikWAM");
        assert_eq!(cfg.eleven_model_id, "eleven_multilingual_v2");
        assert_eq!(cfg.output_dir, PathBuf::from("static/output"));
        assert_eq!(cfg.music_dir, PathBuf::from("music"));
        assert!(cfg.gemini_api_key.is_empty());
        assert_eq!(cfg.assembly_timeout_secs, None);
        assert_eq!(cfg.endpoints.pexels, "https://api.pexels.com");
    }

    #[test]
    fn env_overrides_file_keys() {
        let mut cfg: Config =
            serde_json::from_str(r#"{"pexels_api_key":"from-file","gemini_api_key":"g"}"#)
                .unwrap();
        cfg.apply_env(|key| match key {
            "PEXELS_API_KEY" => Some(" from-env ".to_string()),
            "GEMINI_API_KEY" => Some("".to_string()),
            _ => None,
        });
        assert_eq!(cfg.pexels_api_key, "from-env");
        assert_eq!(cfg.gemini_api_key, "g");
        assert!(cfg.elevenlabs_api_key.is_empty());
    }

    #[tokio::test]
    async fn loads_file_with_partial_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"elevenlabs_api_key":"el","music_dir":"assets/music","assembly_timeout_secs":600,
                "endpoints":{"pexels":"http://localhost:9"}}"#,
        )
        .unwrap();

        let cfg = Config::load(&path).await.unwrap();
        assert_eq!(cfg.elevenlabs_api_key, "el");
        assert_eq!(cfg.music_dir, PathBuf::from("assets/music"));
        assert_eq!(cfg.assembly_timeout_secs, Some(600));
        assert_eq!(cfg.endpoints.pexels, "http://localhost:9");
        assert_eq!(cfg.endpoints.elevenlabs, "https://api.elevenlabs.io");
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Config::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
