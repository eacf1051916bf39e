use crate::error::PipelineResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One downloadable rendition of a stock video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFileDescriptor {
    pub width: u32,
    pub file_size: Option<u64>,
    pub url: String,
}

/// A single search hit with all of its renditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockVideo {
    pub id: u64,
    pub files: Vec<VideoFileDescriptor>,
}

/// A clip fetched into the run directory. Owned by the run and deleted when it ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedClip {
    pub local_path: PathBuf,
    pub source_keyword: String,
}

impl DownloadedClip {
    pub fn new(local_path: impl Into<PathBuf>, source_keyword: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            source_keyword: source_keyword.into(),
        }
    }

    pub fn file_name(&self) -> String {
        self.local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.local_path.display().to_string())
    }
}

#[async_trait]
pub trait FootageSource: Send + Sync {
    /// Stock videos matching `keyword`, best matches first.
    async fn search(&self, keyword: &str) -> PipelineResult<Vec<StockVideo>>;

    /// Fetches `url` to `dest`. A failed download must not leave a partial file behind.
    async fn download(&self, url: &str, dest: &Path) -> PipelineResult<()>;
}
