use crate::error::{PipelineError, PipelineResult};
use crate::footage::{FootageSource, StockVideo, VideoFileDescriptor};
use crate::transport::{Transport, TransportError};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

const SERVICE: &str = "Pexels";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(20);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(45);
const RESULTS_PER_PAGE: u32 = 10;

pub struct PexelsFootageSource {
    transport: Transport,
    api_key: String,
    base_url: String,
}

impl PexelsFootageSource {
    pub fn with_base_url(transport: Transport, api_key: String, base_url: String) -> Self {
        Self {
            transport,
            api_key: api_key.trim().to_string(),
            base_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoFile {
    width: Option<u32>,
    file_size: Option<u64>,
    link: Option<String>,
}

impl From<PexelsVideo> for StockVideo {
    fn from(video: PexelsVideo) -> Self {
        let files = video
            .video_files
            .into_iter()
            .filter_map(|f| {
                let url = f.link.filter(|l| !l.is_empty())?;
                Some(VideoFileDescriptor {
                    width: f.width.unwrap_or(0),
                    file_size: f.file_size,
                    url,
                })
            })
            .collect();
        StockVideo {
            id: video.id,
            files,
        }
    }
}

async fn stream_to_file(resp: reqwest::Response, dest: &Path) -> PipelineResult<u64> {
    let mut file = fs::File::create(dest)
        .await
        .map_err(|e| PipelineError::io(dest, e))?;
    let mut written = 0u64;
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| PipelineError::Transport {
            service: SERVICE,
            source: TransportError::Body(e),
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|e| PipelineError::io(dest, e))?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(|e| PipelineError::io(dest, e))?;
    Ok(written)
}

#[async_trait]
impl FootageSource for PexelsFootageSource {
    async fn search(&self, keyword: &str) -> PipelineResult<Vec<StockVideo>> {
        if self.api_key.is_empty() {
            return Err(PipelineError::missing_key(SERVICE, "pexels_api_key", "PEXELS_API_KEY"));
        }

        let url = format!("{}/videos/search", self.base_url.trim_end_matches('/'));
        let per_page = RESULTS_PER_PAGE.to_string();
        let resp = self
            .transport
            .send(SERVICE, |c| {
                c.get(&url)
                    .header("Authorization", &self.api_key)
                    .query(&[
                        ("query", keyword),
                        ("per_page", per_page.as_str()),
                        ("orientation", "landscape"),
                    ])
                    .timeout(SEARCH_TIMEOUT)
            })
            .await
            .map_err(|e| PipelineError::from_transport(SERVICE, e))?;

        let parsed: SearchResponse = resp.json().await.map_err(|e| PipelineError::Transport {
            service: SERVICE,
            source: TransportError::Body(e),
        })?;
        Ok(parsed.videos.into_iter().map(StockVideo::from).collect())
    }

    async fn download(&self, url: &str, dest: &Path) -> PipelineResult<()> {
        let resp = self
            .transport
            .send("clip download", |c| c.get(url).timeout(DOWNLOAD_TIMEOUT))
            .await
            // Clip links are public CDN URLs; a 401/403 there is not a key problem.
            .map_err(|source| PipelineError::Transport {
                service: SERVICE,
                source,
            })?;

        match stream_to_file(resp, dest).await {
            Ok(0) => {
                let _ = fs::remove_file(dest).await;
                Err(PipelineError::Transport {
                    service: SERVICE,
                    source: TransportError::EmptyBody,
                })
            }
            Ok(_) => Ok(()),
            Err(err) => {
                let _ = fs::remove_file(dest).await;
                Err(err)
            }
        }
    }
}
