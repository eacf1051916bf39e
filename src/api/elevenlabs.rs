use crate::error::{PipelineError, PipelineResult};
use crate::logok;
use crate::narration::SpeechSynthesizer;
use crate::transport::{Transport, TransportError};
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

const SERVICE: &str = "ElevenLabs";
/// Long narrations synthesize slowly.
const TIMEOUT: Duration = Duration::from_secs(120);

pub struct ElevenLabsSynthesizer {
    transport: Transport,
    api_key: String,
    voice_id: String,
    model_id: String,
    base_url: String,
}

impl ElevenLabsSynthesizer {
    pub fn with_base_url(
        transport: Transport,
        api_key: String,
        voice_id: String,
        model_id: String,
        base_url: String,
    ) -> Self {
        Self {
            transport,
            api_key: api_key.trim().to_string(),
            voice_id,
            model_id,
            base_url,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str, out_path: &Path) -> PipelineResult<()> {
        if self.api_key.is_empty() {
            return Err(PipelineError::missing_key(
                SERVICE,
                "elevenlabs_api_key",
                "ELEVENLABS_API_KEY",
            ));
        }

        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.base_url.trim_end_matches('/'),
            self.voice_id
        );
        let body = json!({
            "text": text,
            "model_id": self.model_id,
            "voice_settings": {
                "stability": 0.6,
                "similarity_boost": 0.75,
                "style": 0.4,
                "use_speaker_boost": true
            }
        });

        let resp = self
            .transport
            .send(SERVICE, |c| {
                c.post(&url)
                    .header("Accept", "audio/mpeg")
                    .header("xi-api-key", &self.api_key)
                    .json(&body)
                    .timeout(TIMEOUT)
            })
            .await
            .map_err(|e| PipelineError::from_transport(SERVICE, e))?;

        let bytes = resp.bytes().await.map_err(|e| PipelineError::Transport {
            service: SERVICE,
            source: TransportError::Body(e),
        })?;
        if bytes.is_empty() {
            return Err(PipelineError::Synthesis(
                "ElevenLabs returned an empty audio stream".to_string(),
            ));
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PipelineError::io(parent, e))?;
        }
        fs::write(out_path, &bytes)
            .await
            .map_err(|e| PipelineError::io(out_path, e))?;

        logok(format!(
            "Narration audio saved: {} ({} bytes)",
            out_path.display(),
            bytes.len()
        ));
        Ok(())
    }
}
