use crate::content::{ContentPackage, ScriptGenerator};
use crate::error::{PipelineError, PipelineResult};
use crate::{logi, logok};
use crate::topic::Topic;
use crate::transport::{Transport, TransportError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SERVICE: &str = "Gemini";
const TIMEOUT: Duration = Duration::from_secs(90);

pub struct GeminiScriptGenerator {
    transport: Transport,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiScriptGenerator {
    pub fn with_base_url(transport: Transport, api_key: String, model: String, base_url: String) -> Self {
        Self {
            transport,
            api_key: api_key.trim().to_string(),
            model,
            base_url,
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Gemini answers an unknown key with 400 `API_KEY_INVALID` rather than 401.
fn map_transport_error(err: TransportError) -> PipelineError {
    if let TransportError::Status { status: 400, body } = &err {
        if body.contains("API_KEY_INVALID") || body.contains("API key not valid") {
            return PipelineError::Credential {
                service: SERVICE,
                message: "Invalid Gemini API key. Please check your API key in config.json."
                    .to_string(),
            };
        }
    }
    PipelineError::from_transport(SERVICE, err)
}

#[async_trait]
impl ScriptGenerator for GeminiScriptGenerator {
    async fn generate(&self, topic: Topic) -> PipelineResult<ContentPackage> {
        if self.api_key.is_empty() {
            return Err(PipelineError::missing_key(SERVICE, "gemini_api_key", "GEMINI_API_KEY"));
        }

        logi(format!("Generating AI content for 1-2 minute video: {}", topic));
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model.trim_start_matches("models/")
        );
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: topic.prompt(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let resp = self
            .transport
            .send(SERVICE, |c| {
                c.post(&url)
                    .query(&[("key", self.api_key.as_str())])
                    .json(&request)
                    .timeout(TIMEOUT)
            })
            .await
            .map_err(map_transport_error)?;

        let body = resp.text().await.map_err(|e| PipelineError::Transport {
            service: SERVICE,
            source: TransportError::Body(e),
        })?;
        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            PipelineError::ContentGeneration(format!("unreadable Gemini response: {}", e))
        })?;

        let text = parsed
            .candidates
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .find(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                PipelineError::ContentGeneration("Gemini returned no candidates".to_string())
            })?;

        let package = ContentPackage::from_model_output(&text, topic)?;
        logok(format!("AI-generated content package created: {}", package.title));
        Ok(package)
    }
}
