use crate::error::{PipelineError, PipelineResult};
use crate::topic::{MusicMood, Topic};
use crate::{logi, logw};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Number of visual search terms requested from the script generator.
pub const KEYWORD_COUNT: usize = 8;

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json|JSON)?").expect("code fence regex"));

/// Script, title and search terms for one video. Created once per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPackage {
    pub title: String,
    pub script: String,
    pub visual_keywords: Vec<String>,
    pub music_mood: MusicMood,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    title: Option<String>,
    script: Option<String>,
    visual_keywords: Option<Vec<String>>,
}

fn required(field: &str, value: Option<String>) -> PipelineResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(PipelineError::ContentGeneration(format!(
            "model output is missing \"{}\"",
            field
        ))),
    }
}

impl ContentPackage {
    /// Parses the model's text output. Markdown code fences around the JSON are tolerated.
    /// The mood always comes from the topic.
    pub fn from_model_output(text: &str, topic: Topic) -> PipelineResult<Self> {
        let cleaned = CODE_FENCE.replace_all(text.trim(), "");
        let raw: RawPackage = serde_json::from_str(cleaned.trim()).map_err(|e| {
            let snippet = cleaned.chars().take(200).collect::<String>();
            PipelineError::ContentGeneration(format!("invalid JSON ({}): {}", e, snippet))
        })?;

        let title = required("title", raw.title)?;
        let script = required("script", raw.script)?;
        let mut visual_keywords: Vec<String> = raw
            .visual_keywords
            .unwrap_or_default()
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if visual_keywords.is_empty() {
            return Err(PipelineError::ContentGeneration(
                "model output is missing \"visual_keywords\"".to_string(),
            ));
        }
        if visual_keywords.len() > KEYWORD_COUNT {
            visual_keywords.truncate(KEYWORD_COUNT);
        } else if visual_keywords.len() < KEYWORD_COUNT {
            logw(format!(
                "Model returned {} visual keywords (asked for {})",
                visual_keywords.len(),
                KEYWORD_COUNT
            ));
        }

        logi(format!(
            "Generated script has {} words",
            script.split_whitespace().count()
        ));

        Ok(Self {
            title,
            script,
            visual_keywords,
            music_mood: topic.mood(),
        })
    }
}

#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate(&self, topic: Topic) -> PipelineResult<ContentPackage>;
}
