use crate::planner::PlanError;
use crate::transport::TransportError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid topic: {0}")]
    Input(String),
    #[error("{service} credential error: {message}")]
    Credential {
        service: &'static str,
        message: String,
    },
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: TransportError,
    },
    #[error("content generation failed: {0}")]
    ContentGeneration(String),
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
    #[error("no stock footage could be downloaded for any keyword")]
    NoClipsFound,
    #[error(transparent)]
    Planning(#[from] PlanError),
    #[error("media assembly failed: {message}")]
    Assembly { message: String, diagnostics: String },
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn missing_key(service: &'static str, config_key: &str, env_key: &str) -> Self {
        PipelineError::Credential {
            service,
            message: format!(
                "{} API key is missing. Add {} to config.json or set {}.",
                service, config_key, env_key
            ),
        }
    }

    /// Maps a transport failure onto the taxonomy: rejected credentials become
    /// `Credential`, everything else stays a fatal `Transport` error.
    pub fn from_transport(service: &'static str, source: TransportError) -> Self {
        match source.status() {
            Some(401) | Some(403) => PipelineError::Credential {
                service,
                message: format!(
                    "Invalid {} API key. Please check your API key in config.json.",
                    service
                ),
            },
            _ => PipelineError::Transport { service, source },
        }
    }

    pub fn is_credential(&self) -> bool {
        matches!(self, PipelineError::Credential { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Input(_) => "input_error",
            PipelineError::Credential { .. } => "credential_error",
            PipelineError::Transport { .. } => "network_error",
            PipelineError::ContentGeneration(_) => "content_generation_error",
            PipelineError::Synthesis(_) => "synthesis_error",
            PipelineError::NoClipsFound => "no_clips_found",
            PipelineError::Planning(_) => "planning_error",
            PipelineError::Assembly { .. } => "assembly_error",
            PipelineError::Io { .. } => "io_error",
        }
    }

    /// Message suitable for the caller. Never includes source chains or backtraces.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Input(msg) => msg.clone(),
            PipelineError::Credential { message, .. } => message.clone(),
            PipelineError::Transport { service, source } => {
                format!("{} API error: {}", service, source)
            }
            PipelineError::ContentGeneration(_) => {
                "The AI failed to generate a valid content package.".to_string()
            }
            PipelineError::Synthesis(msg) => format!("Narration audio could not be created: {}", msg),
            PipelineError::NoClipsFound => {
                "Could not find enough relevant video clips. Please try a different niche."
                    .to_string()
            }
            PipelineError::Planning(err) => {
                format!("Could not build a clip sequence for the narration: {}", err)
            }
            PipelineError::Assembly { diagnostics, message } => {
                if diagnostics.trim().is_empty() {
                    format!("Failed to assemble the video: {}", message)
                } else {
                    format!("Failed to assemble the video: {}", diagnostics.trim())
                }
            }
            PipelineError::Io { .. } => {
                "An unexpected error occurred while handling working files.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_key_becomes_credential_error() {
        let err = PipelineError::from_transport(
            "ElevenLabs",
            TransportError::Status {
                status: 401,
                body: "{\"detail\":\"invalid_api_key\"}".to_string(),
            },
        );
        assert!(err.is_credential());
        assert_eq!(err.kind(), "credential_error");
        assert!(err.user_message().contains("Invalid ElevenLabs API key"));
    }

    #[test]
    fn other_statuses_stay_network_errors() {
        let err = PipelineError::from_transport(
            "Pexels",
            TransportError::Status {
                status: 404,
                body: "not found".to_string(),
            },
        );
        assert_eq!(err.kind(), "network_error");
        assert!(err.user_message().starts_with("Pexels API error"));
    }

    #[test]
    fn assembly_message_surfaces_diagnostics() {
        let err = PipelineError::Assembly {
            message: "ffmpeg exited with status 1".to_string(),
            diagnostics: "concat.txt: Invalid data found\n".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "Failed to assemble the video: concat.txt: Invalid data found"
        );
    }
}
