use crate::api::elevenlabs::ElevenLabsSynthesizer;
use crate::narration::SpeechSynthesizer;
use crate::transport::{RetryPolicy, Transport};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VOICE: &str = "voice-123";

fn client(server: &MockServer, key: &str) -> ElevenLabsSynthesizer {
    let transport = Transport::with_client(
        reqwest::Client::new(),
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(5),
        },
    );
    ElevenLabsSynthesizer::with_base_url(
        transport,
        key.to_string(),
        VOICE.to_string(),
        "eleven_multilingual_v2".to_string(),
        server.uri(),
    )
}

#[tokio::test]
async fn test_synthesize_writes_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1/text-to-speech/{}", VOICE)))
        .and(header("xi-api-key", "el-key"))
        .and(header("accept", "audio/mpeg"))
        .and(body_partial_json(serde_json::json!({
            "text": "Once upon a time",
            "model_id": "eleven_multilingual_v2",
            "voice_settings": { "stability": 0.6, "use_speaker_boost": true }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3fakeaudio".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("run").join("narration.mp3");
    client(&server, "el-key")
        .synthesize("Once upon a time", &out)
        .await
        .unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), b"ID3fakeaudio");
}

#[tokio::test]
async fn test_synthesize_401_is_credential_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string("{\"detail\":{\"status\":\"invalid_api_key\"}}"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("narration.mp3");
    let err = client(&server, "wrong")
        .synthesize("text", &out)
        .await
        .unwrap_err();
    assert!(err.is_credential());
    assert!(err.user_message().contains("Invalid ElevenLabs API key"));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_synthesize_retries_transient_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"audio".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("narration.mp3");
    client(&server, "el-key")
        .synthesize("text", &out)
        .await
        .unwrap();
    assert!(out.exists());
}

#[tokio::test]
async fn test_synthesize_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let err = client(&server, "el-key")
        .synthesize("text", &dir.path().join("n.mp3"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "synthesis_error");
}
