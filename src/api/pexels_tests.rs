use crate::api::pexels::PexelsFootageSource;
use crate::footage::FootageSource;
use crate::transport::{RetryPolicy, Transport};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, key: &str) -> PexelsFootageSource {
    let transport = Transport::with_client(
        reqwest::Client::new(),
        RetryPolicy {
            max_retries: 1,
            base_delay: Duration::from_millis(5),
        },
    );
    PexelsFootageSource::with_base_url(transport, key.to_string(), server.uri())
}

#[tokio::test]
async fn test_search_maps_video_files() {
    let server = MockServer::start().await;
    let body = json!({
        "page": 1,
        "videos": [{
            "id": 42,
            "video_files": [
                { "width": 1920, "file_size": 12_000_000u64, "link": "https://cdn.example/hd.mp4" },
                { "width": 640, "link": "https://cdn.example/sd.mp4" },
                { "width": 3840, "file_size": 90_000_000u64 }
            ]
        }]
    });
    Mock::given(method("GET"))
        .and(path("/videos/search"))
        .and(header("authorization", "px-key"))
        .and(query_param("query", "dark forest"))
        .and(query_param("per_page", "10"))
        .and(query_param("orientation", "landscape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let videos = client(&server, "px-key").search("dark forest").await.unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].id, 42);
    // The 4K entry has no link and is dropped.
    assert_eq!(videos[0].files.len(), 2);
    assert_eq!(videos[0].files[0].width, 1920);
    assert_eq!(videos[0].files[0].file_size, Some(12_000_000));
    assert_eq!(videos[0].files[1].file_size, None);
    assert_eq!(videos[0].files[1].url, "https://cdn.example/sd.mp4");
}

#[tokio::test]
async fn test_search_without_videos_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "page": 1 })))
        .mount(&server)
        .await;

    let videos = client(&server, "px-key").search("nothing").await.unwrap();
    assert!(videos.is_empty());
}

#[tokio::test]
async fn test_search_401_is_credential_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("{\"error\":\"Unauthorized\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, "bad").search("ocean").await.unwrap_err();
    assert!(err.is_credential());
    assert!(err.user_message().contains("Invalid Pexels API key"));
}

#[tokio::test]
async fn test_download_writes_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("clip_0_0.mp4");
    client(&server, "px-key")
        .download(&format!("{}/clip.mp4", server.uri()), &dest)
        .await
        .unwrap();
    assert_eq!(std::fs::metadata(&dest).unwrap().len(), 4096);
}

#[tokio::test]
async fn test_failed_download_leaves_no_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.mp4"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/empty.mp4"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let source = client(&server, "px-key");

    let gone = dir.path().join("gone.mp4");
    let err = source
        .download(&format!("{}/gone.mp4", server.uri()), &gone)
        .await
        .unwrap_err();
    assert!(!err.is_credential());
    assert!(!gone.exists());

    let empty = dir.path().join("empty.mp4");
    assert!(source
        .download(&format!("{}/empty.mp4", server.uri()), &empty)
        .await
        .is_err());
    assert!(!empty.exists());
}
