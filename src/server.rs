use crate::logw;
use crate::pipeline::{public_url, GenerateResponse, Pipeline};
use crate::topic::Topic;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub niche: Option<String>,
}

/// Rejected input is the caller's fault; every other failure is reported as a server error.
pub fn status_for(response: &GenerateResponse) -> StatusCode {
    match response {
        GenerateResponse::Videos { .. } => StatusCode::OK,
        GenerateResponse::Error { kind, .. } if *kind == "input_error" => StatusCode::BAD_REQUEST,
        GenerateResponse::Error { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn generate_videos(
    State(pipeline): State<Arc<Pipeline>>,
    Json(request): Json<GenerateRequest>,
) -> impl IntoResponse {
    let niche = request.niche.unwrap_or_default();
    let response = pipeline.handle_request(&niche).await;
    (status_for(&response), Json(response))
}

async fn index() -> Html<String> {
    let buttons: String = Topic::ALL
        .iter()
        .map(|t| format!("<button onclick=\"generate('{0}')\">{0}</button>\n", t.label()))
        .collect();
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Niche Shorts</title></head>
<body>
<h1>Niche Shorts</h1>
{buttons}<pre id="status"></pre>
<div id="videos"></div>
<script>
async function generate(niche) {{
  const status = document.getElementById('status');
  status.textContent = 'Generating ' + niche + '...';
  const resp = await fetch('/generate-videos', {{
    method: 'POST',
    headers: {{ 'Content-Type': 'application/json' }},
    body: JSON.stringify({{ niche }})
  }});
  const data = await resp.json();
  if (!resp.ok) {{ status.textContent = data.error; return; }}
  status.textContent = '';
  for (const v of data.videos) {{
    document.getElementById('videos').insertAdjacentHTML('beforeend',
      '<h3>' + v.title + ' (' + v.duration + ')</h3><video controls width="640" src="' + v.url + '"></video>');
  }}
}}
</script>
</body>
</html>
"#
    ))
}

/// `/` page, `POST /generate-videos`, and the finished videos under the same URL prefix
/// that `VideoDescriptor::url` reports.
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    let settings = pipeline.settings();
    let prefix = public_url(&settings.output_root, &settings.public_root);
    let videos = ServeDir::new(&settings.output_root);

    let app = Router::new()
        .route("/", get(index))
        .route("/generate-videos", post(generate_videos));
    let app = if prefix == "/" {
        app.fallback_service(videos)
    } else if prefix.split('/').any(|part| part == "..") {
        logw(format!(
            "Output directory {} is outside the public root; videos will not be served",
            settings.output_root.display()
        ));
        app
    } else {
        app.nest_service(&prefix, videos)
    };

    app.layer(TraceLayer::new_for_http()).with_state(pipeline)
}
