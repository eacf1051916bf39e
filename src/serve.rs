use anyhow::{Context, Result};
use clap::Parser;
use niche_shorts::config::Config;
use niche_shorts::init;
use niche_shorts::pipeline::Pipeline;
use niche_shorts::server;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Serve the niche video generator over HTTP.
#[derive(Parser, Debug)]
#[command(name = "niche-shorts-server", version, about)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    niche_shorts::init_tracing();
    let args = Args::parse();

    let config = Config::load_or_default(&args.config).await?;
    init::ensure_directories(&config).await?;
    if !init::check_ffmpeg(&config.ffmpeg_path).await {
        tracing::warn!("FFmpeg not found at {}", config.ffmpeg_path.display());
    }

    let app = server::router(Arc::new(Pipeline::from_config(&config)?));
    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("Failed to bind {}", args.addr))?;
    tracing::info!("Listening on http://{}", args.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("HTTP server failed")?;
    Ok(())
}
