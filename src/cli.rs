use anyhow::{Context, Result};
use clap::Parser;
use niche_shorts::pipeline::run_for_topic;
use niche_shorts::topic::Topic;
use std::path::PathBuf;

/// Generate one narrated short video for a niche.
#[derive(Parser, Debug)]
#[command(name = "niche-shorts-cli", version, about)]
struct Args {
    /// Niche label, e.g. "horror stories"
    #[arg(short, long, required_unless_present = "list_topics")]
    topic: Option<String>,

    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Print the available niches and exit
    #[arg(long)]
    list_topics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    niche_shorts::init_tracing();
    let args = Args::parse();

    if args.list_topics {
        for label in Topic::labels() {
            println!("{}", label);
        }
        return Ok(());
    }

    let topic = args.topic.unwrap_or_default();
    let response = run_for_topic(&args.config, &topic).await?;
    let json = serde_json::to_string_pretty(&response).context("Failed to encode response")?;
    println!("{}", json);

    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
