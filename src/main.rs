//! code-narrator: code-to-audio narration service.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use code_narrator_rs::config::Config;
use code_narrator_rs::pipeline::Pipeline;
use code_narrator_rs::server::{self, AppState};
use code_narrator_rs::speech::kokoro;

#[derive(Parser, Debug)]
#[command(name = "code-narrator", about = "Code-to-audio narration service")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging (suppress noisy ort internals)
    let filter = if args.verbose {
        EnvFilter::new("debug,ort=info")
    } else {
        EnvFilter::new("info,ort=warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("code-narrator starting");

    let mut config = Config::load(args.config.as_deref());
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if config.remote.enabled && config.remote_token().is_some() {
        info!("Remote documentation backend enabled ({})", config.remote.model);
    } else {
        info!("No API token configured — documentation runs local-only");
    }

    // Warm the neural TTS engine so the first request doesn't pay the load
    // cost. A failed load is fine: the tier reports unavailable and the
    // chain degrades past it.
    if kokoro::get_or_load(&config.kokoro).await.is_none() {
        info!("Neural TTS not loaded — synthesis will use fallback tiers");
    }

    let pipeline = Arc::new(Pipeline::new(&config));
    let state = AppState { pipeline };
    server::serve(state, &config.server.host, config.server.port).await?;

    Ok(())
}
