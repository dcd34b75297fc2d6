//! Entry point for the carousel binary
//!
//! Loads a slide deck, renders it through the HTTP render service and stores
//! the finished carousel in a directory or a webhook.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use url::Url;

use render_orchestrator::{
    config::{ENV_API_TOKEN, ENV_ENDPOINT},
    services::{HttpRenderClient, JsonFilePersistence, TokioSleeper, WebhookPersistence},
    CancellationFlag, CarouselPersistence, OrchestratorConfig, RenderJobOrchestrator,
};
use shared::{logging, SlideDeck};

/// Render a slide deck into a carousel, one slide at a time
#[derive(Parser)]
#[command(name = "carousel")]
#[command(about = "Renders a slide deck into a carousel against a single-concurrency render service")]
pub struct Args {
    /// Slide deck JSON file: {"title", "style", "slides": [{"ordinal", "payload", "dimensions"}]}
    #[arg(long)]
    pub deck: PathBuf,

    /// Render service endpoint (falls back to RENDER_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Directory for the finished carousel JSON
    #[arg(long, default_value = "output", conflicts_with = "webhook_url")]
    pub output_dir: PathBuf,

    /// Forward the finished carousel to this URL instead of writing a file
    #[arg(long)]
    pub webhook_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    logging::init_tracing(Some(&args.log_level));

    let config = OrchestratorConfig::from_env().context("Invalid render configuration")?;

    let deck_json = tokio::fs::read_to_string(&args.deck)
        .await
        .with_context(|| format!("Failed to read slide deck {}", args.deck.display()))?;
    let deck = SlideDeck::from_json(&deck_json)
        .with_context(|| format!("Failed to parse slide deck {}", args.deck.display()))?;

    let endpoint = args
        .endpoint
        .clone()
        .or_else(|| std::env::var(ENV_ENDPOINT).ok())
        .with_context(|| format!("No render endpoint: pass --endpoint or set {}", ENV_ENDPOINT))?;
    let endpoint = Url::parse(&endpoint).with_context(|| format!("Invalid render endpoint '{}'", endpoint))?;

    let mut client = HttpRenderClient::new(endpoint, config.render_timeout)?;
    if let Ok(token) = std::env::var(ENV_API_TOKEN) {
        client = client.with_api_token(token);
    }

    let persistence: Box<dyn CarouselPersistence> = match &args.webhook_url {
        Some(url) => {
            let url = Url::parse(url).with_context(|| format!("Invalid webhook url '{}'", url))?;
            info!("Finished carousels will be forwarded to {}", url);
            Box::new(WebhookPersistence::new(url))
        }
        None => {
            info!("Finished carousels will be written to {}", args.output_dir.display());
            Box::new(JsonFilePersistence::new(&args.output_dir))
        }
    };

    let orchestrator = RenderJobOrchestrator::new(&config, client, persistence, Arc::new(TokioSleeper::new()))?;

    let cancel = CancellationFlag::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current attempt");
            interrupt.cancel();
        }
    });

    let (slides, options) = deck.into_parts();
    match orchestrator.submit_with_cancellation(slides, options, &cancel).await {
        Ok(run) => {
            println!("{}", run.to_json_pretty()?);
            Ok(())
        }
        Err(err) => {
            error!("Carousel failed: {}", err);
            if let Some(run) = err.run() {
                println!("{}", run.to_json_pretty()?);
            }
            let recovered = err.recovered_urls();
            if !recovered.is_empty() {
                eprintln!("Recovered slide URLs:");
                for url in recovered {
                    eprintln!("  {}", url);
                }
            }
            std::process::exit(1);
        }
    }
}
