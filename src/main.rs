mod app;
mod graph;
mod provider;
mod util;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::{KnowledgeGraphApp, Theme};
use crate::provider::{FileProvider, GraphProvider, HttpProvider, MemoryProvider};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the graph API.
    #[arg(long, default_value = "http://localhost:3000")]
    api_url: String,

    /// Read and write the graph as a JSON file instead of calling the API.
    #[arg(long, conflicts_with = "demo")]
    data_file: Option<PathBuf>,

    /// Start from the bundled sample graph held in memory.
    #[arg(long)]
    demo: bool,

    #[arg(long, value_enum, default_value_t = Theme::Dark)]
    theme: Theme,

    /// HTTP request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

fn build_provider(args: &Args) -> anyhow::Result<Arc<dyn GraphProvider>> {
    if args.demo {
        let provider = MemoryProvider::with_sample().context("failed to load the sample graph")?;
        return Ok(Arc::new(provider));
    }
    if let Some(path) = &args.data_file {
        return Ok(Arc::new(FileProvider::new(path.clone())));
    }
    let provider = HttpProvider::new(&args.api_url, Duration::from_secs(args.timeout_secs))
        .with_context(|| format!("failed to set up the API client for {}", args.api_url))?;
    Ok(Arc::new(provider))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("grafo_lens=info")),
        )
        .init();

    let args = Args::parse();
    let provider = build_provider(&args)?;
    info!(source = %provider.describe(), theme = ?args.theme, "starting");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let theme = args.theme;
    eframe::run_native(
        "grafo-lens",
        options,
        Box::new(move |cc| Ok(Box::new(KnowledgeGraphApp::new(cc, provider, theme)))),
    )
    .map_err(|error| anyhow!("failed to run the viewer: {error}"))
}
