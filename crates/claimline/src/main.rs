//! Claimline service binary.

use anyhow::Context;
use clap::Parser;
use claimline_config::{ClaimlineConfig, load_config, load_config_from_path};
use claimline_core::Orchestrator;
use claimline_protocol::EventSink;
use claimline_server::EventRouter;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "claimline", about = "UK civil litigation chat assistant service")]
struct Cli {
    /// Path to a claimline.json5 config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the listen address from config.
    #[arg(long)]
    address: Option<String>,

    /// Override the listen port from config.
    #[arg(long)]
    port: Option<u16>,

    /// Disable session persistence for this run.
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    claimline::init_logging();
    let cli = Cli::parse();

    let mut config = load(&cli)?;
    if let Some(address) = cli.address {
        config.server.address = address;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.ephemeral {
        config.sessions.enabled = false;
    }

    let router = Arc::new(EventRouter::new());
    let sink: Arc<dyn EventSink> = router.clone();
    let orchestrator = Arc::new(
        Orchestrator::new(config.clone(), None, None, None, Some(sink))
            .context("failed to initialize orchestrator")?,
    );

    info!("claimline starting (model={})", config.llm.model);
    claimline_server::serve(config, orchestrator, router).await
}

fn load(cli: &Cli) -> anyhow::Result<ClaimlineConfig> {
    match &cli.config {
        Some(path) => load_config_from_path(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => load_config().context("failed to load config"),
    }
}
