use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use nzbdrop::api::{AppState, create_router};
use nzbdrop::config::Config;

#[derive(Debug, Parser)]
#[command(about = "Search NZBGeek and queue downloads in SABnzbd")]
struct Cli {
    /// Address to listen on (overrides BIND_ADDR)
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Directory with the web UI to serve (overrides STATIC_DIR)
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if cli.static_dir.is_some() {
        config.static_dir = cli.static_dir;
    }

    tracing::info!(
        sabcmd = %config.sabcmd_path.display(),
        policy = %config.failure_policy,
        max_concurrent = config.sabcmd_max_concurrent,
        "sabcmd configured"
    );

    let state = AppState::from_config(&config).context("Failed to build indexer client")?;
    let app = create_router(state, config.static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
