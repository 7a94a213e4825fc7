mod config;
mod http;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dispatcher_core::impls::JsonFileSnapshotStore;
use dispatcher_core::{DispatcherBuilder, ReaperLoop};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DispatcherConfig;

#[derive(Parser, Debug)]
#[command(name = "pattern-dispatcher")]
#[command(about = "Hands out task patterns to polling workers", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "dispatcher.yaml")]
    config: PathBuf,

    /// Listen address, e.g. 0.0.0.0:80
    #[arg(long)]
    bind: Option<String>,

    /// Task snapshot file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Civil offset for timestamps, e.g. +08:00
    #[arg(long)]
    utc_offset: Option<String>,

    /// Seconds a claim may stay Processing before it is reclaimed
    #[arg(long)]
    stale_timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = if args.config.exists() {
        DispatcherConfig::from_file(&args.config)?
    } else {
        tracing::warn!(path = %args.config.display(), "config file not found, using defaults");
        DispatcherConfig::default()
    };

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(snapshot) = args.snapshot {
        config.storage.snapshot_path = snapshot;
    }
    if let Some(offset) = args.utc_offset {
        config.time.utc_offset = offset;
    }
    if let Some(timeout) = args.stale_timeout_secs {
        config.reclaim.timeout_secs = timeout;
    }
    config.validate()?;

    tracing::info!(?config, "starting dispatcher");

    let dispatcher = DispatcherBuilder::new()
        .snapshot_store(Arc::new(JsonFileSnapshotStore::new(
            config.storage.snapshot_path.clone(),
        )))
        .utc_offset(config.time.utc_offset.clone())
        .build()
        .await?;
    let dispatcher = Arc::new(dispatcher);

    let reaper = ReaperLoop::spawn(dispatcher.clone(), config.reclaim_policy());

    let app = http::router(dispatcher);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(addr = %config.server.bind, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    reaper.shutdown_and_join().await;
    tracing::info!("dispatcher stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
