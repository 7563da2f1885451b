use replset_harness::ClusterConfig;
use replset_harness::ClusterManager;
use replset_harness::Error;
use replset_harness::Result;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let settings = ClusterConfig::new()?.validate()?;

    // Initializing Logs
    init_observability(&settings);

    let mut cluster = ClusterManager::new(settings)?;
    if let Err(e) = cluster.start().await {
        error!("cluster {} failed to start: {}", cluster.name(), e);
        cluster.stop().await;
        return Err(e);
    }

    println!("{}", cluster.get_hosts().join(","));
    info!("Cluster {} started. Waiting for CTRL+C signal...", cluster.name());

    // Listen on Shutdown Signal
    if let Err(e) = graceful_shutdown().await {
        error!("Failed to listen for shutdown signal: {:?}", e);
    }

    cluster.stop().await;
    println!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| Error::Fatal(format!("Failed to install SIGINT handler: {}", e)))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| Error::Fatal(format!("Failed to install SIGTERM handler: {}", e)))?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }
    Ok(())
}

/// `RUST_LOG` wins; otherwise `info` when verbose, `warn` when quiet.
fn init_observability(settings: &ClusterConfig) {
    let default_level = if settings.verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(settings.use_colors)
        .with_target(false)
        .init();
}
