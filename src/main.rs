use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use cdn_proxy::config::{load_config, ProxyConfig};
use cdn_proxy::http::HttpServer;
use cdn_proxy::lifecycle::{spawn_signal_listener, Shutdown};
use cdn_proxy::observability::{init_logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "cdn-proxy", version, about = "Caching reverse proxy for static assets")]
struct Cli {
    /// Path to the TOML (or legacy JSON) configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Config comes first so its log level applies.
    let (config, missing) = if cli.config.exists() {
        (load_config(&cli.config)?, false)
    } else {
        (ProxyConfig::default(), true)
    };

    let logs = init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "cdn-proxy starting");
    if missing {
        tracing::warn!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rules = config.proxies.len(),
        cache_enabled = config.cache.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, logs).await?;

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    server.run(listener, signal).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
