//! Detection proxy server.
//!
//! ```text
//!   Browser ──POST /api/detect──▶ guard ─▶ rate limit ─▶ validate ─▶ cache ──hit──▶ 200 (cache)
//!                                                                     │
//!                                                                    miss
//!                                                                     ▼
//!                                                              provider call ─▶ cache store ─▶ 200 (provider)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use detection_proxy::config::load_config;
use detection_proxy::observability::{logging, metrics};
use detection_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "detection-proxy")]
#[command(about = "AI-content detection proxy with caching and rate limiting", long_about = None)]
struct Args {
    /// Optional TOML config file; environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is normal in production
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("detection-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_text_chars = config.detection.max_text_chars,
        cache_ttl_secs = config.cache.ttl_secs,
        rate_limit = config.rate_limit.max_requests,
        rate_window_secs = config.rate_limit.window_secs,
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

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
