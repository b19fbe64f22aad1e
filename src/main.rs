use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};

use cloud_log::metrics::start_metrics_server;
use cloud_log::{LogRecord, LoggingContext, Severity, init_logging, load_config};

const GIT_VERSION: &str = git_version::git_version!(
    args = ["--always", "--tags", "--dirty=-modified"],
    fallback = env!("CARGO_PKG_VERSION")
);

/// Relay stdin lines as structured log records
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "cloud-log.yaml", env = "CLOUD_LOG_CONFIG")]
    config: PathBuf,

    /// Severity of every relayed line
    #[arg(short, long, default_value = "info")]
    severity: Severity,

    /// Source location attached to relayed lines
    #[arg(long, default_value = "stdin")]
    source: String,

    /// Treat each line as an RPC method that finished with this status code
    #[arg(long, allow_negative_numbers = true)]
    rpc_code: Option<i32>,
}

async fn relay(context: &LoggingContext, args: &Args) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        match args.rpc_code {
            Some(code) => context.log_rpc_raw(line, code, Duration::ZERO)?,
            None => {
                let record = LogRecord::new(args.severity, line).at(args.source.as_str());
                context.emit(&record)?;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args.config)?;

    let context = LoggingContext::standard(&config.logging)?;
    init_logging(&context)?;

    info!(version = GIT_VERSION, "cloud-log starting");
    debug!("Config: {:?}", config);

    if config.metrics.enabled {
        let metrics = context.metrics().clone();
        let port = config.metrics.port;
        let listen_address = config.metrics.listen_address.clone();
        tokio::spawn(async move {
            if let Err(e) = start_metrics_server(metrics, port, listen_address).await {
                error!("Metrics server failed: {}", e);
            }
        });
    }

    relay(&context, &args).await?;
    context.sync()?;

    Ok(())
}
