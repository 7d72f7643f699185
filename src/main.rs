//! line-lookup server.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──TCP──▶ net::listener ──queue──▶ net::pool (workers)
//!                                                 │
//!                                                 ▼
//!                                     server::handler
//!                                   ┌────────┴─────────┐
//!                          security::access_control   content
//!                                   └────────┬─────────┘
//!                                            ▼
//!   Client ◀──response── protocol::response   + observability::audit
//! ```

use std::path::PathBuf;

use clap::Parser;

use line_lookup::config::{load_config, LookupConfig};
use line_lookup::lifecycle::{signals, startup};
use line_lookup::observability::logging;

/// TCP service answering whether a string occurs in a file under an allowed root.
#[derive(Parser, Debug)]
#[command(name = "line-lookup")]
#[command(version)]
struct Cli {
    /// Configuration file (key=value lines, or TOML when it ends in .toml).
    #[arg(short, long, default_value = "config.txt")]
    config: PathBuf,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Append audit records as JSON lines to this file.
    #[arg(long)]
    audit_log: Option<PathBuf>,
}

impl Cli {
    fn apply(self, config: &mut LookupConfig) {
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(path) = self.audit_log {
            config.observability.audit_log = Some(path);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config).await?;
    cli.apply(&mut config);

    logging::init_logging(&config.observability.log_level)?;

    tracing::info!("line-lookup v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        root = %config.server.allowed_root_path.display(),
        reread_on_query = config.server.reread_on_query,
        bind_address = %config.listener.bind_address,
        workers = config.listener.workers,
        "Configuration loaded"
    );

    let running = startup::start(config).await?;
    tracing::info!(address = %running.local_addr(), "Listening for connections");

    signals::spawn_signal_listener(running.shutdown_handle());
    running.wait().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
