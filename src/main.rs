//! `cors-proxy` binary: load configuration, bind, serve until signalled.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use cors_proxy::config::{resolve_config, ConfigOverrides, ObservabilityConfig};
use cors_proxy::lifecycle::{self, signals, Shutdown};
use cors_proxy::observability::logging;

/// CORS-anywhere forwarding proxy.
#[derive(Parser, Debug)]
#[command(name = "cors-proxy", version, about, long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "CORS_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Host to listen on.
    #[arg(long, env = "CORS_PROXY_HOST")]
    host: Option<String>,

    /// Port to listen on.
    #[arg(short, long, env = "CORS_PROXY_PORT")]
    port: Option<u16>,

    /// Allowed origins (comma-separated). Empty allows all.
    #[arg(long, env = "CORS_PROXY_ORIGIN_WHITELIST", value_delimiter = ',')]
    origin_whitelist: Option<Vec<String>>,

    /// Headers every request must carry (comma-separated).
    #[arg(long, env = "CORS_PROXY_REQUIRED_HEADERS", value_delimiter = ',')]
    required_headers: Option<Vec<String>>,

    /// Headers stripped in both directions (comma-separated).
    #[arg(long, env = "CORS_PROXY_REMOVED_HEADERS", value_delimiter = ',')]
    removed_headers: Option<Vec<String>>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            origin_whitelist: self.origin_whitelist.clone(),
            required_headers: self.required_headers.clone(),
            removed_headers: self.removed_headers.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(cli.config.as_deref(), cli.overrides()) {
        Ok(config) => config,
        Err(err) => {
            logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %err, "Invalid configuration");
            return ExitCode::from(2);
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("cors-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let prepared = match lifecycle::prepare(config).await {
        Ok(prepared) => prepared,
        Err(err) => {
            tracing::error!(error = %err, "Failed to start listener");
            return ExitCode::from(1);
        }
    };

    tracing::info!(
        address = %prepared.local_addr,
        "Running CORS proxy"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    if let Err(err) = prepared.server.run(prepared.listener, server_shutdown).await {
        tracing::error!(error = %err, "Server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
