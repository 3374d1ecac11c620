//! Example server wiring an authentication and an authorization gate.
//!
//! ```text
//! auth-gate-example-server --config config/auth-gate.yaml
//! curl -H 'Authorization: Bearer alice-token' http://127.0.0.1:8087/admin
//! ```

mod config;
mod identity;
mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "auth-gate-example-server", version, about)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address from the configuration.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut cfg = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind) = cli.bind {
        cfg.bind_addr = bind;
    }

    let app = routes::build_router(&cfg).context("Invalid gate configuration")?;

    let listener = TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", cfg.bind_addr))?;
    tracing::info!(
        addr = %cfg.bind_addr,
        tokens = cfg.tokens.len(),
        "Auth gate example server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parses_overrides() {
        let cli = match Cli::try_parse_from([
            "auth-gate-example-server",
            "--config",
            "config/auth-gate.yaml",
            "--bind",
            "0.0.0.0:9000",
            "--json-logs",
        ]) {
            Ok(cli) => cli,
            Err(e) => panic!("failed to parse args: {e}"),
        };

        assert_eq!(cli.config, Some(PathBuf::from("config/auth-gate.yaml")));
        assert_eq!(cli.bind.map(|b| b.port()), Some(9000));
        assert!(cli.json_logs);
    }
}
