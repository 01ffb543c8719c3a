//! liveconn
//!
//! Dials a TCP endpoint, wraps it in a [`ManagedConnection`] and reports whether the
//! connection stays usable, without consuming any data the peer sends.
//!
//! ```text
//! liveconn 127.0.0.1:9090 --count 0 --interval-ms 500
//! 1   127.0.0.1:9090  idle      pending=0
//! 2   127.0.0.1:9090  readable  pending=1
//! 3   127.0.0.1:9090  buffered  pending=1
//! 4   127.0.0.1:9090  closed    pending=1
//! ```
//!
//! Exit status: 0 if the connection stayed open, 1 if it closed, 2 on setup errors.

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use thiserror::Error;

use liveconn::config::{load_config, validate_config, ConfigError, LivenessConfig};
use liveconn::net::{Connection, ManagedConnection};
use liveconn::observability::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "liveconn")]
#[command(about = "Probe a TCP connection for liveness without consuming data", long_about = None)]
struct Cli {
    /// Endpoint to dial (host:port). Overrides `dial.address` from the config file.
    address: Option<String>,

    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Probe timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Delay between probes in milliseconds.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Number of probes; 0 keeps probing until the connection closes.
    #[arg(short = 'n', long)]
    count: Option<u64>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no address given; pass one as an argument or set dial.address")]
    MissingAddress,

    #[error("failed to resolve {address}: {source}")]
    Resolve { address: String, source: io::Error },

    #[error("{0} did not resolve to any socket address")]
    Unresolved(String),

    #[error("failed to connect to {address}: {source}")]
    Dial { address: SocketAddr, source: io::Error },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("liveconn: {}", e);
            return ExitCode::from(2);
        }
    };

    init_logging(&config.observability.log_level);

    match run(&config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(error = %e, "liveconn failed");
            eprintln!("liveconn: {}", e);
            ExitCode::from(2)
        }
    }
}

/// Load the config file (or defaults) and apply command line overrides.
fn resolve_config(cli: &Cli) -> Result<LivenessConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => LivenessConfig::default(),
    };

    if let Some(address) = &cli.address {
        config.dial.address = address.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.probe.timeout_ms = timeout_ms;
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.watch.interval_ms = interval_ms;
    }
    if let Some(count) = cli.count {
        config.watch.count = count;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    if config.dial.address.is_empty() {
        return Err(CliError::MissingAddress);
    }
    Ok(config)
}

fn resolve_address(address: &str) -> Result<SocketAddr, CliError> {
    address
        .to_socket_addrs()
        .map_err(|source| CliError::Resolve {
            address: address.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| CliError::Unresolved(address.to_string()))
}

/// Probe until the configured count is reached or the connection closes.
///
/// Returns whether the connection was still open at the end.
fn run(config: &LivenessConfig) -> Result<bool, CliError> {
    let address = resolve_address(&config.dial.address)?;

    let mut conn = ManagedConnection::from_result(TcpStream::connect_timeout(
        &address,
        config.dial.connect_timeout(),
    ))
    .map_err(|source| CliError::Dial { address, source })?
    .with_config(&config.probe);

    tracing::info!(
        address = %address,
        probe_timeout_ms = config.probe.timeout_ms,
        count = config.watch.count,
        "Connected"
    );

    let mut round: u64 = 0;
    let open = loop {
        round += 1;
        let outcome = conn.probe();
        println!(
            "{}\t{}\t{:<9}\tpending={}",
            round,
            address,
            outcome,
            conn.pending_len()
        );

        if !outcome.is_alive() {
            break false;
        }
        if config.watch.count != 0 && round >= config.watch.count {
            break true;
        }
        thread::sleep(config.watch.interval());
    };

    if let Err(e) = conn.close() {
        tracing::debug!(error = %e, "Close after probing failed");
    }
    tracing::info!(address = %address, open, rounds = round, "Done");
    Ok(open)
}
