//! inspector: an intercepting reverse proxy.
//!
//! Intercepts HTTP(s) requests between your apps and remote servers, logs
//! each request and the respective response, and helps debug that pesky
//! IdP integration or some other misbehaving server.
//!
//! # Architecture Overview
//!
//! ```text
//! --proxy frontend=backend mapping
//!     -> routing (validate URLs, group by port, one scheme per port)
//!     -> lifecycle (one server per port, started concurrently)
//!     -> http (dump request, strip prefix, dispatch, capture response)
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inspector::config::{load_config, CaConfig, ProxyConfig, TlsConfig};
use inspector::lifecycle::{wait_for_interrupt, ServerSet};
use inspector::routing::RouteTable;

#[derive(Parser)]
#[command(
    name = "inspector",
    about = "Intercepting reverse proxy to inspect requests and responses",
    long_about = "Inspector can intercept HTTP(s) requests from your apps \
between one another and to remote servers, log them and the respective \
responses.\n\n\
Example:\n\n  \
inspector --proxy http://some-alias.local/=https://example.com/ \\\n    \
--proxy http://my-port.local:8080/=http://custom-port.com:9090/"
)]
struct Cli {
    /// Frontend pattern and backend target, as FRONTEND=BACKEND (repeatable).
    #[arg(long = "proxy", value_name = "FRONTEND=BACKEND", value_parser = parse_mapping)]
    proxy: Vec<(String, String)>,

    /// Optional TOML configuration file; --proxy flags override its entries.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Certificate file (PEM) for TLS listeners (accepted, not yet used).
    #[arg(long, value_name = "FILE", requires = "key")]
    cert: Option<PathBuf>,

    /// Private key file (PEM) for TLS listeners (accepted, not yet used).
    #[arg(long, value_name = "FILE", requires = "cert")]
    key: Option<PathBuf>,

    /// CA certificate for certificate generation (accepted, not yet used).
    #[arg(long, value_name = "FILE", requires = "cakey")]
    cacert: Option<PathBuf>,

    /// CA private key for certificate generation (accepted, not yet used).
    #[arg(long, value_name = "FILE", requires = "cacert")]
    cakey: Option<PathBuf>,
}

fn parse_mapping(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(f, b)| (f.to_string(), b.to_string()))
        .ok_or_else(|| format!("expected FRONTEND=BACKEND, got {s:?}"))
}

fn build_config(cli: Cli) -> Result<ProxyConfig, inspector::config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    config.proxy.extend(cli.proxy);

    if let (Some(cert_path), Some(key_path)) = (cli.cert, cli.key) {
        config.tls = Some(TlsConfig { cert_path, key_path });
    }
    if let (Some(cert_path), Some(key_path)) = (cli.cacert, cli.cakey) {
        config.ca = Some(CaConfig { cert_path, key_path });
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inspector=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = build_config(Cli::parse())?;

    if config.tls.is_some() {
        tracing::warn!("--cert/--key accepted but tls termination is not implemented yet");
    }
    if config.ca.is_some() {
        tracing::warn!("--cacert/--cakey accepted but certificate generation is not implemented yet");
    }

    tracing::info!(entries = config.proxy.len(), "configuration loaded");

    let table = RouteTable::build(&config.proxy)?;
    if table.groups.is_empty() {
        tracing::warn!("no usable proxy entries, nothing to serve");
    }

    let grace = Duration::from_secs(config.shutdown_grace_secs);
    let servers = ServerSet::start(table, grace).await?;
    tracing::info!(servers = servers.len(), "startup complete");

    wait_for_interrupt().await?;
    servers.shutdown().await;
    tracing::info!("shutdown complete");

    Ok(())
}
