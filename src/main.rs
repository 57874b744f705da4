//! uu-relay server entry point.
//!
//! Loads configuration from the environment, binds the listener, and
//! relays until the accept loop fails or the process receives Ctrl-C.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use uu_relay::config::RelayConfig;
use uu_relay::relay::Listener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("RELAY_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config = RelayConfig::from_env().context("loading relay configuration")?;
    tracing::info!(
        addr = %config.listen_addr,
        max_clients = config.max_clients,
        read_buffer_size = config.read_buffer_size,
        "starting uu-relay"
    );

    // Start server
    let listener = Listener::bind(&config)
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %listener.local_addr()?, "server listening");

    // No drain: open connections are dropped with the runtime.
    tokio::select! {
        result = listener.run() => result.context("accept loop failed")?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("waiting for ctrl-c")?;
            tracing::info!("server is going down");
        }
    }

    Ok(())
}
