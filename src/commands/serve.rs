//! HTTP proxy command handler

use crate::config::Config;
use crate::error::Result;
use crate::server;

/// Start the completion proxy server
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `port` - Optional override for the configured port
///
/// # Errors
///
/// Returns an error when no credential can be resolved or the listener
/// cannot bind
pub async fn run_serve(mut config: Config, port: Option<u16>) -> Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    server::run(&config).await
}
