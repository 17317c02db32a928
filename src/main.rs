//! Chatling - AI chat assistant CLI
//!
//! Main entry point for the Chatling application.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatling::cli::{Cli, Commands};
use chatling::commands;
use chatling::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config = Config::load(&cli.config, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { resume, model } => {
            if let Some(r) = &resume {
                tracing::debug!("Resuming session: {}", r);
            }
            commands::chat::run_chat(config, resume, model).await?;
            Ok(())
        }
        Commands::Serve { port } => {
            tracing::info!("Starting completion proxy");
            commands::serve::run_serve(config, port).await?;
            Ok(())
        }
        Commands::History { command } => {
            commands::history::handle_history(command, &config)?;
            Ok(())
        }
        Commands::Auth { command } => {
            commands::auth::handle_auth(command, &config)?;
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "chatling=debug" } else { "chatling=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
