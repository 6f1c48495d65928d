//! Command line interface.
//!
//! `serve` runs the API. `calc` and `chat` work offline against the local
//! pricing tables. `account` and `estimates` talk to a running API.

mod account;
mod calc;
mod chat;
mod estimates;
mod output;

use std::sync::Arc;

use clap::{Parser, Subcommand};

pub use account::{AccountCommand, run_account_command};
pub use calc::{CalcCommand, run_calc_command};
pub use chat::run_chat_command;
pub use estimates::{EstimateCommand, run_estimate_command};

use crate::client::{ApiClient, FileKeyValueStore, SessionManager};
use crate::config::Config;
use crate::pricing::PricingResolver;
use crate::server::ApiServer;

#[derive(Parser, Debug)]
#[command(name = "sitecost", version, about = "Construction cost estimation")]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "SITECOST_LOG_JSON")]
    pub json_logs: bool,

    /// API base URL for account and estimate commands
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the REST API server
    Serve {
        /// Interface to bind (overrides SITECOST_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides SITECOST_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run a calculator locally
    #[command(subcommand)]
    Calc(CalcCommand),

    /// Ask the assistant a question (interactive when no text is given)
    Chat {
        /// The question
        text: Vec<String>,

        /// Answer immediately instead of simulating typing
        #[arg(long)]
        no_delay: bool,
    },

    /// Register, log in and manage the saved session
    #[command(subcommand)]
    Account(AccountCommand),

    /// Manage saved estimates
    #[command(subcommand)]
    Estimates(EstimateCommand),

    /// List known states, or the cities of one state
    Regions {
        state: Option<String>,
    },
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    if let Some(url) = cli.api_url {
        config.client.api_url = url;
    }

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            ApiServer::start(&config)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))
        }
        Command::Calc(cmd) => run_calc_command(cmd, &config).await,
        Command::Chat { text, no_delay } => run_chat_command(&text.join(" "), no_delay).await,
        Command::Account(cmd) => run_account_command(cmd, &api_client(&config)).await,
        Command::Estimates(cmd) => run_estimate_command(cmd, api_client(&config)).await,
        Command::Regions { state } => show_regions(&config, state.as_deref()),
    }
}

/// A client whose session persists in the user's config directory.
pub(crate) fn api_client(config: &Config) -> ApiClient {
    let store = FileKeyValueStore::default();
    tracing::debug!("Using session file {}", store.path().display());
    ApiClient::new(
        config.client.api_url.clone(),
        SessionManager::new(Arc::new(store)),
    )
}

fn show_regions(config: &Config, state: Option<&str>) -> anyhow::Result<()> {
    let resolver = PricingResolver::new(Arc::new(config.load_pricing()?));
    match state {
        Some(state) => {
            let cities = resolver
                .cities(state)
                .ok_or_else(|| anyhow::anyhow!("Unknown region: {}", state))?;
            println!("Cities in {}:", state);
            for city in cities {
                println!("  {}", city);
            }
        }
        None => {
            println!("States:");
            for state in resolver.states() {
                println!("  {}", state);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_flags() {
        let cli = Cli::try_parse_from(["sitecost", "serve", "--port", "8080"]).unwrap();
        match cli.command {
            Command::Serve { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_chat_words() {
        let cli = Cli::try_parse_from(["sitecost", "chat", "--no-delay", "how", "long?"]).unwrap();
        match cli.command {
            Command::Chat { text, no_delay } => {
                assert!(no_delay);
                assert_eq!(text.join(" "), "how long?");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
