//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod analyze;
pub mod chat;
pub mod settings;

#[cfg(test)]
mod tests;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::analyze::{run_analyze, AnalyzeOptions};
use crate::cli::chat::{run_chat, ChatOptions};
use crate::core::config::data::{Backend, Config};
use crate::core::credentials::CredentialStore;
use crate::utils::logging::init_tracing;

#[derive(Parser)]
#[command(name = "tracelens")]
#[command(about = "Analyse access-trace PDFs and chat with a hosted model")]
#[command(
    long_about = "tracelens uploads access-trace PDFs to an analysis gateway (or extracts them \
locally and calls a chat-completions API directly), streams the answers, and renders them as \
an HTML report.\n\n\
Authentication:\n\
  The chat-completions key is read from TRACELENS_API_KEY, then from the system keyring.\n\
  Use 'tracelens auth set' to store it, 'tracelens api-key set' to update the gateway's key.\n\n\
Environment Variables:\n\
  TRACELENS_API_KEY   API key for the chat-completions API\n\
  TRACELENS_LOG       Diagnostic filter, e.g. 'debug' or 'tracelens=trace' (default: warn)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Model for chat sessions and direct analyses
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Append the chat transcript to the specified file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse one or more PDF files
    Analyze {
        /// PDF files, processed in the order given
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
        /// Question sent along with every file
        #[arg(short = 'i', long)]
        instruction: Option<String>,
        /// Where to send the files: gateway or direct
        #[arg(short = 'b', long)]
        backend: Option<Backend>,
        /// Write a standalone HTML report to this file
        #[arg(long, value_name = "OUT")]
        html: Option<PathBuf>,
        /// Skip date, badge and keyword highlighting in the report
        #[arg(long)]
        plain: bool,
    },
    /// Chat with the model; reads prompts from stdin when none is given
    Chat {
        /// One-shot prompt (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
        /// System prompt for this session
        #[arg(short = 's', long)]
        system: Option<String>,
        /// Write the transcript as HTML to this file when the session ends
        #[arg(long, value_name = "OUT")]
        html: Option<PathBuf>,
        /// Skip highlighting in the HTML transcript
        #[arg(long)]
        plain: bool,
    },
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Show the configuration file location and every value
    Config,
    /// Manage the locally stored chat-completions key
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Show or update the key held by the analysis gateway
    ApiKey {
        #[command(subcommand)]
        command: ApiKeyCommands,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store a key in the system keyring (prompts when omitted)
    Set { key: Option<String> },
    /// Remove the stored key
    Clear,
    /// Show which key would be used
    Status,
}

#[derive(Subcommand)]
pub enum ApiKeyCommands {
    /// Print the gateway's masked key
    Show,
    /// Replace the gateway's key
    Set { key: String },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    match args.command {
        Commands::Analyze {
            files,
            instruction,
            backend,
            html,
            plain,
        } => {
            run_analyze(AnalyzeOptions {
                files,
                instruction,
                backend,
                model: args.model,
                html,
                plain,
            })
            .await
        }
        Commands::Chat {
            prompt,
            system,
            html,
            plain,
        } => {
            run_chat(ChatOptions {
                prompt,
                system,
                model: args.model,
                html,
                plain,
                log: args.log,
            })
            .await
        }
        Commands::Set { key, value } => {
            if value.is_empty() {
                settings::show_config()?;
                return Ok(());
            }
            match settings::set_config_value(&key, &value.join(" ")) {
                Ok(message) => println!("✅ {message}"),
                Err(e) => {
                    eprintln!("❌ {e}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Commands::Unset { key } => {
            match settings::unset_config_value(&key) {
                Ok(message) => println!("✅ {message}"),
                Err(e) => {
                    eprintln!("❌ {e}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Commands::Config => settings::show_config(),
        Commands::Auth { command } => {
            let store = CredentialStore::new();
            let result = match command {
                AuthCommands::Set { key } => {
                    let key = match key {
                        Some(key) => key,
                        None => settings::prompt_for_key()?,
                    };
                    settings::store_key(&store, &key)
                }
                AuthCommands::Clear => settings::clear_key(&store),
                AuthCommands::Status => Ok(settings::key_status(&store)),
            };
            match result {
                Ok(message) => println!("{message}"),
                Err(e) => {
                    eprintln!("❌ {e}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Commands::ApiKey { command } => {
            let gateway_url = Config::load()?.gateway_url().to_string();
            let client = reqwest::Client::new();
            let result = match command {
                ApiKeyCommands::Show => settings::show_gateway_key(&client, &gateway_url).await,
                ApiKeyCommands::Set { key } => {
                    settings::set_gateway_key(&client, &gateway_url, &key).await
                }
            };
            match result {
                Ok(message) => println!("{message}"),
                Err(e) => {
                    eprintln!("❌ {e}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
    }
}
