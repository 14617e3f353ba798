//! hutarka CLI - chat with a remote assistant from the terminal.

use clap::{Parser, Subcommand};
use hutarka::cli;
use hutarka::config::load_config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Get the version string.
///
/// - Release builds (on a git tag): "0.1.0"
/// - Development builds: "0.1.0-dev (abc1234)"
fn version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("HUTARKA_GIT_HASH");
    const IS_RELEASE: &str = env!("HUTARKA_IS_RELEASE");

    static VERSION_STRING: std::sync::OnceLock<String> = std::sync::OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" {
            VERSION.to_string()
        } else {
            format!("{VERSION}-dev ({GIT_HASH})")
        }
    })
}

#[derive(Parser)]
#[command(name = "hutarka")]
#[command(author, version = version(), about = "Chat with the Hutarka assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List conversations, most recent first. The active one is marked with `*`.
    List,

    /// Start a new conversation and print its id.
    New,

    /// Delete a conversation.
    Delete {
        /// Conversation ID.
        id: String,
    },

    /// Show a conversation transcript.
    Show {
        /// Conversation ID. Defaults to the active conversation.
        id: Option<String>,

        /// Print the stored JSON instead of a transcript.
        #[arg(long)]
        json: bool,
    },

    /// Send a message and print the reply.
    Send {
        /// Conversation ID. Defaults to the active conversation.
        #[arg(short, long)]
        chat: Option<String>,

        /// Attach a file (repeatable, 10 MB max each).
        #[arg(short, long = "attach", value_name = "PATH")]
        attach: Vec<PathBuf>,

        /// Message text.
        text: Vec<String>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "hutarka=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match load_config() {
        Ok(config) => match cli.command {
            Commands::List => cli::list::run(&config),
            Commands::New => cli::create::run(&config),
            Commands::Delete { id } => cli::delete::run(&config, &id),
            Commands::Show { id, json } => cli::show::run(&config, id.as_deref(), json),
            Commands::Send { chat, attach, text } => {
                cli::send::run(&config, chat.as_deref(), &attach, &text.join(" ")).await
            }
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("hutarka: error: {e}");
            ExitCode::FAILURE
        }
    }
}
