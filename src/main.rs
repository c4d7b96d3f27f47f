mod cli;
mod server;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use memoir::config::MemoirConfig;

#[derive(Parser)]
#[command(name = "memoir", version, about = "Journal with sentiment, reflections and mood insights")]
struct Cli {
    /// Whose journal to use (defaults to storage.default_user)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// Transport: stdio or http (defaults to server.transport)
        #[arg(long)]
        transport: Option<String>,
    },
    /// Write a journal entry (reads stdin when TEXT is omitted)
    Write { text: Option<String> },
    /// List entries, newest first
    Entries {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Mood distribution, streak, trend, recurring tags and mood timeline
    Insights {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Seal or open a note to your future self
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },
    /// Export the journal as JSON to stdout
    Export,
    /// Run database diagnostics
    Doctor,
    /// Delete all journal data
    Reset,
    /// Manage the ONNX models
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum NoteAction {
    /// Seal a note that unlocks after DAYS days
    Seal {
        #[arg(long)]
        days: u32,
        #[arg(long, conflicts_with = "generate")]
        text: Option<String>,
        /// Build the note from your journal so far
        #[arg(long, requires = "name")]
        generate: bool,
        #[arg(long)]
        name: Option<String>,
    },
    /// Open your note, if it has unlocked
    Open,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding and sentiment models
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = MemoirConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC and JSON output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let user = config.user_or_default(cli.user.as_deref()).to_string();

    match cli.command {
        Command::Serve { transport } => {
            let transport = transport.unwrap_or_else(|| config.server.transport.clone());
            match transport.as_str() {
                "stdio" => server::serve_stdio(config).await?,
                "http" => server::serve_http(config).await?,
                other => anyhow::bail!("unknown transport: {other}. Supported: stdio, http"),
            }
        }
        Command::Write { text } => cli::write::write(&config, &user, text).await?,
        Command::Entries { limit } => cli::entries::entries(&config, &user, limit)?,
        Command::Insights { json } => cli::insights::insights(&config, &user, json)?,
        Command::Note { action } => match action {
            NoteAction::Seal {
                days,
                text,
                generate,
                name,
            } => {
                let content = if generate {
                    cli::note::NoteContent::Generated {
                        name: name.unwrap_or_default(),
                    }
                } else {
                    match text {
                        Some(text) => cli::note::NoteContent::Text(text),
                        None => anyhow::bail!("pass --text or --generate --name NAME"),
                    }
                };
                cli::note::seal(&config, &user, days, content)?;
            }
            NoteAction::Open => cli::note::open(&config, &user)?,
        },
        Command::Export => cli::export::export(&config, &user)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
        Command::Reset => cli::reset::reset(&config)?,
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config).await?,
        },
    }

    Ok(())
}
