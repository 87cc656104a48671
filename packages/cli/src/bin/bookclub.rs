use bookclub_cli::config::Config;
use clap::{Parser, Subcommand};
use colored::*;
use std::process;

mod cli;

use cli::meetings::MeetingsCommands;
use cli::rounds::RoundCommands;

#[derive(Parser)]
#[command(name = "bookclub")]
#[command(about = "Bookclub - suggest books, vote, and pick what to read next")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override BOOKCLUB_API_PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Inspect and advance voting rounds
    #[command(subcommand)]
    Round(RoundCommands),
    /// Manage meetings
    #[command(subcommand)]
    Meetings(MeetingsCommands),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    bookclub_cli::init_tracing();

    let cli = Cli::parse();

    if let Err(e) = handle_command(cli.command).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;

    match command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            bookclub_cli::run_server(config).await
        }
        Commands::Round(round_cmd) => cli::rounds::handle_round_command(round_cmd, &config).await,
        Commands::Meetings(meetings_cmd) => {
            cli::meetings::handle_meetings_command(meetings_cmd, &config).await
        }
    }
}
