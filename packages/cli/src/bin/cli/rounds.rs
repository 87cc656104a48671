use bookclub_cli::config::Config;
use bookclub_core::{RoundStatus, VotingRound};
use bookclub_voting::ranking::ordinal;
use bookclub_voting::VotingService;
use clap::Subcommand;
use colored::*;

use super::utils::{new_table, open_service};

#[derive(Subcommand)]
pub enum RoundCommands {
    /// Show the current round and its winners
    Current,
    /// Close voting on the active round and pick winners
    Finalize {
        /// Admin user ID performing the action
        #[arg(long)]
        admin: String,
    },
    /// Complete the finalized round and open the next one
    Reset {
        /// Admin user ID performing the action
        #[arg(long)]
        admin: String,
    },
    /// List every round, newest first
    History,
}

pub async fn handle_round_command(command: RoundCommands, config: &Config) -> anyhow::Result<()> {
    let service = open_service(config).await?;

    match command {
        RoundCommands::Current => show_current(&service).await,
        RoundCommands::Finalize { admin } => finalize(&service, &admin).await,
        RoundCommands::Reset { admin } => reset(&service, &admin).await,
        RoundCommands::History => history(&service).await,
    }
}

async fn show_current(service: &VotingService) -> anyhow::Result<()> {
    let current = service.current_round().await?;

    let Some(round) = current.round else {
        println!("{}", "No voting round exists yet".yellow());
        return Ok(());
    };

    println!(
        "{} {}",
        format!("Round #{}", round.round_number).blue().bold(),
        status_label(round.status)
    );
    if current.is_active {
        println!("{}", "Voting is open".green());
    } else {
        println!("{}", "Voting is locked".yellow());
    }

    print_winners(service, &round).await
}

async fn finalize(service: &VotingService, admin: &str) -> anyhow::Result<()> {
    let outcome = service.finalize(admin).await?;

    println!(
        "{}",
        format!("Round #{} finalized", outcome.round_number)
            .green()
            .bold()
    );

    let round = service.get_round(outcome.round_number).await?;
    print_winners(service, &round).await?;

    for warning in &outcome.warnings {
        println!("{} {}", "Warning:".yellow().bold(), warning);
    }
    Ok(())
}

async fn reset(service: &VotingService, admin: &str) -> anyhow::Result<()> {
    let outcome = service.reset(admin).await?;

    println!(
        "{}",
        format!("Round #{} is open for voting", outcome.round_number)
            .green()
            .bold()
    );
    Ok(())
}

async fn history(service: &VotingService) -> anyhow::Result<()> {
    let rounds = service.list_rounds().await?;

    if rounds.is_empty() {
        println!("{}", "No voting rounds yet".yellow());
        return Ok(());
    }

    let mut table = new_table(vec!["Round", "Status", "Winners", "Finalized", "Completed"]);
    for round in &rounds {
        table.add_row(vec![
            format!("#{}", round.round_number),
            round.status.to_string(),
            round.winners.len().to_string(),
            round
                .finalized_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "—".to_string()),
            round
                .completed_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "—".to_string()),
        ]);
    }

    println!("{}", table);
    println!("Total: {} rounds", rounds.len().to_string().cyan());
    Ok(())
}

async fn print_winners(service: &VotingService, round: &VotingRound) -> anyhow::Result<()> {
    if round.winners.is_empty() {
        return Ok(());
    }

    let mut table = new_table(vec!["Place", "Book", "Votes", "Meeting"]);
    for winner in &round.winners {
        let title = service
            .get_suggestion(&winner.suggestion_id)
            .await
            .map(|s| s.title)
            .unwrap_or_else(|_| winner.suggestion_id.clone());

        table.add_row(vec![
            ordinal(winner.placement).to_string(),
            title,
            winner.vote_count_snapshot.to_string(),
            winner
                .assigned_meeting_id
                .clone()
                .unwrap_or_else(|| "unassigned".to_string()),
        ]);
    }

    println!("{}", table);
    Ok(())
}

fn status_label(status: RoundStatus) -> ColoredString {
    match status {
        RoundStatus::Active => "active".green(),
        RoundStatus::Finalized => "finalized".yellow(),
        RoundStatus::Completed => "completed".dimmed(),
    }
}
