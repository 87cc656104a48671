use bookclub_cli::config::Config;
use bookclub_core::MeetingCreateInput;
use chrono::NaiveDate;
use clap::Subcommand;
use colored::*;

use super::utils::{new_table, open_service};

#[derive(Subcommand)]
pub enum MeetingsCommands {
    /// List upcoming meetings
    List,
    /// Schedule a meeting
    Add {
        /// Admin user ID performing the action
        #[arg(long)]
        admin: String,
        /// Meeting date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Meeting time, e.g. 19:00
        #[arg(long)]
        time: String,
        #[arg(long)]
        location: String,
    },
}

pub async fn handle_meetings_command(
    command: MeetingsCommands,
    config: &Config,
) -> anyhow::Result<()> {
    let service = open_service(config).await?;

    match command {
        MeetingsCommands::List => {
            let meetings = service.list_upcoming_meetings().await?;
            if meetings.is_empty() {
                println!("{}", "No upcoming meetings".yellow());
                println!(
                    "{}",
                    "Use 'bookclub meetings add' to schedule one".dimmed()
                );
                return Ok(());
            }

            let mut table = new_table(vec!["ID", "Date", "Time", "Location", "Book"]);
            for meeting in &meetings {
                table.add_row(vec![
                    meeting.id.clone(),
                    meeting.date.to_string(),
                    meeting.time.clone(),
                    meeting.location.clone(),
                    meeting.book_title.clone().unwrap_or_else(|| "—".to_string()),
                ]);
            }
            println!("{}", table);
            Ok(())
        }
        MeetingsCommands::Add {
            admin,
            date,
            time,
            location,
        } => {
            let meeting = service
                .create_meeting(
                    &admin,
                    MeetingCreateInput {
                        date,
                        time,
                        location,
                    },
                )
                .await?;

            println!(
                "{} {} on {} at {}",
                "Scheduled".green().bold(),
                meeting.id,
                meeting.date,
                meeting.time
            );
            Ok(())
        }
    }
}
