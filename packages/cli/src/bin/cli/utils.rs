// ABOUTME: Shared helpers for admin subcommands
// ABOUTME: Opens the configured database and builds output tables

use anyhow::Context;
use bookclub_cli::config::Config;
use bookclub_storage::connect;
use bookclub_voting::VotingService;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};

/// Voting service over the configured database, with startup housekeeping applied
pub async fn open_service(config: &Config) -> anyhow::Result<VotingService> {
    let pool = connect(&config.storage())
        .await
        .with_context(|| format!("opening database at {}", config.database_path.display()))?;

    let service = bookclub_cli::build_service(pool, config);
    service.initialize().await?;
    Ok(service)
}

pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}
