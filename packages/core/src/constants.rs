use std::env;
use std::path::PathBuf;

use bookclub_config::constants::HOME;

/// Number of winners picked when a round is finalized
pub const MAX_WINNERS: usize = 3;

/// Round number reserved for winners imported from before rounds existed
pub const LEGACY_ROUND_NUMBER: i64 = 0;

/// First round number handed out by the registry
pub const FIRST_ROUND_NUMBER: i64 = 1;

// ID prefixes
pub const SUGGESTION_ID_PREFIX: &str = "sug";
pub const ROUND_ID_PREFIX: &str = "round";
pub const MEETING_ID_PREFIX: &str = "mtg";

/// Get the path to the Bookclub directory (~/.bookclub)
pub fn bookclub_dir() -> PathBuf {
    // First try HOME environment variable (useful for tests)
    if let Ok(home) = env::var(HOME) {
        PathBuf::from(home).join(".bookclub")
    } else {
        dirs::home_dir()
            .unwrap_or_else(env::temp_dir)
            .join(".bookclub")
    }
}

/// Get the path to the default database file (~/.bookclub/bookclub.db)
pub fn database_file() -> PathBuf {
    bookclub_dir().join("bookclub.db")
}
