// ABOUTME: Core types, constants, and validation for Bookclub
// ABOUTME: Foundational package shared by the storage, voting, and CLI packages

pub mod constants;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export main types
pub use types::{
    Meeting, MeetingCreateInput, RoundStatus, RoundWinner, Suggestion, SuggestionCreateInput,
    SuggestionStatus, VotingRound,
};

// Re-export constants
pub use constants::{bookclub_dir, database_file, MAX_WINNERS};

// Re-export utilities
pub use utils::generate_id;

// Re-export validation
pub use validation::{match_key, normalize_isbn, validate_suggestion_input, ValidationError};
