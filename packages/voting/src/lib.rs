// ABOUTME: Voting-round lifecycle and winner finalization for Bookclub
// ABOUTME: Vote ledger, duplicate detection, round registry, and the finalize/reset transactions

pub mod access;
pub mod duplicates;
pub mod error;
pub mod finalize;
pub mod ledger;
pub mod legacy;
pub mod meetings;
pub mod ranking;
pub mod reset;
pub mod rounds;
pub mod service;
pub mod suggestions;
pub mod types;

// Re-export main types
pub use access::{MemberDirectory, NoRateLimit, StaticMemberDirectory, VoteRateLimiter};
pub use duplicates::DuplicateDetector;
pub use error::{VotingError, VotingResult};
pub use meetings::MeetingStorage;
pub use rounds::RoundStorage;
pub use service::VotingService;
pub use suggestions::SuggestionStorage;
pub use types::{
    CurrentRound, DuplicateCheck, DuplicateQuery, FinalizeOutcome, MatchType, ResetOutcome,
    VoteOutcome,
};
