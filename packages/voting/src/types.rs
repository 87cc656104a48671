// ABOUTME: Result types returned by voting operations
// ABOUTME: Serialized as camelCase for the HTTP surface

use bookclub_core::{RoundWinner, Suggestion, VotingRound};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    /// True if the voter's vote is now present
    pub voted: bool,
    pub vote_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeOutcome {
    pub round_number: i64,
    pub winners: Vec<RoundWinner>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResetOutcome {
    pub round_number: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRound {
    pub round: Option<VotingRound>,
    /// True only while the round's status is `active`
    pub is_active: bool,
}

/// Which rule matched, in priority order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Isbn,
    ExternalId,
    TitleAuthor,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::Isbn => write!(f, "isbn"),
            MatchType::ExternalId => write!(f, "external_id"),
            MatchType::TitleAuthor => write!(f, "title_author"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateQuery {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    pub matched_suggestion: Option<Suggestion>,
    pub match_type: Option<MatchType>,
}

impl DuplicateCheck {
    pub fn not_duplicate() -> Self {
        Self {
            is_duplicate: false,
            matched_suggestion: None,
            match_type: None,
        }
    }

    pub fn matched(match_type: MatchType, suggestion: Suggestion) -> Self {
        Self {
            is_duplicate: true,
            matched_suggestion: Some(suggestion),
            match_type: Some(match_type),
        }
    }
}
