// ABOUTME: Domain type definitions for suggestions, voting rounds, and meetings
// ABOUTME: Status enums carry their storage string form and parse back from it

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::validation::ValidationError;

/// Lifecycle of a book suggestion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    Pending,
    Approved,
    CurrentlyReading,
    Rejected,
    Read,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::CurrentlyReading => "currently_reading",
            Self::Rejected => "rejected",
            Self::Read => "read",
        }
    }

    /// Statuses that block the same book from being suggested again
    pub fn blocks_resubmission(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

impl fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuggestionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "currently_reading" => Ok(Self::CurrentlyReading),
            "rejected" => Ok(Self::Rejected),
            "read" => Ok(Self::Read),
            other => Err(ValidationError::InvalidEnum(
                other.to_string(),
                "pending, approved, currently_reading, rejected, read".to_string(),
            )),
        }
    }
}

/// Lifecycle of a voting round: active -> finalized -> completed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Active,
    Finalized,
    Completed,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Finalized => "finalized",
            Self::Completed => "completed",
        }
    }

    /// Active and finalized rounds are "live"; only one may exist at a time
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Active | Self::Finalized)
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "finalized" => Ok(Self::Finalized),
            "completed" => Ok(Self::Completed),
            other => Err(ValidationError::InvalidEnum(
                other.to_string(),
                "active, finalized, completed".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub external_id: Option<String>,
    pub suggested_by: String,
    pub status: SuggestionStatus,
    /// Size of the vote set at read time
    pub vote_count: i64,

    // Written once, by finalization only
    pub placement: Option<u8>,
    pub voting_round_id: Option<String>,
    pub won_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionCreateInput {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoundWinner {
    pub suggestion_id: String,
    pub placement: u8,
    pub vote_count_snapshot: i64,
    pub assigned_meeting_id: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VotingRound {
    pub id: String,
    pub round_number: i64,
    pub status: RoundStatus,
    /// Ordered by placement, empty until finalized
    pub winners: Vec<RoundWinner>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub finalized_by: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A club meeting; the book slot is filled manually or by finalization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub book_suggestion_id: Option<String>,
    pub book_title: Option<String>,
    pub auto_assigned: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingCreateInput {
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
}
