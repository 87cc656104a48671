// ABOUTME: Deterministic winner ranking and meeting assignment
// ABOUTME: Pure planning step; the finalize transaction persists whatever plan this produces

use bookclub_core::{Meeting, RoundWinner, MAX_WINNERS};
use chrono::{DateTime, Utc};
use std::cmp::{Ordering, Reverse};

/// A pending suggestion as seen by the finalizer's snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub suggestion_id: String,
    pub title: String,
    pub vote_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedWinner {
    pub candidate: Candidate,
    pub placement: u8,
    pub meeting: Option<Meeting>,
}

impl PlannedWinner {
    pub fn to_round_winner(&self, assigned_at: DateTime<Utc>) -> RoundWinner {
        RoundWinner {
            suggestion_id: self.candidate.suggestion_id.clone(),
            placement: self.placement,
            vote_count_snapshot: self.candidate.vote_count,
            assigned_meeting_id: self.meeting.as_ref().map(|m| m.id.clone()),
            assigned_at: self.meeting.as_ref().map(|_| assigned_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FinalizationPlan {
    pub winners: Vec<PlannedWinner>,
    pub warnings: Vec<String>,
}

/// Most votes first; on a tie the earlier suggestion wins. The id only breaks
/// exact timestamp ties so the order is total.
pub fn standing_order(
    a_votes: i64,
    a_created: &DateTime<Utc>,
    a_id: &str,
    b_votes: i64,
    b_created: &DateTime<Utc>,
    b_id: &str,
) -> Ordering {
    (Reverse(a_votes), a_created, a_id).cmp(&(Reverse(b_votes), b_created, b_id))
}

pub fn rank_candidates(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        standing_order(
            a.vote_count,
            &a.created_at,
            &a.suggestion_id,
            b.vote_count,
            &b.created_at,
            &b.suggestion_id,
        )
    });
    candidates
}

/// Pick the top candidates and pair the i-th winner with the i-th earliest meeting.
/// Winners beyond the available meetings keep their placement and get a warning.
pub fn plan_finalization(candidates: Vec<Candidate>, meetings: &[Meeting]) -> FinalizationPlan {
    let mut targets: Vec<&Meeting> = meetings.iter().filter(|m| !m.auto_assigned).collect();
    targets.sort_by(|a, b| (a.date, &a.time, &a.id).cmp(&(b.date, &b.time, &b.id)));

    let mut plan = FinalizationPlan::default();

    for (index, candidate) in rank_candidates(candidates)
        .into_iter()
        .take(MAX_WINNERS)
        .enumerate()
    {
        let placement = (index + 1) as u8;
        let meeting = targets.get(index).map(|m| (*m).clone());

        if meeting.is_none() {
            plan.warnings.push(format!(
                "No upcoming meeting available for {} place winner \"{}\"; assign it manually",
                ordinal(placement),
                candidate.title
            ));
        }

        plan.winners.push(PlannedWinner {
            candidate,
            placement,
            meeting,
        });
    }

    plan
}

pub fn ordinal(placement: u8) -> &'static str {
    match placement {
        1 => "1st",
        2 => "2nd",
        3 => "3rd",
        _ => "nth",
    }
}
