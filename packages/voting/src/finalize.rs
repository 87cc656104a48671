// ABOUTME: Finalize transaction: active round -> finalized with winners recorded
// ABOUTME: Round flip, winner rows, suggestion stamps, and meeting assignments commit together or not at all

use bookclub_core::MAX_WINNERS;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{VotingError, VotingResult};
use crate::ranking::{ordinal, plan_finalization};
use crate::types::FinalizeOutcome;
use crate::{meetings, rounds, suggestions};

pub async fn finalize_round(
    pool: &SqlitePool,
    admin_id: &str,
    now: DateTime<Utc>,
) -> VotingResult<FinalizeOutcome> {
    let mut tx = pool.begin().await?;

    // Write lock from here until commit; a second admin blocks here and then finds no active round
    let round = rounds::claim_active_for_finalize(&mut tx, admin_id, now)
        .await?
        .ok_or(VotingError::NoActiveRound)?;

    let candidates = suggestions::pending_candidates(&mut tx).await?;
    if candidates.is_empty() {
        tx.rollback().await?;
        return Err(VotingError::NoCandidates);
    }

    let targets = meetings::eligible_targets(&mut tx, now.date_naive(), MAX_WINNERS).await?;
    let plan = plan_finalization(candidates, &targets);

    let mut winners = Vec::with_capacity(plan.winners.len());
    for planned in &plan.winners {
        let winner = planned.to_round_winner(now);

        rounds::insert_winner(&mut tx, &round.id, &winner).await?;
        suggestions::stamp_winner(
            &mut tx,
            &planned.candidate.suggestion_id,
            planned.placement,
            &round.id,
            now,
        )
        .await?;

        if let Some(meeting) = &planned.meeting {
            meetings::assign_book(
                &mut tx,
                &meeting.id,
                &planned.candidate.suggestion_id,
                &planned.candidate.title,
            )
            .await?;
        }

        winners.push(winner);
    }

    tx.commit().await?;

    for planned in &plan.winners {
        info!(
            "Round #{} {} place: {} ({} votes, meeting: {})",
            round.round_number,
            ordinal(planned.placement),
            planned.candidate.title,
            planned.candidate.vote_count,
            planned
                .meeting
                .as_ref()
                .map(|m| m.date.to_string())
                .unwrap_or_else(|| "unassigned".to_string())
        );
    }
    for warning in &plan.warnings {
        warn!("Round #{}: {}", round.round_number, warning);
    }
    info!("Round #{} finalized by {}", round.round_number, admin_id);

    Ok(FinalizeOutcome {
        round_number: round.round_number,
        winners,
        warnings: plan.warnings,
    })
}
