//! Derives the client-visible snapshot from the internal room state.
//!
//! The projection is the only path from state to wire, which is what
//! guarantees the host token and per-participant drafts never leave the
//! actor.

use std::cmp::Ordering;

use crate::game::state::RoomState;
use crate::protocol::snapshot::{
    ActiveRoundView, GameSnapshot, LeaderboardEntry, ParticipantCounts, RoomMeta, RoomSnapshot,
    RoundHistoryEntry, ScoringSummary, SubmissionStub,
};
use crate::protocol::types::ParticipantStatus;

use super::scoring::round2;

/// Build the full snapshot for the current state.
pub fn project(state: &RoomState) -> RoomSnapshot {
    let counts = ParticipantCounts {
        admitted: count_status(state, ParticipantStatus::Admitted),
        pending: count_status(state, ParticipantStatus::Pending),
        rejected: count_status(state, ParticipantStatus::Rejected),
    };

    let current_turn_participant_id = state.current_caller().cloned();

    let active_round = state.game.active_round.as_ref().map(|round| ActiveRoundView {
        round_number: round.round_number,
        turn_participant_id: round.turn_participant_id.clone(),
        turn_participant_name: round.turn_participant_name.clone(),
        called_number: round.called_number,
        active_letter: round.active_letter,
        started_at: round.started_at,
        countdown_ends_at: round.countdown_ends_at,
        ends_at: round.ends_at,
        submissions: round
            .submissions
            .iter()
            .map(|s| SubmissionStub {
                participant_id: s.participant_id.clone(),
                participant_name: s.participant_name.clone(),
                submitted_at: s.submitted_at,
            })
            .collect(),
    });

    RoomSnapshot {
        meta: RoomMeta {
            room_code: state.code.clone(),
            host_name: state.host_name.clone(),
            max_participants: state.max_participants,
        },
        participants: state.participants.clone(),
        counts,
        game: GameSnapshot {
            status: state.game.status,
            started_at: state.game.started_at,
            cancelled_at: state.game.cancelled_at,
            finished_at: state.game.finished_at,
            config: state.game.config.clone(),
            turn_order: state.game.turn_order.clone(),
            current_turn_index: state.game.current_turn_index,
            current_turn_participant_id,
            active_round,
            completed_rounds: state.game.completed_rounds.clone(),
            scoring: scoring_summary(state),
        },
    }
}

fn count_status(state: &RoomState, status: ParticipantStatus) -> usize {
    state
        .participants
        .iter()
        .filter(|p| p.status == status)
        .count()
}

fn scoring_summary(state: &RoomState) -> ScoringSummary {
    let rounds_played = state.game.completed_rounds.len() as u32;
    let published_rounds = state
        .game
        .completed_rounds
        .iter()
        .filter(|r| r.is_published())
        .count() as u32;
    let max_rounds = state.max_fair_rounds();

    ScoringSummary {
        rounds_per_player: state.rounds_per_player(),
        max_rounds,
        rounds_played,
        published_rounds,
        pending_publication_rounds: state.game.unpublished_round_numbers(),
        used_numbers: state.used_numbers(),
        available_numbers: state.available_numbers(),
        is_complete: max_rounds > 0 && rounds_played >= max_rounds,
        leaderboard: leaderboard(state),
    }
}

/// Walk published rounds in round order per admitted participant,
/// accumulating scores. Sorted by total descending, name ascending.
fn leaderboard(state: &RoomState) -> Vec<LeaderboardEntry> {
    let mut published: Vec<_> = state
        .game
        .completed_rounds
        .iter()
        .filter(|r| r.is_published())
        .collect();
    published.sort_unstable_by_key(|r| r.round_number);

    let mut entries: Vec<LeaderboardEntry> = state
        .participants
        .iter()
        .filter(|p| p.status == ParticipantStatus::Admitted)
        .map(|participant| {
            let mut cumulative = 0.0;
            let history: Vec<RoundHistoryEntry> = published
                .iter()
                .map(|round| {
                    let review = round
                        .submission(&participant.id)
                        .and_then(|s| s.review.as_ref());
                    let score = review.map_or(0.0, |r| r.scores.total);
                    cumulative = round2(cumulative + score);
                    RoundHistoryEntry {
                        round_number: round.round_number,
                        called_number: round.called_number,
                        active_letter: round.active_letter,
                        score,
                        cumulative_score: cumulative,
                        reviewed: review.is_some(),
                    }
                })
                .collect();
            LeaderboardEntry {
                participant_id: participant.id.clone(),
                participant_name: participant.name.clone(),
                total_score: cumulative,
                history,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.participant_name.cmp(&b.participant_name))
    });
    entries
}
