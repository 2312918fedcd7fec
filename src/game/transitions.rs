//! Pure transitions: `(state, command, now) -> (state', event) | failure`.
//!
//! No I/O and no clock reads happen here; `now` always arrives as an
//! argument, which makes every rule below deterministic and directly
//! testable. A failure leaves the caller's state untouched because each
//! transition works on its own clone and only returns it on success.

use chrono::{DateTime, Utc};

use crate::config::GameLimitsConfig;
use crate::error::RoomError;
use crate::protocol::types::{
    AnswerPatch, AnswerSet, CompletedRound, EndReason, EndRule, GameConfigInput, GameStatus,
    ManualEndPolicy, MarkSet, Participant, ParticipantId, ParticipantStatus, Review, Reviewer,
    ANSWER_FIELDS, HOST_PARTICIPANT_ID, MAX_CALLED_NUMBER, MIN_CALLED_NUMBER,
};
use crate::protocol::validation::{
    names_collide, normalise_answer, validate_max_participants, validate_participant_name,
};

use super::scoring::recompute_round_scores;
use super::state::{new_active_round, Game, RoomState};

/// What the actor must broadcast after an accepted command, minus the
/// snapshot (the actor projects that from the new state).
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    JoinRequest { participant: Participant },
    AdmissionUpdate { participant: Participant },
    GameStarted,
    TurnCalled,
    SubmissionReceived { participant_id: ParticipantId },
    RoundEnded {
        reason: EndReason,
        completed_round: CompletedRound,
    },
    SubmissionScored {
        participant_id: ParticipantId,
        round_number: u32,
    },
    RoundScoresPublished { round_number: u32 },
    RoundScoresDiscarded { round_number: u32 },
    GameCancelled,
    GameEnded,
}

/// A successful transition: the replacement state plus the broadcast, if
/// the command produces one (draft updates do not).
#[derive(Debug, Clone)]
pub struct Outcome {
    pub state: RoomState,
    pub event: Option<EventKind>,
}

pub type TransitionResult = Result<Outcome, RoomError>;

fn ok(state: RoomState, event: EventKind) -> TransitionResult {
    Ok(Outcome {
        state,
        event: Some(event),
    })
}

fn require_host(state: &RoomState, token: &str) -> Result<(), RoomError> {
    if state.is_host_token(token) {
        Ok(())
    } else {
        Err(RoomError::unauthorised("invalid host token"))
    }
}

fn require_in_progress(state: &RoomState) -> Result<(), RoomError> {
    if state.game.status == GameStatus::InProgress {
        Ok(())
    } else {
        Err(RoomError::conflict("game is not in progress"))
    }
}

/// Initialise a brand-new room in LOBBY with the host admitted.
pub fn create_room(
    code: String,
    host_name_raw: &str,
    max_participants: u8,
    host_token: String,
    now: DateTime<Utc>,
    limits: &GameLimitsConfig,
) -> Result<RoomState, RoomError> {
    let host_name = validate_participant_name(host_name_raw, limits)?;
    validate_max_participants(max_participants, limits)?;

    let host = Participant {
        id: HOST_PARTICIPANT_ID.to_string(),
        name: host_name.clone(),
        status: ParticipantStatus::Admitted,
        is_host: true,
        created_at: now,
        updated_at: now,
    };

    Ok(RoomState {
        code,
        host_name,
        max_participants,
        host_token,
        created_at: now,
        participants: vec![host],
        game: Game::new(),
    })
}

/// A newcomer asks to join. Valid only while the lobby is open; the
/// participant enters PENDING and waits for host review.
pub fn submit_join(
    state: &RoomState,
    raw_name: &str,
    request_id: ParticipantId,
    now: DateTime<Utc>,
    limits: &GameLimitsConfig,
) -> TransitionResult {
    if state.game.status != GameStatus::Lobby {
        return Err(RoomError::gone("room is no longer accepting join requests"));
    }

    let name = validate_participant_name(raw_name, limits)?;
    if state.participants.iter().any(|p| names_collide(&p.name, &name)) {
        return Err(RoomError::conflict("that name is already taken"));
    }
    if state.admitted_count() >= state.max_participants as usize {
        return Err(RoomError::conflict("room is full"));
    }

    let participant = Participant {
        id: request_id,
        name,
        status: ParticipantStatus::Pending,
        is_host: false,
        created_at: now,
        updated_at: now,
    };

    let mut next = state.clone();
    next.participants.push(participant.clone());
    ok(next, EventKind::JoinRequest { participant })
}

/// Host approves or rejects a pending join request.
pub fn review_join(
    state: &RoomState,
    host_token: &str,
    request_id: &str,
    approve: bool,
    now: DateTime<Utc>,
) -> TransitionResult {
    require_host(state, host_token)?;
    if state.game.status != GameStatus::Lobby {
        return Err(RoomError::conflict("admissions are only reviewed in the lobby"));
    }

    let target = state
        .participant(request_id)
        .ok_or_else(|| RoomError::not_found("unknown join request"))?;
    if target.status != ParticipantStatus::Pending {
        return Err(RoomError::conflict("join request was already reviewed"));
    }
    if approve && state.admitted_count() >= state.max_participants as usize {
        return Err(RoomError::conflict("room is full"));
    }

    let mut next = state.clone();
    let participant = {
        // Presence was checked above; re-borrow mutably on the clone.
        let Some(p) = next.participant_mut(request_id) else {
            return Err(RoomError::not_found("unknown join request"));
        };
        p.status = if approve {
            ParticipantStatus::Admitted
        } else {
            ParticipantStatus::Rejected
        };
        p.updated_at = now;
        p.clone()
    };
    ok(next, EventKind::AdmissionUpdate { participant })
}

/// Freeze the lobby into a running game: drop everyone not admitted,
/// fix the turn order, and lock the config.
pub fn start_game(
    state: &RoomState,
    host_token: &str,
    config: Option<GameConfigInput>,
    now: DateTime<Utc>,
    limits: &GameLimitsConfig,
) -> TransitionResult {
    require_host(state, host_token)?;
    if state.game.status != GameStatus::Lobby {
        return Err(RoomError::conflict("game has already started"));
    }
    if state.pending_count() > 0 {
        return Err(RoomError::conflict(
            "all join requests must be reviewed before starting",
        ));
    }
    if state.admitted_count() < 2 {
        return Err(RoomError::conflict("at least 2 admitted players are required"));
    }

    let config = config.unwrap_or_default().resolve();
    config.validate(limits)?;

    let mut next = state.clone();
    next.participants
        .retain(|p| p.status == ParticipantStatus::Admitted);
    next.game.turn_order = next.participants.iter().map(|p| p.id.clone()).collect();
    next.game.current_turn_index = 0;
    next.game.config = config;
    next.game.status = GameStatus::InProgress;
    next.game.started_at = Some(now);

    if next.max_fair_rounds() < 1 {
        return Err(RoomError::conflict("too many players for a fair game"));
    }

    ok(next, EventKind::GameStarted)
}

/// The caller picks a number, starting a round after a 3-second countdown.
pub fn call_number(
    state: &RoomState,
    participant_id: &str,
    number: u8,
    now: DateTime<Utc>,
) -> TransitionResult {
    require_in_progress(state)?;

    let caller = state
        .participant(participant_id)
        .ok_or_else(|| RoomError::not_found("unknown participant"))?;
    if !caller.is_admitted() {
        return Err(RoomError::forbidden("only admitted players may call"));
    }
    if state.current_caller().map(String::as_str) != Some(participant_id) {
        return Err(RoomError::forbidden("it is not your turn to call"));
    }
    if state.game.active_round.is_some() {
        return Err(RoomError::conflict("a round is already in progress"));
    }
    if !state.game.unpublished_round_numbers().is_empty() {
        return Err(RoomError::conflict(
            "previous round scores must be published or discarded first",
        ));
    }
    if !(MIN_CALLED_NUMBER..=MAX_CALLED_NUMBER).contains(&number) {
        return Err(RoomError::bad_request(format!(
            "number must be between {MIN_CALLED_NUMBER} and {MAX_CALLED_NUMBER}"
        )));
    }
    if state.used_numbers().contains(&number) {
        return Err(RoomError::conflict("that number was already called"));
    }
    if state.game.completed_rounds.len() as u32 >= state.max_fair_rounds() {
        return Err(RoomError::conflict("maximum fair rounds reached"));
    }

    let round_number = state.game.completed_rounds.len() as u32 + 1;
    let caller = caller.clone();
    let mut next = state.clone();
    next.game.active_round = Some(new_active_round(
        round_number,
        &caller,
        number,
        &next.game.config,
        now,
    ));
    ok(next, EventKind::TurnCalled)
}

fn merge_patch(base: &mut AnswerSet, patch: &AnswerPatch, limits: &GameLimitsConfig) {
    for field in ANSWER_FIELDS {
        if let Some(raw) = patch.field(field) {
            base.set_field(field, normalise_answer(raw, limits));
        }
    }
}

/// Gate shared by drafts and submissions: the round must exist, be past
/// its countdown, and the participant must not have submitted yet.
fn require_open_round<'a>(
    state: &'a RoomState,
    participant_id: &str,
    now: DateTime<Utc>,
) -> Result<&'a super::state::ActiveRound, RoomError> {
    require_in_progress(state)?;
    let participant = state
        .participant(participant_id)
        .ok_or_else(|| RoomError::not_found("unknown participant"))?;
    if !participant.is_admitted() {
        return Err(RoomError::forbidden("only admitted players may answer"));
    }
    let round = state
        .game
        .active_round
        .as_ref()
        .ok_or_else(|| RoomError::conflict("no round is in progress"))?;
    if !round.is_open(now) {
        return Err(RoomError::conflict("inputs are locked during the countdown"));
    }
    if round.has_submitted(participant_id) {
        return Err(RoomError::conflict("answers were already submitted"));
    }
    Ok(round)
}

/// Save tentative answers. Drafts are private, produce no broadcast, and
/// back the forced submission if the round ends without a real one.
pub fn update_draft(
    state: &RoomState,
    participant_id: &str,
    patch: &AnswerPatch,
    now: DateTime<Utc>,
    limits: &GameLimitsConfig,
) -> TransitionResult {
    require_open_round(state, participant_id, now)?;

    let mut next = state.clone();
    if let Some(round) = next.game.active_round.as_mut() {
        let draft = round
            .drafts
            .entry(participant_id.to_string())
            .or_default();
        merge_patch(draft, patch, limits);
    }
    Ok(Outcome {
        state: next,
        event: None,
    })
}

/// Submit final answers, overlaying the input onto any saved draft. Under
/// FIRST_SUBMISSION or WHICHEVER_FIRST this also closes the round.
pub fn submit_answers(
    state: &RoomState,
    participant_id: &str,
    patch: &AnswerPatch,
    now: DateTime<Utc>,
    limits: &GameLimitsConfig,
) -> TransitionResult {
    require_open_round(state, participant_id, now)?;

    let participant_name = state
        .participant(participant_id)
        .map(|p| p.name.clone())
        .unwrap_or_default();

    let mut next = state.clone();
    let Some(round) = next.game.active_round.as_mut() else {
        return Err(RoomError::conflict("no round is in progress"));
    };

    let mut answers = round.drafts.remove(participant_id).unwrap_or_default();
    merge_patch(&mut answers, patch, limits);
    round.submissions.push(crate::protocol::types::Submission {
        participant_id: participant_id.to_string(),
        participant_name,
        answers,
        submitted_at: now,
        review: None,
    });

    let ends_on_first = matches!(
        next.game.config.end_rule,
        EndRule::FirstSubmission | EndRule::WhicheverFirst
    );
    if ends_on_first {
        let Some(completed) = close_round(&mut next, EndReason::FirstSubmission, now) else {
            return Err(RoomError::conflict("no round is in progress"));
        };
        return ok(
            next,
            EventKind::RoundEnded {
                reason: EndReason::FirstSubmission,
                completed_round: completed,
            },
        );
    }

    ok(
        next,
        EventKind::SubmissionReceived {
            participant_id: participant_id.to_string(),
        },
    )
}

/// End the active round before its natural close, subject to the game's
/// manual-end policy.
pub fn end_round_early(
    state: &RoomState,
    participant_id: &str,
    now: DateTime<Utc>,
) -> TransitionResult {
    require_in_progress(state)?;
    let participant = state
        .participant(participant_id)
        .ok_or_else(|| RoomError::not_found("unknown participant"))?;
    if !participant.is_admitted() {
        return Err(RoomError::forbidden("only admitted players may end a round"));
    }
    let round = state
        .game
        .active_round
        .as_ref()
        .ok_or_else(|| RoomError::conflict("no round is in progress"))?;

    let is_caller = round.turn_participant_id == participant_id;
    let allowed = match state.game.config.manual_end_policy {
        ManualEndPolicy::HostOrCaller => participant.is_host || is_caller,
        ManualEndPolicy::CallerOnly | ManualEndPolicy::CallerOrTimer => is_caller,
        ManualEndPolicy::None => false,
    };
    if !allowed {
        return Err(RoomError::forbidden(
            "you are not allowed to end this round early",
        ));
    }

    let mut next = state.clone();
    let Some(completed) = close_round(&mut next, EndReason::ManualEnd, now) else {
        return Err(RoomError::conflict("no round is in progress"));
    };
    ok(
        next,
        EventKind::RoundEnded {
            reason: EndReason::ManualEnd,
            completed_round: completed,
        },
    )
}

/// Deadline callback. Acts only if the active round's deadline has truly
/// passed; anything else (state moved on, round already closed) is
/// reported as a failure for the scheduler to drop silently.
pub fn timer_expired(state: &RoomState, now: DateTime<Utc>) -> TransitionResult {
    if state.game.status != GameStatus::InProgress {
        return Err(RoomError::conflict("game is not in progress"));
    }
    let Some(round) = state.game.active_round.as_ref() else {
        return Err(RoomError::conflict("no round is in progress"));
    };
    let Some(ends_at) = round.ends_at else {
        return Err(RoomError::conflict("round has no deadline"));
    };
    if ends_at > now {
        return Err(RoomError::conflict("round deadline has not passed"));
    }

    let mut next = state.clone();
    let Some(completed) = close_round(&mut next, EndReason::Timer, now) else {
        return Err(RoomError::conflict("no round is in progress"));
    };
    ok(
        next,
        EventKind::RoundEnded {
            reason: EndReason::Timer,
            completed_round: completed,
        },
    )
}

/// Close the active round: force-submit everyone missing (draft or empty
/// answers), append the completed round, and rotate the turn. Returns
/// `None` when no round is active.
fn close_round(
    state: &mut RoomState,
    reason: EndReason,
    now: DateTime<Utc>,
) -> Option<CompletedRound> {
    let mut round = state.game.active_round.take()?;

    let missing: Vec<ParticipantId> = state
        .game
        .turn_order
        .iter()
        .filter(|id| !round.has_submitted(id))
        .cloned()
        .collect();
    for id in missing {
        let answers = round.drafts.remove(&id).unwrap_or_default();
        let name = state
            .participant(&id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        round.submissions.push(crate::protocol::types::Submission {
            participant_id: id,
            participant_name: name,
            answers,
            submitted_at: now,
            review: None,
        });
    }

    let completed = round.into_completed(now, reason);
    state.game.completed_rounds.push(completed.clone());
    if !state.game.turn_order.is_empty() {
        state.game.current_turn_index =
            (state.game.current_turn_index + 1) % state.game.turn_order.len();
    }
    Some(completed)
}

/// Host marks one submission; every score in the round is recomputed so
/// SHARED_10 shares stay consistent.
pub fn score_submission(
    state: &RoomState,
    host_token: &str,
    round_number: u32,
    participant_id: &str,
    marks: MarkSet,
    now: DateTime<Utc>,
    limits: &GameLimitsConfig,
) -> TransitionResult {
    require_host(state, host_token)?;

    let round = state
        .game
        .completed_round(round_number)
        .ok_or_else(|| RoomError::not_found("unknown round"))?;
    if round.is_published() {
        return Err(RoomError::conflict("round scores are already final"));
    }
    if round.submission(participant_id).is_none() {
        return Err(RoomError::not_found("no submission for that participant"));
    }

    let host_name = state.host_name.clone();
    let scoring_mode = state.game.config.scoring_mode;
    let mut next = state.clone();
    if let Some(round) = next.game.completed_round_mut(round_number) {
        if let Some(submission) = round
            .submissions
            .iter_mut()
            .find(|s| s.participant_id == participant_id)
        {
            submission.review = Some(Review {
                marks,
                scores: crate::protocol::types::FieldScores::default(),
                marked_by: Reviewer {
                    id: HOST_PARTICIPANT_ID.to_string(),
                    name: host_name,
                },
                marked_at: now,
            });
        }
        recompute_round_scores(round, scoring_mode, limits);
    }

    ok(
        next,
        EventKind::SubmissionScored {
            participant_id: participant_id.to_string(),
            round_number,
        },
    )
}

/// Publish a fully reviewed round, making it count toward the leaderboard
/// and freezing it forever.
pub fn publish_round(
    state: &RoomState,
    host_token: &str,
    round_number: u32,
    now: DateTime<Utc>,
) -> TransitionResult {
    require_host(state, host_token)?;

    let round = state
        .game
        .completed_round(round_number)
        .ok_or_else(|| RoomError::not_found("unknown round"))?;
    if round.is_published() {
        return Err(RoomError::conflict("round scores are already final"));
    }
    if !round.is_fully_reviewed() {
        return Err(RoomError::conflict(
            "every submission must be reviewed before publishing",
        ));
    }

    let mut next = state.clone();
    if let Some(round) = next.game.completed_round_mut(round_number) {
        round.score_published_at = Some(now);
    }
    ok(next, EventKind::RoundScoresPublished { round_number })
}

/// Finalise a round with zero contribution: reviews are cleared and the
/// round is stamped published so it can never be re-scored.
pub fn discard_round(
    state: &RoomState,
    host_token: &str,
    round_number: u32,
    now: DateTime<Utc>,
) -> TransitionResult {
    require_host(state, host_token)?;

    let round = state
        .game
        .completed_round(round_number)
        .ok_or_else(|| RoomError::not_found("unknown round"))?;
    if round.is_published() {
        return Err(RoomError::conflict("round scores are already final"));
    }

    let mut next = state.clone();
    if let Some(round) = next.game.completed_round_mut(round_number) {
        for submission in &mut round.submissions {
            submission.review = None;
        }
        round.score_published_at = Some(now);
    }
    ok(next, EventKind::RoundScoresDiscarded { round_number })
}

/// Abort the game from the lobby or mid-game.
pub fn cancel_game(state: &RoomState, host_token: &str, now: DateTime<Utc>) -> TransitionResult {
    require_host(state, host_token)?;
    if !matches!(
        state.game.status,
        GameStatus::Lobby | GameStatus::InProgress
    ) {
        return Err(RoomError::conflict("game is already over"));
    }

    let mut next = state.clone();
    next.game.active_round = None;
    next.game.status = GameStatus::Cancelled;
    next.game.cancelled_at = Some(now);
    ok(next, EventKind::GameCancelled)
}

/// Finish the game: fully reviewed rounds auto-publish, partially
/// reviewed ones stay unpublished, and the state becomes terminal.
pub fn end_game(state: &RoomState, host_token: &str, now: DateTime<Utc>) -> TransitionResult {
    require_host(state, host_token)?;
    if state.game.status != GameStatus::InProgress {
        return Err(RoomError::conflict("game is not in progress"));
    }

    let mut next = state.clone();
    next.game.active_round = None;
    for round in &mut next.game.completed_rounds {
        if !round.is_published() && round.is_fully_reviewed() {
            round.score_published_at = Some(now);
        }
    }
    next.game.status = GameStatus::Finished;
    next.game.finished_at = Some(now);
    ok(next, EventKind::GameEnded)
}
