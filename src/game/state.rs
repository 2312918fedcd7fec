//! The authoritative per-room state value.
//!
//! `RoomState` is owned exclusively by the room actor; transitions take it
//! by reference and return a replacement. None of these types serialize:
//! the wire view is built by the projector, which is what keeps the host
//! token and drafts off the wire.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::protocol::types::{
    letter_for, AnswerSet, CompletedRound, EndReason, GameConfig, GameStatus, Participant,
    ParticipantId, ParticipantStatus, Submission, MAX_CALLED_NUMBER, MIN_CALLED_NUMBER,
};

/// Seconds between a call and the round opening for input.
pub const COUNTDOWN_SECONDS: i64 = 3;

/// The round currently being played. At most one exists, and only while
/// the game is in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRound {
    pub round_number: u32,
    pub turn_participant_id: ParticipantId,
    pub turn_participant_name: String,
    pub called_number: u8,
    pub active_letter: char,
    pub started_at: DateTime<Utc>,
    pub countdown_ends_at: DateTime<Utc>,
    /// `None` when the end rule is FIRST_SUBMISSION: no deadline is armed.
    pub ends_at: Option<DateTime<Utc>>,
    pub submissions: Vec<Submission>,
    /// Tentative answers, keyed by participant. Never serialized.
    pub drafts: HashMap<ParticipantId, AnswerSet>,
}

impl ActiveRound {
    /// The round accepts input once the countdown has elapsed.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        now >= self.countdown_ends_at
    }

    pub fn has_submitted(&self, participant_id: &str) -> bool {
        self.submissions
            .iter()
            .any(|s| s.participant_id == participant_id)
    }

    /// Freeze this round into its completed form.
    pub fn into_completed(self, ended_at: DateTime<Utc>, end_reason: EndReason) -> CompletedRound {
        CompletedRound {
            round_number: self.round_number,
            turn_participant_id: self.turn_participant_id,
            turn_participant_name: self.turn_participant_name,
            called_number: self.called_number,
            active_letter: self.active_letter,
            started_at: self.started_at,
            countdown_ends_at: self.countdown_ends_at,
            ends_at: self.ends_at,
            submissions: self.submissions,
            ended_at,
            end_reason,
            score_published_at: None,
        }
    }
}

/// Game-level state within a room.
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub status: GameStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub config: GameConfig,
    /// Admitted participants frozen in join order at game start.
    pub turn_order: Vec<ParticipantId>,
    pub current_turn_index: usize,
    pub active_round: Option<ActiveRound>,
    pub completed_rounds: Vec<CompletedRound>,
}

impl Game {
    pub fn new() -> Self {
        Self {
            status: GameStatus::Lobby,
            started_at: None,
            cancelled_at: None,
            finished_at: None,
            config: GameConfig::default(),
            turn_order: Vec::new(),
            current_turn_index: 0,
            active_round: None,
            completed_rounds: Vec::new(),
        }
    }

    pub fn completed_round(&self, round_number: u32) -> Option<&CompletedRound> {
        self.completed_rounds
            .iter()
            .find(|r| r.round_number == round_number)
    }

    pub fn completed_round_mut(&mut self, round_number: u32) -> Option<&mut CompletedRound> {
        self.completed_rounds
            .iter_mut()
            .find(|r| r.round_number == round_number)
    }

    /// Round numbers ended but not yet published, ascending.
    pub fn unpublished_round_numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self
            .completed_rounds
            .iter()
            .filter(|r| !r.is_published())
            .map(|r| r.round_number)
            .collect();
        numbers.sort_unstable();
        numbers
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the server knows about one room.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomState {
    pub code: String,
    pub host_name: String,
    pub max_participants: u8,
    /// Bearer secret for host commands. Compared inside the actor only;
    /// never leaves the process.
    pub host_token: String,
    pub created_at: DateTime<Utc>,
    /// In join order. The host is always first.
    pub participants: Vec<Participant>,
    pub game: Game,
}

impl RoomState {
    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn participant_mut(&mut self, id: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    pub fn admitted_count(&self) -> usize {
        self.participants
            .iter()
            .filter(|p| p.status == ParticipantStatus::Admitted)
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.participants
            .iter()
            .filter(|p| p.status == ParticipantStatus::Pending)
            .count()
    }

    /// Whole rounds each player gets before the 26 letters run out.
    pub fn rounds_per_player(&self) -> u32 {
        let players = self.game.turn_order.len() as u32;
        if players == 0 {
            0
        } else {
            u32::from(MAX_CALLED_NUMBER) / players
        }
    }

    /// The fair-round ceiling: everyone plays the same number of turns.
    pub fn max_fair_rounds(&self) -> u32 {
        self.rounds_per_player() * self.game.turn_order.len() as u32
    }

    /// Numbers already consumed by the active or completed rounds, sorted.
    pub fn used_numbers(&self) -> Vec<u8> {
        let mut used: Vec<u8> = self
            .game
            .completed_rounds
            .iter()
            .map(|r| r.called_number)
            .chain(self.game.active_round.as_ref().map(|r| r.called_number))
            .collect();
        used.sort_unstable();
        used
    }

    /// Numbers still callable, sorted.
    pub fn available_numbers(&self) -> Vec<u8> {
        let used = self.used_numbers();
        (MIN_CALLED_NUMBER..=MAX_CALLED_NUMBER)
            .filter(|n| !used.contains(n))
            .collect()
    }

    /// The participant whose turn it is, if the game is running.
    pub fn current_caller(&self) -> Option<&ParticipantId> {
        if self.game.status != GameStatus::InProgress {
            return None;
        }
        self.game.turn_order.get(self.game.current_turn_index)
    }

    pub fn is_host_token(&self, token: &str) -> bool {
        !token.is_empty() && self.host_token == token
    }
}

/// Build the active round created by a successful call.
pub fn new_active_round(
    round_number: u32,
    caller: &Participant,
    called_number: u8,
    config: &GameConfig,
    now: DateTime<Utc>,
) -> ActiveRound {
    let countdown_ends_at = now + Duration::seconds(COUNTDOWN_SECONDS);
    let ends_at = match config.end_rule {
        crate::protocol::types::EndRule::FirstSubmission => None,
        _ => Some(countdown_ends_at + Duration::seconds(i64::from(config.round_seconds))),
    };
    ActiveRound {
        round_number,
        turn_participant_id: caller.id.clone(),
        turn_participant_name: caller.name.clone(),
        called_number,
        active_letter: letter_for(called_number),
        started_at: now,
        countdown_ends_at,
        ends_at,
        submissions: Vec::new(),
        drafts: HashMap::new(),
    }
}
