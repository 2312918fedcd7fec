//! Room actor: an isolated task that owns one room's state.
//!
//! All mutating commands and the round deadline share one FIFO queue, so
//! every transition observes a settled state and subscribers see events
//! in the exact order they were produced. The actor holds at most one
//! armed deadline (the active round's `ends_at`), rearmed after every
//! accepted command and harmless if it fires late.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::config::Config;
use crate::error::RoomError;
use crate::game::projector::project;
use crate::game::state::RoomState;
use crate::game::transitions::{self, EventKind, Outcome, TransitionResult};
use crate::protocol::events::RoomEvent;
use crate::protocol::room_codes::generate_participant_id;
use crate::protocol::snapshot::RoomSnapshot;
use crate::protocol::types::{
    AnswerPatch, GameConfigInput, GameStatus, MarkSet, Participant, ParticipantId,
    ParticipantStatus,
};

use super::hub::{SubscriberHub, SubscriberId, Subscription};

/// Commands queued per room; the deadline tick shares this queue.
const COMMAND_BUFFER: usize = 64;

type Reply<T> = oneshot::Sender<Result<T, RoomError>>;

/// Accepted join request, echoed back to the joining client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinAccepted {
    pub request_id: ParticipantId,
    pub participant: Participant,
    pub status: ParticipantStatus,
}

/// Room facts the registry sweep needs to decide on destruction.
#[derive(Debug, Clone, Copy)]
pub struct RoomInspection {
    pub status: GameStatus,
    pub subscriber_count: usize,
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    SubmitJoin {
        name: String,
        reply: Reply<JoinAccepted>,
    },
    ReviewJoin {
        host_token: String,
        request_id: ParticipantId,
        approve: bool,
        reply: Reply<RoomSnapshot>,
    },
    StartGame {
        host_token: String,
        config: Option<GameConfigInput>,
        reply: Reply<RoomSnapshot>,
    },
    CallNumber {
        participant_id: ParticipantId,
        number: u8,
        reply: Reply<RoomSnapshot>,
    },
    UpdateDraft {
        participant_id: ParticipantId,
        answers: AnswerPatch,
        reply: Reply<()>,
    },
    SubmitAnswers {
        participant_id: ParticipantId,
        answers: AnswerPatch,
        reply: Reply<RoomSnapshot>,
    },
    EndRoundEarly {
        participant_id: ParticipantId,
        reply: Reply<RoomSnapshot>,
    },
    ScoreSubmission {
        host_token: String,
        round_number: u32,
        participant_id: ParticipantId,
        marks: MarkSet,
        reply: Reply<RoomSnapshot>,
    },
    PublishRound {
        host_token: String,
        round_number: u32,
        reply: Reply<RoomSnapshot>,
    },
    DiscardRound {
        host_token: String,
        round_number: u32,
        reply: Reply<RoomSnapshot>,
    },
    CancelGame {
        host_token: String,
        reply: Reply<RoomSnapshot>,
    },
    EndGame {
        host_token: String,
        reply: Reply<RoomSnapshot>,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
    Subscribe {
        reply: oneshot::Sender<Subscription>,
    },
    Unsubscribe {
        subscriber_id: SubscriberId,
    },
    Inspect {
        reply: oneshot::Sender<RoomInspection>,
    },
    /// Internal: the armed deadline fired.
    TimerExpired,
    Shutdown,
}

/// Handle to a running room actor; cheap to clone.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    code: String,
    sender: mpsc::Sender<RoomCommand>,
}

fn room_closed() -> RoomError {
    RoomError::not_found("room is no longer available")
}

impl RoomHandle {
    pub fn code(&self) -> &str {
        &self.code
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| room_closed())?;
        rx.await.map_err(|_| room_closed())?
    }

    pub async fn submit_join(&self, name: String) -> Result<JoinAccepted, RoomError> {
        self.request(|reply| RoomCommand::SubmitJoin { name, reply })
            .await
    }

    pub async fn review_join(
        &self,
        host_token: String,
        request_id: ParticipantId,
        approve: bool,
    ) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::ReviewJoin {
            host_token,
            request_id,
            approve,
            reply,
        })
        .await
    }

    pub async fn start_game(
        &self,
        host_token: String,
        config: Option<GameConfigInput>,
    ) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::StartGame {
            host_token,
            config,
            reply,
        })
        .await
    }

    pub async fn call_number(
        &self,
        participant_id: ParticipantId,
        number: u8,
    ) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::CallNumber {
            participant_id,
            number,
            reply,
        })
        .await
    }

    pub async fn update_draft(
        &self,
        participant_id: ParticipantId,
        answers: AnswerPatch,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::UpdateDraft {
            participant_id,
            answers,
            reply,
        })
        .await
    }

    pub async fn submit_answers(
        &self,
        participant_id: ParticipantId,
        answers: AnswerPatch,
    ) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::SubmitAnswers {
            participant_id,
            answers,
            reply,
        })
        .await
    }

    pub async fn end_round_early(
        &self,
        participant_id: ParticipantId,
    ) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::EndRoundEarly {
            participant_id,
            reply,
        })
        .await
    }

    pub async fn score_submission(
        &self,
        host_token: String,
        round_number: u32,
        participant_id: ParticipantId,
        marks: MarkSet,
    ) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::ScoreSubmission {
            host_token,
            round_number,
            participant_id,
            marks,
            reply,
        })
        .await
    }

    pub async fn publish_round(
        &self,
        host_token: String,
        round_number: u32,
    ) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::PublishRound {
            host_token,
            round_number,
            reply,
        })
        .await
    }

    pub async fn discard_round(
        &self,
        host_token: String,
        round_number: u32,
    ) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::DiscardRound {
            host_token,
            round_number,
            reply,
        })
        .await
    }

    pub async fn cancel_game(&self, host_token: String) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::CancelGame { host_token, reply })
            .await
    }

    pub async fn end_game(&self, host_token: String) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::EndGame { host_token, reply })
            .await
    }

    /// Read-only projection of the current state.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply: tx })
            .await
            .map_err(|_| room_closed())?;
        rx.await.map_err(|_| room_closed())
    }

    /// Open a push stream. The first two frames are `connected` and the
    /// current `snapshot`.
    pub async fn subscribe(&self) -> Result<Subscription, RoomError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Subscribe { reply: tx })
            .await
            .map_err(|_| room_closed())?;
        rx.await.map_err(|_| room_closed())
    }

    /// Close a push stream. Fire-and-forget.
    pub async fn unsubscribe(&self, subscriber_id: SubscriberId) {
        let _ = self
            .sender
            .send(RoomCommand::Unsubscribe { subscriber_id })
            .await;
    }

    pub(crate) async fn inspect(&self) -> Result<RoomInspection, RoomError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Inspect { reply: tx })
            .await
            .map_err(|_| room_closed())?;
        rx.await.map_err(|_| room_closed())
    }

    pub(crate) async fn shutdown(&self) {
        let _ = self.sender.send(RoomCommand::Shutdown).await;
    }
}

/// The actor itself. Runs inside its own task until shut down.
struct RoomActor {
    config: Arc<Config>,
    state: RoomState,
    hub: SubscriberHub,
    receiver: mpsc::Receiver<RoomCommand>,
    deadline: Option<Instant>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room_code = %self.state.code, "room actor started");

        loop {
            let command = match self.deadline {
                Some(instant) => tokio::select! {
                    cmd = self.receiver.recv() => match cmd {
                        Some(cmd) => cmd,
                        None => break,
                    },
                    () = tokio::time::sleep_until(instant) => RoomCommand::TimerExpired,
                },
                None => match self.receiver.recv().await {
                    Some(cmd) => cmd,
                    None => break,
                },
            };

            if matches!(command, RoomCommand::Shutdown) {
                break;
            }
            self.handle(command);
        }

        tracing::info!(room_code = %self.state.code, "room actor stopped");
    }

    fn handle(&mut self, command: RoomCommand) {
        let now = Utc::now();
        let limits = self.config.game.clone();

        match command {
            RoomCommand::SubmitJoin { name, reply } => {
                let request_id = generate_participant_id();
                let result = transitions::submit_join(
                    &self.state,
                    &name,
                    request_id.clone(),
                    now,
                    &limits,
                );
                let result = self.apply(result).and_then(|_| {
                    self.state
                        .participant(&request_id)
                        .cloned()
                        .map(|participant| JoinAccepted {
                            request_id: request_id.clone(),
                            status: participant.status,
                            participant,
                        })
                        .ok_or_else(|| RoomError::not_found("unknown join request"))
                });
                let _ = reply.send(result);
            }
            RoomCommand::ReviewJoin {
                host_token,
                request_id,
                approve,
                reply,
            } => {
                let result =
                    transitions::review_join(&self.state, &host_token, &request_id, approve, now);
                let _ = reply.send(self.apply(result));
            }
            RoomCommand::StartGame {
                host_token,
                config,
                reply,
            } => {
                let result =
                    transitions::start_game(&self.state, &host_token, config, now, &limits);
                let _ = reply.send(self.apply(result));
            }
            RoomCommand::CallNumber {
                participant_id,
                number,
                reply,
            } => {
                let result = transitions::call_number(&self.state, &participant_id, number, now);
                let _ = reply.send(self.apply(result));
            }
            RoomCommand::UpdateDraft {
                participant_id,
                answers,
                reply,
            } => {
                let result =
                    transitions::update_draft(&self.state, &participant_id, &answers, now, &limits);
                let _ = reply.send(self.apply(result).map(|_| ()));
            }
            RoomCommand::SubmitAnswers {
                participant_id,
                answers,
                reply,
            } => {
                let result = transitions::submit_answers(
                    &self.state,
                    &participant_id,
                    &answers,
                    now,
                    &limits,
                );
                let _ = reply.send(self.apply(result));
            }
            RoomCommand::EndRoundEarly {
                participant_id,
                reply,
            } => {
                let result = transitions::end_round_early(&self.state, &participant_id, now);
                let _ = reply.send(self.apply(result));
            }
            RoomCommand::ScoreSubmission {
                host_token,
                round_number,
                participant_id,
                marks,
                reply,
            } => {
                let result = transitions::score_submission(
                    &self.state,
                    &host_token,
                    round_number,
                    &participant_id,
                    marks,
                    now,
                    &limits,
                );
                let _ = reply.send(self.apply(result));
            }
            RoomCommand::PublishRound {
                host_token,
                round_number,
                reply,
            } => {
                let result =
                    transitions::publish_round(&self.state, &host_token, round_number, now);
                let _ = reply.send(self.apply(result));
            }
            RoomCommand::DiscardRound {
                host_token,
                round_number,
                reply,
            } => {
                let result =
                    transitions::discard_round(&self.state, &host_token, round_number, now);
                let _ = reply.send(self.apply(result));
            }
            RoomCommand::CancelGame { host_token, reply } => {
                let result = transitions::cancel_game(&self.state, &host_token, now);
                let _ = reply.send(self.apply(result));
            }
            RoomCommand::EndGame { host_token, reply } => {
                let result = transitions::end_game(&self.state, &host_token, now);
                let _ = reply.send(self.apply(result));
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(project(&self.state));
            }
            RoomCommand::Subscribe { reply } => {
                let subscription = self.hub.subscribe();
                let id = subscription.id;
                self.hub.send_to(id, &RoomEvent::Connected);
                self.hub.send_to(
                    id,
                    &RoomEvent::Snapshot {
                        snapshot: project(&self.state),
                    },
                );
                let _ = reply.send(subscription);
                self.broadcast_presence();
            }
            RoomCommand::Unsubscribe { subscriber_id } => {
                if self.hub.remove(subscriber_id) {
                    self.broadcast_presence();
                }
            }
            RoomCommand::Inspect { reply } => {
                let _ = reply.send(RoomInspection {
                    status: self.state.game.status,
                    subscriber_count: self.hub.len(),
                });
            }
            RoomCommand::TimerExpired => {
                let result = transitions::timer_expired(&self.state, now);
                match self.apply(result) {
                    Ok(_) => {
                        tracing::debug!(room_code = %self.state.code, "round ended by timer");
                    }
                    Err(err) => {
                        // Late or early fire: drop it, but keep a live
                        // deadline armed so the round still times out.
                        self.rearm_deadline();
                        tracing::debug!(
                            room_code = %self.state.code,
                            reason = %err,
                            "dropped timer callback"
                        );
                    }
                }
            }
            RoomCommand::Shutdown => {}
        }
    }

    /// Commit a successful transition: replace the state, rearm the
    /// deadline, broadcast the event with the fresh snapshot attached.
    /// Failures pass through untouched, leaving the state as it was.
    fn apply(&mut self, result: TransitionResult) -> Result<RoomSnapshot, RoomError> {
        let Outcome { state, event } = result?;
        self.state = state;
        self.rearm_deadline();

        let snapshot = project(&self.state);
        if let Some(kind) = event {
            let event = build_event(kind, snapshot.clone());
            tracing::debug!(
                room_code = %self.state.code,
                event = event.kind(),
                subscribers = self.hub.len(),
                "broadcasting event"
            );
            if self.hub.broadcast(&event) > 0 {
                self.broadcast_presence();
            }
        }
        Ok(snapshot)
    }

    /// Mirror the active round's `ends_at` into the one armed deadline.
    fn rearm_deadline(&mut self) {
        self.deadline = self
            .state
            .game
            .active_round
            .as_ref()
            .and_then(|round| round.ends_at)
            .map(|ends_at| {
                let delta = (ends_at - Utc::now()).to_std().unwrap_or_default();
                Instant::now() + delta
            });
    }

    /// Announce the subscriber count; repeats while the announcement
    /// itself evicts slow subscribers.
    fn broadcast_presence(&mut self) {
        loop {
            let event = RoomEvent::Presence {
                count: self.hub.len(),
            };
            if self.hub.broadcast(&event) == 0 {
                break;
            }
        }
    }
}

/// Attach the post-transition snapshot to the event seed a transition
/// produced, yielding the wire event.
fn build_event(kind: EventKind, snapshot: RoomSnapshot) -> RoomEvent {
    match kind {
        EventKind::JoinRequest { participant } => RoomEvent::JoinRequest {
            participant,
            snapshot,
        },
        EventKind::AdmissionUpdate { participant } => RoomEvent::AdmissionUpdate {
            participant,
            snapshot,
        },
        EventKind::GameStarted => RoomEvent::GameStarted { snapshot },
        EventKind::TurnCalled => RoomEvent::TurnCalled { snapshot },
        EventKind::SubmissionReceived { participant_id } => RoomEvent::SubmissionReceived {
            participant_id,
            snapshot,
        },
        EventKind::RoundEnded {
            reason,
            completed_round,
        } => RoomEvent::RoundEnded {
            reason,
            completed_round,
            snapshot,
        },
        EventKind::SubmissionScored {
            participant_id,
            round_number,
        } => RoomEvent::SubmissionScored {
            participant_id,
            round_number,
            snapshot,
        },
        EventKind::RoundScoresPublished { round_number } => RoomEvent::RoundScoresPublished {
            round_number,
            snapshot,
        },
        EventKind::RoundScoresDiscarded { round_number } => RoomEvent::RoundScoresDiscarded {
            round_number,
            snapshot,
        },
        EventKind::GameCancelled => RoomEvent::GameCancelled { snapshot },
        EventKind::GameEnded => RoomEvent::GameEnded { snapshot },
    }
}

/// Spawn a new room actor task and return a handle to it.
pub(crate) fn spawn_room(state: RoomState, config: Arc<Config>) -> RoomHandle {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let code = state.code.clone();
    let hub = SubscriberHub::new(config.server.subscriber_buffer);

    let actor = RoomActor {
        config,
        state,
        hub,
        receiver: rx,
        deadline: None,
    };
    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
