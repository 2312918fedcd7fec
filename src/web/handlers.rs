//! REST handlers for the control surface.
//!
//! Each handler validates the body shape, resolves the room actor, sends
//! one command, and returns either the full post-state snapshot or the
//! error, never anything in between.

use axum::extract::{FromRequest, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::RoomError;
use crate::protocol::types::{AnswerPatch, GameConfigInput, MarkSet, ParticipantId};

use super::AppState;

/// `Json` with rejections rendered as `{"error": ...}` like every other
/// failure on this surface.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(RoomError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub host_name: String,
    pub max_participants: u8,
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub host_token: String,
    pub request_id: ParticipantId,
    pub approve: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub host_token: String,
    #[serde(default)]
    pub config: Option<GameConfigInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    pub participant_id: ParticipantId,
    pub number: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswersRequest {
    pub participant_id: ParticipantId,
    pub answers: AnswerPatch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndRequest {
    pub participant_id: ParticipantId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub host_token: String,
    pub round_number: u32,
    pub participant_id: ParticipantId,
    pub marks: MarkSet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRequest {
    pub host_token: String,
    pub round_number: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRequest {
    pub host_token: String,
}

pub(super) async fn create_room(
    State(app): State<AppState>,
    AppJson(body): AppJson<CreateRoomRequest>,
) -> Result<impl IntoResponse, RoomError> {
    let created = app
        .registry
        .create_room(&body.host_name, body.max_participants)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub(super) async fn room_snapshot(
    State(app): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, RoomError> {
    let room = app.registry.lookup(&code)?;
    Ok(Json(room.snapshot().await?))
}

pub(super) async fn submit_join(
    State(app): State<AppState>,
    Path(code): Path<String>,
    AppJson(body): AppJson<JoinRequest>,
) -> Result<impl IntoResponse, RoomError> {
    let room = app.registry.lookup(&code)?;
    let accepted = room.submit_join(body.name).await?;
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

pub(super) async fn review_admission(
    State(app): State<AppState>,
    Path(code): Path<String>,
    AppJson(body): AppJson<AdmissionRequest>,
) -> Result<impl IntoResponse, RoomError> {
    let room = app.registry.lookup(&code)?;
    let snapshot = room
        .review_join(body.host_token, body.request_id, body.approve)
        .await?;
    Ok(Json(snapshot))
}

pub(super) async fn start_game(
    State(app): State<AppState>,
    Path(code): Path<String>,
    AppJson(body): AppJson<StartRequest>,
) -> Result<impl IntoResponse, RoomError> {
    let room = app.registry.lookup(&code)?;
    let snapshot = room.start_game(body.host_token, body.config).await?;
    Ok(Json(snapshot))
}

pub(super) async fn call_number(
    State(app): State<AppState>,
    Path(code): Path<String>,
    AppJson(body): AppJson<CallRequest>,
) -> Result<impl IntoResponse, RoomError> {
    let room = app.registry.lookup(&code)?;
    let snapshot = room.call_number(body.participant_id, body.number).await?;
    Ok(Json(snapshot))
}

pub(super) async fn update_draft(
    State(app): State<AppState>,
    Path(code): Path<String>,
    AppJson(body): AppJson<AnswersRequest>,
) -> Result<impl IntoResponse, RoomError> {
    let room = app.registry.lookup(&code)?;
    room.update_draft(body.participant_id, body.answers).await?;
    Ok(Json(json!({ "ok": true })))
}

pub(super) async fn submit_answers(
    State(app): State<AppState>,
    Path(code): Path<String>,
    AppJson(body): AppJson<AnswersRequest>,
) -> Result<impl IntoResponse, RoomError> {
    let room = app.registry.lookup(&code)?;
    let snapshot = room
        .submit_answers(body.participant_id, body.answers)
        .await?;
    Ok(Json(snapshot))
}

pub(super) async fn end_round(
    State(app): State<AppState>,
    Path(code): Path<String>,
    AppJson(body): AppJson<EndRequest>,
) -> Result<impl IntoResponse, RoomError> {
    let room = app.registry.lookup(&code)?;
    let snapshot = room.end_round_early(body.participant_id).await?;
    Ok(Json(snapshot))
}

pub(super) async fn score_submission(
    State(app): State<AppState>,
    Path(code): Path<String>,
    AppJson(body): AppJson<ScoreRequest>,
) -> Result<impl IntoResponse, RoomError> {
    let room = app.registry.lookup(&code)?;
    let snapshot = room
        .score_submission(
            body.host_token,
            body.round_number,
            body.participant_id,
            body.marks,
        )
        .await?;
    Ok(Json(snapshot))
}

pub(super) async fn publish_round(
    State(app): State<AppState>,
    Path(code): Path<String>,
    AppJson(body): AppJson<RoundRequest>,
) -> Result<impl IntoResponse, RoomError> {
    let room = app.registry.lookup(&code)?;
    let snapshot = room.publish_round(body.host_token, body.round_number).await?;
    Ok(Json(snapshot))
}

pub(super) async fn discard_round(
    State(app): State<AppState>,
    Path(code): Path<String>,
    AppJson(body): AppJson<RoundRequest>,
) -> Result<impl IntoResponse, RoomError> {
    let room = app.registry.lookup(&code)?;
    let snapshot = room.discard_round(body.host_token, body.round_number).await?;
    Ok(Json(snapshot))
}

pub(super) async fn cancel_game(
    State(app): State<AppState>,
    Path(code): Path<String>,
    AppJson(body): AppJson<HostRequest>,
) -> Result<impl IntoResponse, RoomError> {
    let room = app.registry.lookup(&code)?;
    let snapshot = room.cancel_game(body.host_token).await?;
    Ok(Json(snapshot))
}

pub(super) async fn finish_game(
    State(app): State<AppState>,
    Path(code): Path<String>,
    AppJson(body): AppJson<HostRequest>,
) -> Result<impl IntoResponse, RoomError> {
    let room = app.registry.lookup(&code)?;
    let snapshot = room.end_game(body.host_token).await?;
    Ok(Json(snapshot))
}
