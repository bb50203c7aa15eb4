//! HTTP fallbacks for pitch and vote submission.
//!
//! Clients normally send these over the websocket; the plain POST
//! endpoints exist for degraded connections and delegate to the same
//! engine paths, so phase and uniqueness rules apply either way.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::state::{PlayerId, RoomId, RoundId};
use crate::error::AppError;
use crate::errors::domain::DomainError;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitPitchRequest {
    player_id: PlayerId,
    round_id: RoundId,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CastVoteRequest {
    voter_id: PlayerId,
    candidate_id: PlayerId,
    round_id: RoundId,
}

#[derive(Debug, Serialize)]
struct AcceptedBody {
    success: bool,
}

/// Resolves the round's room and rejects rounds that are no longer the
/// room's active one, so a stale `roundId` cannot land on a later round.
fn active_room_for(app_state: &AppState, round_id: RoundId) -> Result<RoomId, DomainError> {
    let round = app_state.store().round(round_id)?;
    let current = app_state.store().current_round(round.room_id)?;
    if current.id != round_id {
        return Err(DomainError::invalid_state("round is no longer active"));
    }
    Ok(round.room_id)
}

/// POST /api/pitches
async fn submit_pitch(
    body: web::Json<SubmitPitchRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    if body.content.trim().is_empty() {
        return Err(DomainError::validation("pitch content is required").into());
    }
    let room_id = active_room_for(&app_state, body.round_id)?;
    app_state
        .engine()
        .submit_pitch(room_id, body.player_id, body.content)
        .await?;
    Ok(HttpResponse::Ok().json(AcceptedBody { success: true }))
}

/// POST /api/votes
async fn cast_vote(
    body: web::Json<CastVoteRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let room_id = active_room_for(&app_state, body.round_id)?;
    app_state
        .engine()
        .cast_vote(room_id, body.voter_id, body.candidate_id)
        .await?;
    Ok(HttpResponse::Ok().json(AcceptedBody { success: true }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/pitches").route(web::post().to(submit_pitch)));
    cfg.service(web::resource("/votes").route(web::post().to(cast_vote)));
}
