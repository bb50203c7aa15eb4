//! Room lifecycle HTTP routes: create, join, rejoin, inspect and settings.
//!
//! These endpoints cover everything a client does before holding a live
//! websocket; once joined, gameplay flows over /ws exclusively.

use actix_web::{web, HttpResponse};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::settings::{GameSettings, GameSettingsPatch};
use crate::domain::cards::VentureCard;
use crate::domain::state::{PlayerId, RoomState};
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::state::app_state::AppState;
use crate::store::records::{Player, Room};

/// Retries before giving up on finding a free 6-digit pin.
const MAX_PIN_ATTEMPTS: u32 = 64;

fn generate_room_pin(app_state: &AppState) -> Result<String, DomainError> {
    let mut rng = rand::rng();
    for _ in 0..MAX_PIN_ATTEMPTS {
        let pin = rng.random_range(100_000..1_000_000u32).to_string();
        if !app_state.store().pin_in_use(&pin) {
            return Ok(pin);
        }
    }
    Err(DomainError::conflict(
        ConflictKind::RoomPinExhausted,
        "could not allocate a free room pin",
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoomRequest {
    host_name: String,
    #[serde(default)]
    settings: GameSettingsPatch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinRoomRequest {
    player_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RejoinRoomRequest {
    player_id: PlayerId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSettingsRequest {
    host_id: PlayerId,
    #[serde(default)]
    settings: GameSettingsPatch,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomBody {
    id: i64,
    pin: String,
    host_id: PlayerId,
    state: RoomState,
    settings: GameSettings,
    current_round: u32,
}

impl From<&Room> for RoomBody {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            pin: room.pin.clone(),
            host_id: room.host_id,
            state: room.state,
            settings: room.settings.clone(),
            current_round: room.current_round_no,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerBody {
    id: PlayerId,
    name: String,
    is_host: bool,
    funding: i64,
}

impl From<&Player> for PlayerBody {
    fn from(player: &Player) -> Self {
        Self {
            id: player.player_id,
            name: player.name.clone(),
            is_host: player.is_host,
            funding: player.funding,
        }
    }
}

#[derive(Debug, Serialize)]
struct RoomAndPlayer {
    room: RoomBody,
    player: PlayerBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomMemberBody {
    id: PlayerId,
    name: String,
    is_host: bool,
    is_judge: bool,
    funding: i64,
    venture_cards: Vec<VentureCard>,
}

#[derive(Debug, Serialize)]
struct RoomDetails {
    room: RoomBody,
    players: Vec<RoomMemberBody>,
    rounds: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartGameRequest {
    host_id: PlayerId,
}

#[derive(Debug, Serialize)]
struct SettingsBody {
    settings: GameSettings,
}

/// POST /api/rooms
async fn create_room(
    body: web::Json<CreateRoomRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    if body.host_name.trim().is_empty() {
        return Err(DomainError::validation("host name is required").into());
    }

    let settings = body.settings.apply(&GameSettings::default());
    settings.validate()?;

    let pin = generate_room_pin(&app_state)?;
    let host_id = Uuid::new_v4();
    let room = app_state.store().create_room(pin, host_id, settings);
    let host = app_state
        .store()
        .create_player(room.id, host_id, body.host_name, true)?;

    Ok(HttpResponse::Ok().json(RoomAndPlayer {
        room: (&room).into(),
        player: (&host).into(),
    }))
}

/// POST /api/rooms/{pin}/join
async fn join_room(
    path: web::Path<String>,
    body: web::Json<JoinRoomRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let pin = path.into_inner();
    let body = body.into_inner();
    if body.player_name.trim().is_empty() {
        return Err(DomainError::validation("player name is required").into());
    }

    let room = app_state.store().room_by_pin(&pin)?;
    // State and capacity checks live inside the store call, under its
    // write lock; concurrent joins cannot overfill the room.
    let player = app_state
        .store()
        .create_player_checked(room.id, Uuid::new_v4(), body.player_name)?;

    Ok(HttpResponse::Ok().json(RoomAndPlayer {
        room: (&room).into(),
        player: (&player).into(),
    }))
}

/// POST /api/rooms/{pin}/rejoin
///
/// Idempotent re-entry for a player who lost their socket. The player
/// record is stable; the websocket JOIN_ROOM handshake re-binds delivery.
async fn rejoin_room(
    path: web::Path<String>,
    body: web::Json<RejoinRoomRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let pin = path.into_inner();
    let room = app_state.store().room_by_pin(&pin)?;
    let player = app_state.store().player(body.player_id)?;
    if player.room_id != room.id {
        return Err(DomainError::not_found(
            NotFoundKind::Player,
            "player not found in this room",
        )
        .into());
    }

    Ok(HttpResponse::Ok().json(RoomAndPlayer {
        room: (&room).into(),
        player: (&player).into(),
    }))
}

/// GET /api/rooms/{pin}
async fn get_room(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let pin = path.into_inner();
    let room = app_state.store().room_by_pin(&pin)?;
    let players = app_state
        .store()
        .players_in_room(room.id)
        .iter()
        .map(|p| RoomMemberBody {
            id: p.player_id,
            name: p.name.clone(),
            is_host: p.is_host,
            is_judge: p.is_judge,
            funding: p.funding,
            venture_cards: p.venture_cards.clone(),
        })
        .collect();
    let rounds = app_state.store().rounds_in_room(room.id).len();

    Ok(HttpResponse::Ok().json(RoomDetails {
        room: (&room).into(),
        players,
        rounds,
    }))
}

/// PATCH /api/rooms/{pin}/settings
async fn update_settings(
    path: web::Path<String>,
    body: web::Json<UpdateSettingsRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let pin = path.into_inner();
    let body = body.into_inner();
    let room = app_state.store().room_by_pin(&pin)?;
    let settings = app_state
        .engine()
        .update_settings(room.id, body.host_id, &body.settings)
        .await?;

    Ok(HttpResponse::Ok().json(SettingsBody { settings }))
}

/// POST /api/rooms/{pin}/start
///
/// HTTP twin of the START_GAME realtime command, for hosts whose socket
/// is not yet up. Same rules: host-only, lobby-only, at least 3 players.
async fn start_game(
    path: web::Path<String>,
    body: web::Json<StartGameRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let pin = path.into_inner();
    let room = app_state.store().room_by_pin(&pin)?;
    app_state.engine().start_game(room.id, body.host_id).await?;
    let room = app_state.store().room(room.id)?;
    Ok(HttpResponse::Ok().json(RoomBody::from(&room)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::post().to(create_room)));
    cfg.service(web::resource("/{pin}").route(web::get().to(get_room)));
    cfg.service(web::resource("/{pin}/join").route(web::post().to(join_room)));
    cfg.service(web::resource("/{pin}/rejoin").route(web::post().to(rejoin_room)));
    cfg.service(web::resource("/{pin}/settings").route(web::patch().to(update_settings)));
    cfg.service(web::resource("/{pin}/start").route(web::post().to(start_game)));
}
