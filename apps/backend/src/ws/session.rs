use std::future::Future;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::domain::DomainError;
use crate::state::app_state::AppState;
use crate::ws::protocol::{ClientMsg, ServerMsg};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let conn_id = Uuid::new_v4();
    let session = WsSession::new(conn_id, app_state);
    ws::start(session, &req, stream)
}

pub struct WsSession {
    conn_id: Uuid,
    app_state: web::Data<AppState>,
    last_heartbeat: Instant,
}

impl WsSession {
    fn new(conn_id: Uuid, app_state: web::Data<AppState>) -> Self {
        Self {
            conn_id,
            app_state,
            last_heartbeat: Instant::now(),
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[WS SESSION] failed to serialize outbound message"),
        }
    }

    fn send_error(ctx: &mut ws::WebsocketContext<Self>, message: impl Into<String>) {
        Self::send_json(
            ctx,
            &ServerMsg::Error {
                message: message.into(),
            },
        );
    }

    fn start_heartbeat(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(conn_id = %actor.conn_id, "[WS SESSION] heartbeat timed out");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
    }

    /// Runs one engine action off the actor thread; an `Err` becomes an
    /// `ERROR` unicast on this connection and the socket stays open.
    fn run_action<F>(&mut self, ctx: &mut ws::WebsocketContext<Self>, fut: F)
    where
        F: Future<Output = Result<(), DomainError>> + 'static,
    {
        ctx.spawn(fut.into_actor(self).map(|res, _actor, ctx| {
            if let Err(err) = res {
                Self::send_error(ctx, err.to_string());
            }
        }));
    }

    /// Binding established by JOIN_ROOM; every other command requires it.
    fn require_binding(
        &self,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Option<(crate::domain::state::PlayerId, crate::domain::state::RoomId)> {
        let binding = self.app_state.hub().binding(self.conn_id);
        if binding.is_none() {
            Self::send_error(ctx, "join a room before sending game actions");
        }
        binding
    }

    fn dispatch(&mut self, cmd: ClientMsg, ctx: &mut ws::WebsocketContext<Self>) {
        let engine = self.app_state.engine().clone();
        match cmd {
            ClientMsg::JoinRoom {
                player_id,
                room_pin,
            } => {
                let conn_id = self.conn_id;
                ctx.spawn(
                    async move { engine.join_room(conn_id, player_id, &room_pin).await }
                        .into_actor(self)
                        .map(move |res, _actor, ctx| match res {
                            Ok(snapshot) => {
                                info!(conn_id = %conn_id, "[WS SESSION] joined room");
                                Self::send_json(ctx, &ServerMsg::GameState { state: snapshot });
                            }
                            Err(err) => Self::send_error(ctx, err.to_string()),
                        }),
                );
            }
            ClientMsg::Ready => {
                let Some((player_id, room_id)) = self.require_binding(ctx) else {
                    return;
                };
                engine.mark_ready(room_id, player_id);
            }
            ClientMsg::StartGame {
                player_id: declared,
            } => {
                let Some((player_id, room_id)) = self.require_binding(ctx) else {
                    return;
                };
                if declared != player_id {
                    Self::send_error(ctx, "player id does not match this connection");
                    return;
                }
                self.run_action(ctx, async move {
                    engine.start_game(room_id, player_id).await
                });
            }
            ClientMsg::PlayVentureCard {
                card_id,
                target_player_id,
            } => {
                let Some((player_id, room_id)) = self.require_binding(ctx) else {
                    return;
                };
                self.run_action(ctx, async move {
                    engine
                        .play_venture_card(room_id, player_id, &card_id, target_player_id)
                        .await
                });
            }
            ClientMsg::SubmitPitch { content } => {
                let Some((player_id, room_id)) = self.require_binding(ctx) else {
                    return;
                };
                self.run_action(ctx, async move {
                    engine.submit_pitch(room_id, player_id, content).await
                });
            }
            ClientMsg::SelectInvestment { chosen_player_id } => {
                let Some((player_id, room_id)) = self.require_binding(ctx) else {
                    return;
                };
                self.run_action(ctx, async move {
                    engine
                        .select_investment(room_id, player_id, chosen_player_id)
                        .await
                });
            }
            ClientMsg::CastVote { candidate_id } => {
                let Some((player_id, room_id)) = self.require_binding(ctx) else {
                    return;
                };
                self.run_action(ctx, async move {
                    engine.cast_vote(room_id, player_id, candidate_id).await
                });
            }
            ClientMsg::UpdateSettings { settings } => {
                let Some((player_id, room_id)) = self.require_binding(ctx) else {
                    return;
                };
                self.run_action(ctx, async move {
                    engine
                        .update_settings(room_id, player_id, &settings)
                        .await
                        .map(|_| ())
                });
            }
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(conn_id = %self.conn_id, "[WS SESSION] started");
        let rx = self.app_state.hub().register(self.conn_id);
        ctx.add_stream(UnboundedReceiverStream::new(rx));
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.app_state.hub().unregister(self.conn_id);
        info!(conn_id = %self.conn_id, "[WS SESSION] stopped");
    }
}

/// Outbound fan-out: everything the engine pushes through the hub for this
/// connection goes straight to the socket.
impl StreamHandler<ServerMsg> for WsSession {
    fn handle(&mut self, msg: ServerMsg, ctx: &mut Self::Context) {
        Self::send_json(ctx, &msg);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(cmd) => self.dispatch(cmd, ctx),
                    Err(_) => Self::send_error(ctx, "malformed message"),
                }
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                Self::send_error(ctx, "binary frames not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(conn_id = %self.conn_id, error = %err, "[WS SESSION] protocol error");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}
