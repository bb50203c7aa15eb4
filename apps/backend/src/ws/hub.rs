//! Connection multiplexer.
//!
//! Tracks every live transport connection by an ephemeral id and, after a
//! successful join handshake, its `(playerId, roomId)` binding. Delivery
//! is best-effort: a send to a gone connection is dropped silently and a
//! reconnecting client only ever gets the current snapshot, not history.

use dashmap::DashMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::domain::state::{PlayerId, RoomId};
use crate::ws::protocol::ServerMsg;

pub type ConnectionId = Uuid;

struct Connection {
    sender: UnboundedSender<ServerMsg>,
    binding: Option<(PlayerId, RoomId)>,
}

#[derive(Default)]
pub struct ConnectionHub {
    connections: DashMap<ConnectionId, Connection>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh connection and returns the receiving half the
    /// session drains into its transport.
    pub fn register(&self, conn_id: ConnectionId) -> UnboundedReceiver<ServerMsg> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.insert(
            conn_id,
            Connection {
                sender: tx,
                binding: None,
            },
        );
        rx
    }

    /// Drops the connection entirely. Player records are untouched;
    /// rejoin re-binds under the same stable playerId.
    pub fn unregister(&self, conn_id: ConnectionId) {
        self.connections.remove(&conn_id);
    }

    /// Binds (or re-binds, on rejoin) a connection to a player in a room.
    pub fn bind(&self, conn_id: ConnectionId, player_id: PlayerId, room_id: RoomId) {
        if let Some(mut conn) = self.connections.get_mut(&conn_id) {
            conn.binding = Some((player_id, room_id));
        }
    }

    pub fn binding(&self, conn_id: ConnectionId) -> Option<(PlayerId, RoomId)> {
        self.connections
            .get(&conn_id)
            .and_then(|conn| conn.binding)
    }

    pub fn send_to(&self, conn_id: ConnectionId, msg: ServerMsg) {
        if let Some(conn) = self.connections.get(&conn_id) {
            let _ = conn.sender.send(msg);
        }
    }

    /// Sends to every connection bound to the room, optionally excluding
    /// one (typically the sender of the causing action).
    pub fn broadcast(&self, room_id: RoomId, msg: &ServerMsg, exclude: Option<ConnectionId>) {
        for entry in self.connections.iter() {
            if Some(*entry.key()) == exclude {
                continue;
            }
            if let Some((_, bound_room)) = entry.value().binding {
                if bound_room == room_id {
                    let _ = entry.value().sender.send(msg.clone());
                }
            }
        }
    }

    /// Unicast to every live connection of one player in a room. Used to
    /// surface round-initialization failures to the host.
    pub fn send_to_player(&self, room_id: RoomId, player_id: PlayerId, msg: &ServerMsg) {
        for entry in self.connections.iter() {
            if entry.value().binding == Some((player_id, room_id)) {
                let _ = entry.value().sender.send(msg.clone());
            }
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
