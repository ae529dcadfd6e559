use std::{collections::BTreeMap, time::Duration};

use linefall_engine::Board;
use linefall_protocol::{ClientMessage, ErrorKind, RoomId, RoomStatus, ServerMessage};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::room::{PlayerSnapshot, Room};

/// Connection identifier, unique for the lifetime of the process.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display,
)]
pub struct ConnId(pub u64);

/// Maximum number of concurrent rooms.
pub const MAX_ROOMS: usize = 10;

/// Delay before a finished room resets to waiting.
pub const RESET_COOLDOWN: Duration = Duration::from_secs(5);

const WAITING_MESSAGE: &str = "waiting for an opponent";

#[derive(Debug)]
struct Connection {
    outbox: mpsc::UnboundedSender<ServerMessage>,
    room: Option<RoomId>,
}

/// Deferred work a handler asks the caller to schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Reset the room to waiting after [`RESET_COOLDOWN`], unless its
    /// generation has moved on by then.
    ResetRoom { room_id: RoomId, generation: u64 },
}

/// All relay state: the room table and the connection registry.
///
/// Owned and mutated by a single task. Handlers are synchronous, never
/// block, and report deferred work as [`FollowUp`] values; outbound
/// messages go through per-connection unbounded senders, and a failed
/// send to one recipient never aborts delivery to the rest.
#[derive(Debug, Default)]
pub struct Lobby {
    conns: BTreeMap<ConnId, Connection>,
    rooms: BTreeMap<RoomId, Room>,
    next_room_id: u64,
}

impl Lobby {
    pub fn register(&mut self, conn: ConnId, outbox: mpsc::UnboundedSender<ServerMessage>) {
        debug!(%conn, "connection registered");
        self.conns.insert(conn, Connection { outbox, room: None });
    }

    pub fn disconnect(&mut self, conn: ConnId) {
        self.remove_from_room(conn);
        self.conns.remove(&conn);
        debug!(%conn, "connection removed");
    }

    /// Reports a frame that failed to parse back to its sender.
    pub fn malformed(&mut self, conn: ConnId) {
        self.send_error(conn, ErrorKind::MalformedMessage);
    }

    #[must_use]
    pub fn room(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    pub fn handle(&mut self, conn: ConnId, msg: ClientMessage) -> Vec<FollowUp> {
        match msg {
            ClientMessage::GetRooms => self.list_rooms(conn),
            ClientMessage::CreateRoom { name } => self.create_room(conn, name),
            ClientMessage::JoinRoom { room_id } => self.join_room(conn, room_id),
            ClientMessage::Spectate { room_id } => self.spectate(conn, room_id),
            ClientMessage::DeleteRoom { room_id } => self.delete_room(conn, room_id),
            ClientMessage::GameState { board, score } => self.relay_state(conn, board, score),
            ClientMessage::Attack { lines } => self.relay_attack(conn, lines),
            ClientMessage::GameOver { score } => return self.finish_match(conn, score),
        }
        Vec::new()
    }

    /// Applies a scheduled finished-to-waiting reset. Ignored when the
    /// room is gone or its generation moved past the one the timer was
    /// keyed to.
    pub fn room_cooldown_elapsed(&mut self, room_id: RoomId, generation: u64) {
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };
        if room.generation != generation || room.status != RoomStatus::Finished {
            debug!(room = %room_id, "ignoring stale cooldown");
            return;
        }
        let members = std::mem::take(&mut room.members);
        room.snapshots = [None, None];
        room.status = RoomStatus::Waiting;
        room.generation += 1;
        info!(room = %room_id, "room reset to waiting");
        for member in members {
            if let Some(connection) = self.conns.get_mut(&member) {
                connection.room = None;
            }
        }
    }

    fn list_rooms(&self, conn: ConnId) {
        let rooms = self.rooms.values().map(Room::summary).collect();
        self.send(conn, ServerMessage::RoomList { rooms });
    }

    fn create_room(&mut self, conn: ConnId, name: String) {
        if self.rooms.len() >= MAX_ROOMS {
            self.send_error(conn, ErrorKind::RoomLimitReached);
            return;
        }
        self.remove_from_room(conn);
        let room_id = RoomId(self.next_room_id);
        self.next_room_id += 1;
        let mut room = Room::new(room_id, name.clone());
        room.members.push(conn);
        self.rooms.insert(room_id, room);
        if let Some(connection) = self.conns.get_mut(&conn) {
            connection.room = Some(room_id);
        }
        info!(room = %room_id, %name, "room created");
        self.send(conn, ServerMessage::RoomCreated { room_id, name });
        self.send(
            conn,
            ServerMessage::Waiting {
                message: WAITING_MESSAGE.to_owned(),
            },
        );
    }

    fn join_room(&mut self, conn: ConnId, room_id: RoomId) {
        match self.rooms.get(&room_id) {
            None => {
                self.send_error(conn, ErrorKind::RoomNotFound);
                return;
            }
            Some(room) => {
                if room.member_index(conn).is_some() {
                    // Already seated here; joining again changes nothing.
                    self.send(
                        conn,
                        ServerMessage::Waiting {
                            message: WAITING_MESSAGE.to_owned(),
                        },
                    );
                    return;
                }
                // Capacity before status: a full room is also playing
                // or finished, and the seat shortage is the answer.
                if room.is_full() {
                    self.send_error(conn, ErrorKind::RoomFull);
                    return;
                }
                if room.status != RoomStatus::Waiting {
                    self.send_error(conn, ErrorKind::MatchInProgress);
                    return;
                }
            }
        }

        // The sender was not a member of the target room, so leaving any
        // prior room cannot discard this one.
        self.remove_from_room(conn);
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };
        room.members.push(conn);
        let mut outgoing = Vec::new();
        if room.is_full() {
            room.status = RoomStatus::Playing;
            room.generation += 1;
            room.snapshots = [None, None];
            for (player_index, &member) in room.members.iter().enumerate() {
                outgoing.push((
                    member,
                    ServerMessage::GameStart {
                        room_id,
                        player_index,
                    },
                ));
            }
            for &spectator in &room.spectators {
                outgoing.push((spectator, ServerMessage::SpectateStart { room_id }));
            }
            info!(room = %room_id, "match starting");
        } else {
            outgoing.push((
                conn,
                ServerMessage::Waiting {
                    message: WAITING_MESSAGE.to_owned(),
                },
            ));
        }
        if let Some(connection) = self.conns.get_mut(&conn) {
            connection.room = Some(room_id);
        }
        for (recipient, msg) in outgoing {
            self.send(recipient, msg);
        }
    }

    fn spectate(&mut self, conn: ConnId, room_id: RoomId) {
        if !self.rooms.contains_key(&room_id) {
            self.send_error(conn, ErrorKind::RoomNotFound);
            return;
        }
        self.remove_from_room(conn);
        let Some(room) = self.rooms.get_mut(&room_id) else {
            // The spectator was the room's only member; it is gone now.
            self.send_error(conn, ErrorKind::RoomNotFound);
            return;
        };
        room.spectators.push(conn);
        let snapshots: Vec<(usize, PlayerSnapshot)> = room
            .snapshots
            .iter()
            .enumerate()
            .filter_map(|(index, snapshot)| snapshot.clone().map(|s| (index, s)))
            .collect();
        if let Some(connection) = self.conns.get_mut(&conn) {
            connection.room = Some(room_id);
        }
        self.send(conn, ServerMessage::SpectateStart { room_id });
        for (player_index, snapshot) in snapshots {
            self.send(
                conn,
                ServerMessage::GameState {
                    player_index,
                    board: snapshot.board,
                    score: snapshot.score,
                },
            );
        }
    }

    fn delete_room(&mut self, conn: ConnId, room_id: RoomId) {
        match self.rooms.get(&room_id) {
            None => {
                self.send_error(conn, ErrorKind::RoomNotFound);
                return;
            }
            Some(room) if room.members.first() != Some(&conn) => {
                self.send_error(conn, ErrorKind::Unauthorized);
                return;
            }
            Some(_) => {}
        }
        // Removal also invalidates any pending cooldown timer.
        let Some(room) = self.rooms.remove(&room_id) else {
            return;
        };
        info!(room = %room_id, "room deleted");
        for recipient in room.members.iter().chain(&room.spectators).copied() {
            if let Some(connection) = self.conns.get_mut(&recipient) {
                connection.room = None;
            }
            self.send(
                recipient,
                ServerMessage::RoomDeleted {
                    room_id,
                    message: "room deleted by its owner".to_owned(),
                },
            );
        }
    }

    fn relay_state(&mut self, conn: ConnId, board: Board, score: usize) {
        let Some(room_id) = self.conns.get(&conn).and_then(|c| c.room) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };
        let Some(player_index) = room.member_index(conn) else {
            return;
        };
        room.snapshots[player_index] = Some(PlayerSnapshot {
            board: board.clone(),
            score,
        });
        let recipients = room.recipients_except(conn);
        for recipient in recipients {
            self.send(
                recipient,
                ServerMessage::GameState {
                    player_index,
                    board: board.clone(),
                    score,
                },
            );
        }
    }

    fn relay_attack(&self, conn: ConnId, lines: usize) {
        let Some(room_id) = self.conns.get(&conn).and_then(|c| c.room) else {
            return;
        };
        let Some(room) = self.rooms.get(&room_id) else {
            return;
        };
        let Some(player_index) = room.member_index(conn) else {
            return;
        };
        let Some(&opponent) = room.members.get(1 - player_index) else {
            return;
        };
        self.send(opponent, ServerMessage::Attack { lines });
    }

    fn finish_match(&mut self, conn: ConnId, score: usize) -> Vec<FollowUp> {
        let Some(room_id) = self.conns.get(&conn).and_then(|c| c.room) else {
            return Vec::new();
        };
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return Vec::new();
        };
        let Some(loser_index) = room.member_index(conn) else {
            return Vec::new();
        };
        if room.status != RoomStatus::Playing {
            return Vec::new();
        }
        room.status = RoomStatus::Finished;
        room.generation += 1;
        let generation = room.generation;
        let winner_index = 1 - loser_index;
        let recipients: Vec<ConnId> =
            room.members.iter().chain(&room.spectators).copied().collect();
        info!(room = %room_id, winner = winner_index, "match finished");
        for recipient in recipients {
            self.send(recipient, ServerMessage::GameEnd { winner_index, score });
        }
        vec![FollowUp::ResetRoom {
            room_id,
            generation,
        }]
    }

    /// Removes the connection from its current room, if any. The last
    /// member leaving discards the room; otherwise the remaining member
    /// learns the opponent left and the room returns to waiting.
    fn remove_from_room(&mut self, conn: ConnId) {
        let Some(room_id) = self.conns.get_mut(&conn).and_then(|c| c.room.take()) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };
        let Some(index) = room.member_index(conn) else {
            room.spectators.retain(|&s| s != conn);
            return;
        };
        room.members.remove(index);
        // Seats shift when a member leaves; stale snapshots would be
        // attributed to the wrong player.
        room.snapshots = [None, None];
        room.generation += 1;
        if room.members.is_empty() {
            let spectators = room.spectators.clone();
            self.rooms.remove(&room_id);
            info!(room = %room_id, "discarding empty room");
            for spectator in spectators {
                if let Some(connection) = self.conns.get_mut(&spectator) {
                    connection.room = None;
                }
                self.send(
                    spectator,
                    ServerMessage::RoomDeleted {
                        room_id,
                        message: "room closed".to_owned(),
                    },
                );
            }
        } else {
            room.status = RoomStatus::Waiting;
            let recipients = room.recipients_except(conn);
            for recipient in recipients {
                self.send(recipient, ServerMessage::OpponentDisconnected);
            }
        }
    }

    fn send(&self, conn: ConnId, msg: ServerMessage) {
        let Some(connection) = self.conns.get(&conn) else {
            return;
        };
        if connection.outbox.send(msg).is_err() {
            debug!(%conn, "dropping message for a closed connection");
        }
    }

    fn send_error(&self, conn: ConnId, kind: ErrorKind) {
        self.send(
            conn,
            ServerMessage::Error {
                kind,
                message: kind.to_string(),
            },
        );
    }
}
