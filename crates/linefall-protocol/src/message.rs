use linefall_engine::Board;
use serde::{Deserialize, Serialize};

use super::room::{RoomId, RoomSummary};

/// Messages a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    GetRooms,
    CreateRoom { name: String },
    JoinRoom { room_id: RoomId },
    Spectate { room_id: RoomId },
    DeleteRoom { room_id: RoomId },
    /// Full snapshot of the sender's board, relayed to everyone else in
    /// the room.
    GameState { board: Board, score: usize },
    /// Garbage lines for the opponent.
    Attack { lines: usize },
    GameOver { score: usize },
}

/// Messages the relay sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    RoomList {
        rooms: Vec<RoomSummary>,
    },
    RoomCreated {
        room_id: RoomId,
        name: String,
    },
    RoomDeleted {
        room_id: RoomId,
        message: String,
    },
    /// The match begins; `player_index` is the recipient's own seat.
    GameStart {
        room_id: RoomId,
        player_index: usize,
    },
    Waiting {
        message: String,
    },
    /// An opponent (or observed player) snapshot, tagged with the seat
    /// it came from.
    GameState {
        player_index: usize,
        board: Board,
        score: usize,
    },
    Attack {
        lines: usize,
    },
    GameEnd {
        winner_index: usize,
        score: usize,
    },
    OpponentDisconnected,
    SpectateStart {
        room_id: RoomId,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

/// Recoverable request failures reported back to the originator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    #[display("room not found")]
    RoomNotFound,
    #[display("room is full")]
    RoomFull,
    #[display("match already in progress")]
    MatchInProgress,
    #[display("room limit reached")]
    RoomLimitReached,
    #[display("not allowed")]
    Unauthorized,
    #[display("malformed message")]
    MalformedMessage,
}
