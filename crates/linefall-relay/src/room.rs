use std::time::Instant;

use linefall_engine::Board;
use linefall_protocol::{RoomId, RoomStatus, RoomSummary};

use super::lobby::ConnId;

/// Players per room; a room with this many members is a running match.
pub const ROOM_CAPACITY: usize = 2;

/// Last board snapshot a player sent, replayed to late spectators.
#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub board: Board,
    pub score: usize,
}

/// One match room: up to two seated players plus any number of
/// spectators.
///
/// The member's position in `members` is their player index. The
/// `generation` counter increments on every lifecycle transition so
/// that delayed cooldown timers can detect they became stale.
#[derive(Debug)]
pub struct Room {
    pub(crate) id: RoomId,
    pub(crate) name: String,
    pub(crate) status: RoomStatus,
    pub(crate) members: Vec<ConnId>,
    pub(crate) spectators: Vec<ConnId>,
    pub(crate) snapshots: [Option<PlayerSnapshot>; ROOM_CAPACITY],
    pub(crate) generation: u64,
    created_at: Instant,
}

impl Room {
    pub(crate) fn new(id: RoomId, name: String) -> Self {
        Self {
            id,
            name,
            status: RoomStatus::Waiting,
            members: Vec::with_capacity(ROOM_CAPACITY),
            spectators: Vec::new(),
            snapshots: [None, None],
            generation: 0,
            created_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.members.len() >= ROOM_CAPACITY
    }

    pub(crate) fn member_index(&self, conn: ConnId) -> Option<usize> {
        self.members.iter().position(|&member| member == conn)
    }

    /// Every connection that should receive room lifecycle events,
    /// except `sender`.
    pub(crate) fn recipients_except(&self, sender: ConnId) -> Vec<ConnId> {
        self.members
            .iter()
            .chain(&self.spectators)
            .copied()
            .filter(|&conn| conn != sender)
            .collect()
    }

    #[must_use]
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id,
            name: self.name.clone(),
            player_count: self.members.len(),
            is_full: self.is_full(),
            status: self.status,
        }
    }
}
