use linefall_engine::{Board, GameSession, LockOutcome};
use linefall_protocol::{ClientMessage, ErrorKind, RoomId, ServerMessage};
use tracing::debug;

/// Seats per room; mirrors are indexed by seat.
const SEATS: usize = 2;

/// A player input as delivered by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    MoveLeft,
    MoveRight,
    RotateClockwise,
    RotateCounterclockwise,
    SoftDrop,
    HardDrop,
    Hold,
}

/// Last relayed state of another player in the room.
#[derive(Debug, Clone)]
pub struct PlayerView {
    pub board: Board,
    pub score: usize,
}

/// Bridges the local engine session and the relay protocol.
///
/// Inbound server messages update mirrors and UI-facing flags; local
/// inputs and gravity ticks run against the engine and come back as the
/// wire messages to send. The engine's own state machine is never
/// driven by the network; the flags only gate whether inputs are
/// processed at all.
#[derive(Debug)]
pub struct SyncAdapter {
    session: GameSession,
    views: [Option<PlayerView>; SEATS],
    player_index: Option<usize>,
    room_id: Option<RoomId>,
    is_game_started: bool,
    game_ended: bool,
    winner_index: Option<usize>,
    opponent_disconnected: bool,
    spectating: bool,
    last_error: Option<(ErrorKind, String)>,
}

impl Default for SyncAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session: GameSession::new(),
            views: [None, None],
            player_index: None,
            room_id: None,
            is_game_started: false,
            game_ended: false,
            winner_index: None,
            opponent_disconnected: false,
            spectating: false,
            last_error: None,
        }
    }

    #[must_use]
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// The last relayed state of the given seat, if any arrived yet.
    #[must_use]
    pub fn view(&self, player_index: usize) -> Option<&PlayerView> {
        self.views.get(player_index)?.as_ref()
    }

    /// The opponent's mirror, for a seated player.
    #[must_use]
    pub fn opponent(&self) -> Option<&PlayerView> {
        let mine = self.player_index?;
        self.view(mine ^ 1)
    }

    #[must_use]
    pub fn player_index(&self) -> Option<usize> {
        self.player_index
    }

    #[must_use]
    pub fn room_id(&self) -> Option<RoomId> {
        self.room_id
    }

    #[must_use]
    pub fn is_game_started(&self) -> bool {
        self.is_game_started
    }

    #[must_use]
    pub fn game_ended(&self) -> bool {
        self.game_ended
    }

    #[must_use]
    pub fn winner_index(&self) -> Option<usize> {
        self.winner_index
    }

    #[must_use]
    pub fn opponent_disconnected(&self) -> bool {
        self.opponent_disconnected
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&(ErrorKind, String)> {
        self.last_error.as_ref()
    }

    /// Applies one inbound server message to the mirrors and flags.
    pub fn handle_server(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::GameStart {
                room_id,
                player_index,
            } => {
                debug!(%room_id, player_index, "match started");
                self.session = GameSession::new();
                self.views = [None, None];
                self.room_id = Some(room_id);
                self.player_index = Some(player_index);
                self.is_game_started = true;
                self.game_ended = false;
                self.winner_index = None;
                self.opponent_disconnected = false;
                // A former spectator who took a seat plays like anyone else.
                self.spectating = false;
            }
            ServerMessage::GameState {
                player_index,
                board,
                score,
            } => {
                if let Some(view) = self.views.get_mut(player_index) {
                    *view = Some(PlayerView { board, score });
                }
            }
            ServerMessage::Attack { lines } => {
                self.session.apply_garbage(lines);
            }
            ServerMessage::GameEnd { winner_index, .. } => {
                self.game_ended = true;
                self.winner_index = Some(winner_index);
            }
            ServerMessage::OpponentDisconnected => {
                self.opponent_disconnected = true;
                self.is_game_started = false;
            }
            ServerMessage::SpectateStart { room_id } => {
                self.room_id = Some(room_id);
                self.spectating = true;
            }
            ServerMessage::Waiting { .. } => {
                self.is_game_started = false;
            }
            ServerMessage::RoomCreated { room_id, .. } => {
                self.room_id = Some(room_id);
            }
            ServerMessage::RoomDeleted { .. } => {
                self.room_id = None;
                self.is_game_started = false;
                self.spectating = false;
            }
            ServerMessage::Error { kind, message } => {
                debug!(%kind, %message, "relay error");
                self.last_error = Some((kind, message));
            }
            ServerMessage::RoomList { .. } => {}
        }
    }

    /// Runs one player input against the engine. Returns the messages
    /// to relay; an input the engine rejected changes nothing and
    /// produces no traffic.
    pub fn apply_input(&mut self, input: InputEvent) -> Vec<ClientMessage> {
        if !self.accepts_input() {
            return Vec::new();
        }
        let (changed, outcome) = match input {
            InputEvent::MoveLeft => (self.session.try_move_left().is_ok(), None),
            InputEvent::MoveRight => (self.session.try_move_right().is_ok(), None),
            InputEvent::RotateClockwise => (self.session.try_rotate_clockwise().is_ok(), None),
            InputEvent::RotateCounterclockwise => {
                (self.session.try_rotate_counterclockwise().is_ok(), None)
            }
            // A playing session always moves or locks on a drop step.
            InputEvent::SoftDrop => (true, self.session.soft_drop()),
            InputEvent::HardDrop => {
                let outcome = self.session.hard_drop();
                (outcome.is_some(), outcome)
            }
            InputEvent::Hold => (self.session.try_hold().is_ok(), None),
        };
        if !changed {
            return Vec::new();
        }
        self.outbound(outcome)
    }

    /// Runs one gravity tick. Returns the messages to relay.
    pub fn tick(&mut self) -> Vec<ClientMessage> {
        if !self.accepts_input() {
            return Vec::new();
        }
        let outcome = self.session.soft_drop();
        self.outbound(outcome)
    }

    fn accepts_input(&self) -> bool {
        self.is_game_started
            && !self.game_ended
            && !self.spectating
            && !self.session.state().is_game_over()
    }

    /// Snapshot plus whatever the lock outcome mandates: attack lines
    /// for the opponent and the game-over report on top-out.
    fn outbound(&self, outcome: Option<LockOutcome>) -> Vec<ClientMessage> {
        let mut msgs = vec![ClientMessage::GameState {
            board: self.session.board().clone(),
            score: self.session.score(),
        }];
        if let Some(outcome) = outcome {
            if outcome.attack_lines > 0 {
                msgs.push(ClientMessage::Attack {
                    lines: outcome.attack_lines,
                });
            }
            if outcome.topped_out {
                msgs.push(ClientMessage::GameOver {
                    score: self.session.score(),
                });
            }
        }
        msgs
    }
}
