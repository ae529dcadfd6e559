use arrayvec::ArrayVec;
use rand::{Rng as _, SeedableRng as _, prelude::StdRng};

use crate::{
    HoldError, PieceCollisionError,
    core::{Board, Piece, PieceKind, kick_offsets},
    engine::piece_queue::{PREVIEW_LEN, PieceQueue},
};

/// Points awarded per simultaneous line clear (index = lines cleared).
const SCORE_TABLE: [usize; 5] = [0, 100, 300, 500, 800];

/// Rows that must stay clear of the stack; a filled cell here at lock
/// time is a block-out.
const BLOCK_OUT_ROWS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::IsVariant)]
pub enum SessionState {
    Playing,
    GameOver,
}

/// What happened when a piece locked into the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOutcome {
    pub cleared_lines: usize,
    pub score_delta: usize,
    pub attack_lines: usize,
    pub topped_out: bool,
}

/// One player's complete game state.
///
/// Owns the board, the falling piece, the piece queue, and the hold
/// slot. Every mutation goes through the operations below; all of them
/// are no-ops once the session reaches `GameOver`.
#[derive(Debug, Clone)]
pub struct GameSession {
    board: Board,
    falling_piece: Piece,
    queue: PieceQueue,
    held: Option<PieceKind>,
    can_hold: bool,
    hole_rng: StdRng,
    state: SessionState,
    score: usize,
    total_cleared_lines: usize,
    completed_pieces: usize,
    line_cleared_counter: [usize; 5],
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    /// Creates a session seeded from the OS random source.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(PieceQueue::new(), StdRng::from_os_rng())
    }

    /// Like [`Self::new`], but fully deterministic for a given seed.
    ///
    /// Both the piece sequence and the garbage hole columns derive from
    /// the seed, so two sessions built from the same seed replay
    /// identically under the same inputs.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_parts(
            PieceQueue::with_seed(seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        )
    }

    fn from_parts(mut queue: PieceQueue, hole_rng: StdRng) -> Self {
        let falling_piece = Piece::spawn(queue.pop_next());
        Self {
            board: Board::new(),
            falling_piece,
            queue,
            held: None,
            can_hold: true,
            hole_rng,
            state: SessionState::Playing,
            score: 0,
            total_cleared_lines: 0,
            completed_pieces: 0,
            line_cleared_counter: [0; 5],
        }
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn falling_piece(&self) -> &Piece {
        &self.falling_piece
    }

    #[must_use]
    pub fn held_piece(&self) -> Option<PieceKind> {
        self.held
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    #[must_use]
    pub fn preview(&self) -> ArrayVec<PieceKind, PREVIEW_LEN> {
        self.queue.preview()
    }

    #[must_use]
    pub fn total_cleared_lines(&self) -> usize {
        self.total_cleared_lines
    }

    #[must_use]
    pub fn completed_pieces(&self) -> usize {
        self.completed_pieces
    }

    #[must_use]
    pub fn line_cleared_counter(&self) -> &[usize; 5] {
        &self.line_cleared_counter
    }

    /// Where the falling piece would rest after a hard drop.
    #[must_use]
    pub fn ghost_piece(&self) -> Piece {
        self.falling_piece.dropped(&self.board)
    }

    pub fn try_move_left(&mut self) -> Result<(), PieceCollisionError> {
        self.try_shift(-1)
    }

    pub fn try_move_right(&mut self) -> Result<(), PieceCollisionError> {
        self.try_shift(1)
    }

    fn try_shift(&mut self, dx: i32) -> Result<(), PieceCollisionError> {
        if self.state.is_game_over() {
            return Err(PieceCollisionError);
        }
        let candidate = self.falling_piece.translated(dx, 0);
        if self.board.collides(&candidate) {
            return Err(PieceCollisionError);
        }
        self.falling_piece = candidate;
        Ok(())
    }

    pub fn try_rotate_clockwise(&mut self) -> Result<(), PieceCollisionError> {
        self.try_rotate(self.falling_piece.rotated_clockwise())
    }

    pub fn try_rotate_counterclockwise(&mut self) -> Result<(), PieceCollisionError> {
        self.try_rotate(self.falling_piece.rotated_counterclockwise())
    }

    /// Tries the five wall-kick candidates for the directed transition.
    /// The first non-colliding candidate wins; if all collide the piece
    /// is left untouched.
    fn try_rotate(&mut self, rotated: Piece) -> Result<(), PieceCollisionError> {
        if self.state.is_game_over() {
            return Err(PieceCollisionError);
        }
        let offsets = kick_offsets(
            rotated.kind(),
            self.falling_piece.rotation(),
            rotated.rotation(),
        );
        for &(dx, dy) in offsets {
            let candidate = rotated.translated(dx, -dy);
            if !self.board.collides(&candidate) {
                self.falling_piece = candidate;
                return Ok(());
            }
        }
        Err(PieceCollisionError)
    }

    /// One gravity step. Returns `Some` when the piece could not move
    /// down and locked instead.
    pub fn soft_drop(&mut self) -> Option<LockOutcome> {
        if self.state.is_game_over() {
            return None;
        }
        let below = self.falling_piece.translated(0, 1);
        if self.board.collides(&below) {
            return Some(self.lock());
        }
        self.falling_piece = below;
        None
    }

    /// Drops the piece to its resting position and locks it.
    pub fn hard_drop(&mut self) -> Option<LockOutcome> {
        if self.state.is_game_over() {
            return None;
        }
        self.falling_piece = self.falling_piece.dropped(&self.board);
        Some(self.lock())
    }

    /// Stashes the falling piece, respawning either the previously held
    /// piece or the next queued one. At most once per piece lifetime.
    pub fn try_hold(&mut self) -> Result<(), HoldError> {
        if self.state.is_game_over() {
            return Err(HoldError::PieceCollision(PieceCollisionError));
        }
        if !self.can_hold {
            return Err(HoldError::HoldAlreadyUsed);
        }
        let next_kind = match self.held {
            Some(kind) => kind,
            None => self.queue.pop_next(),
        };
        let respawned = Piece::spawn(next_kind);
        if self.board.collides(&respawned) {
            return Err(HoldError::PieceCollision(PieceCollisionError));
        }
        self.held = Some(self.falling_piece.kind());
        self.falling_piece = respawned;
        self.can_hold = false;
        Ok(())
    }

    /// Injects garbage rows from the bottom, one uniformly random hole
    /// per row. The falling piece is not re-validated; an overlap
    /// surfaces at the next collision check.
    pub fn apply_garbage(&mut self, lines: usize) {
        if self.state.is_game_over() || lines == 0 {
            return;
        }
        let holes: Vec<usize> = (0..lines)
            .map(|_| self.hole_rng.random_range(0..Board::COLS))
            .collect();
        self.board.add_garbage_rows(&holes);
    }

    fn lock(&mut self) -> LockOutcome {
        self.board.fill_piece(&self.falling_piece);
        let cleared_lines = self.board.clear_full_rows();
        let score_delta = SCORE_TABLE[cleared_lines];
        let attack_lines = cleared_lines.saturating_sub(1);

        self.score += score_delta;
        self.total_cleared_lines += cleared_lines;
        self.line_cleared_counter[cleared_lines] += 1;
        self.completed_pieces += 1;
        self.can_hold = true;

        let next = Piece::spawn(self.queue.pop_next());
        let topped_out =
            self.board.collides(&next) || self.board.top_rows_occupied(BLOCK_OUT_ROWS);
        if topped_out {
            self.state = SessionState::GameOver;
        }
        self.falling_piece = next;

        LockOutcome {
            cleared_lines,
            score_delta,
            attack_lines,
            topped_out,
        }
    }
}

#[cfg(test)]
impl GameSession {
    fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    fn set_falling_piece(&mut self, piece: Piece) {
        self.falling_piece = piece;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Rotation;

    /// A vertical I piece whose filled column sits at absolute column `x`.
    fn vertical_i_at(x: i32, y: i32) -> Piece {
        let piece = Piece::spawn(PieceKind::I).rotated_clockwise();
        // Rotation 1 of the I piece fills column 2 of its bounding box.
        let (px, py) = piece.position();
        piece.translated(x - px - 2, y - py)
    }

    #[test]
    fn hard_drop_locks_and_spawns_the_next_piece() {
        let mut session = GameSession::with_seed(1);
        let expected_next = session.preview()[0];

        let outcome = session.hard_drop().unwrap();

        assert_eq!(outcome.cleared_lines, 0);
        assert_eq!(outcome.score_delta, 0);
        assert!(!outcome.topped_out);
        assert_eq!(session.completed_pieces(), 1);
        assert_eq!(session.falling_piece().kind(), expected_next);
        assert_eq!(
            session.falling_piece().position(),
            (Board::SPAWN_X, 0)
        );
    }

    #[test]
    fn soft_drop_only_locks_at_the_bottom() {
        let mut session = GameSession::with_seed(2);
        let mut steps = 0;
        while session.soft_drop().is_none() {
            steps += 1;
            assert!(steps <= Board::ROWS, "piece never locked");
        }
        assert_eq!(session.completed_pieces(), 1);
    }

    #[test]
    fn double_clear_scores_and_attacks() {
        let mut session = GameSession::with_seed(3);
        // Two bottom rows full except column 0, then plug the well with
        // a vertical I.
        session.board_mut().add_garbage_rows(&[0, 0]);
        session.set_falling_piece(vertical_i_at(0, 0));

        let outcome = session.hard_drop().unwrap();

        assert_eq!(outcome.cleared_lines, 2);
        assert_eq!(outcome.score_delta, 300);
        assert_eq!(outcome.attack_lines, 1);
        assert_eq!(session.score(), 300);
        assert_eq!(session.total_cleared_lines(), 2);
        assert_eq!(session.line_cleared_counter()[2], 1);
        // The two leftover I cells settle in the freed rows.
        assert_eq!(
            session.board().cell(0, Board::ROWS - 1),
            crate::core::Cell::Piece(PieceKind::I)
        );
    }

    #[test]
    fn single_clear_never_attacks() {
        let mut session = GameSession::with_seed(4);
        session.board_mut().add_garbage_rows(&[0]);
        // A vertical I fills the hole and stacks three cells above it.
        session.set_falling_piece(vertical_i_at(0, 0));

        let outcome = session.hard_drop().unwrap();

        assert_eq!(outcome.cleared_lines, 1);
        assert_eq!(outcome.score_delta, 100);
        assert_eq!(outcome.attack_lines, 0);
    }

    #[test]
    fn wall_kick_shifts_the_piece_off_the_wall() {
        let mut session = GameSession::with_seed(5);
        session.set_falling_piece(vertical_i_at(0, 5));

        session.try_rotate_clockwise().unwrap();

        // The (2, 0) kick is the first candidate that fits.
        assert_eq!(session.falling_piece().rotation(), Rotation::new(2));
        assert_eq!(session.falling_piece().position(), (0, 5));
    }

    #[test]
    fn failed_rotation_restores_the_piece_exactly() {
        let mut session = GameSession::with_seed(6);
        // A one-wide well at column 0, six rows deep.
        session.board_mut().add_garbage_rows(&[0; 6]);
        let piece = vertical_i_at(0, Board::ROWS as i32 - 5);
        session.set_falling_piece(piece);

        assert!(session.try_rotate_clockwise().is_err());
        assert_eq!(*session.falling_piece(), piece);
    }

    #[test]
    fn hold_is_one_shot_per_piece() {
        let mut session = GameSession::with_seed(7);
        let first = session.falling_piece().kind();
        let second = session.preview()[0];

        session.try_hold().unwrap();
        assert_eq!(session.held_piece(), Some(first));
        assert_eq!(session.falling_piece().kind(), second);

        assert!(matches!(
            session.try_hold(),
            Err(HoldError::HoldAlreadyUsed)
        ));

        // Locking re-arms the hold; holding now swaps back the first kind.
        session.hard_drop().unwrap();
        session.try_hold().unwrap();
        assert_eq!(session.falling_piece().kind(), first);
        assert_eq!(session.held_piece(), Some(second));
    }

    #[test]
    fn garbage_rows_arrive_with_one_hole_each() {
        let mut session = GameSession::with_seed(8);
        session.apply_garbage(3);

        for y in Board::ROWS - 3..Board::ROWS {
            let holes = (0..Board::COLS)
                .filter(|&x| session.board().cell(x, y).is_empty())
                .count();
            assert_eq!(holes, 1, "row {y}");
        }
    }

    #[test]
    fn block_out_ends_the_session() {
        let mut session = GameSession::with_seed(9);
        session.board_mut().add_garbage_rows(&[5; Board::ROWS - 1]);
        // Column 0 is blocked from row 1 down, so the piece rests with a
        // single cell in the top row and the rest above the grid.
        session.set_falling_piece(vertical_i_at(0, -3));

        let outcome = session.hard_drop().unwrap();

        assert!(outcome.topped_out);
        assert!(session.state().is_game_over());
        assert_eq!(session.hard_drop(), None);
        assert!(session.try_move_left().is_err());
        session.apply_garbage(1);
    }
}
