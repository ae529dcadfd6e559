use serde::{Deserialize, Serialize, de, ser};

use super::piece::{Piece, PieceKind};

/// A single cell of the board grid.
///
/// Serialized as a compact u8 code so board snapshots stay small on the
/// wire: 0 = empty, 1..=7 = the seven piece kinds in catalog order,
/// 8 = garbage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Piece(PieceKind),
    Garbage,
}

impl Cell {
    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Piece(kind) => kind as u8 + 1,
            Cell::Garbage => 8,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Cell::Empty),
            8 => Some(Cell::Garbage),
            n if n <= 7 => Some(Cell::Piece(PieceKind::ALL[n as usize - 1])),
            _ => None,
        }
    }
}

impl Serialize for Cell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let code = u8::deserialize(deserializer)?;
        Cell::from_code(code)
            .ok_or_else(|| de::Error::custom(format!("invalid cell code: {code}")))
    }
}

/// The fixed-size playfield grid.
///
/// Rows are indexed top (0) to bottom (`ROWS - 1`); dimensions never change
/// after creation. A board is owned by exactly one game session and mutated
/// only through that session (merge, clear, garbage insertion).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    rows: [[Cell; Board::COLS]; Board::ROWS],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub const ROWS: usize = 20;
    pub const COLS: usize = 12;

    /// Fixed spawn column: `COLS / 2 - 1`.
    #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub const SPAWN_X: i32 = (Board::COLS / 2 - 1) as i32;

    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: [[Cell::Empty; Board::COLS]; Board::ROWS],
        }
    }

    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.rows[y][x]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell; Board::COLS]> + '_ {
        self.rows.iter()
    }

    /// True iff any filled cell of the piece maps outside the grid bounds
    /// (left, right, or below) or onto an occupied cell. Cells above the
    /// visible grid (`y < 0`) never collide, so pieces may spawn and kick
    /// above the playfield.
    #[must_use]
    #[expect(clippy::cast_possible_wrap)]
    pub fn collides(&self, piece: &Piece) -> bool {
        piece.cells().any(|(x, y)| {
            if y < 0 {
                return false;
            }
            if x < 0 || x >= Board::COLS as i32 || y >= Board::ROWS as i32 {
                return true;
            }
            !self.rows[y as usize][x as usize].is_empty()
        })
    }

    /// Merges the piece into the grid, writing its kind into each occupied
    /// cell. Cells still above the grid are discarded; the block-out check
    /// at the next spawn is what ends the game in that situation.
    #[expect(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn fill_piece(&mut self, piece: &Piece) {
        for (x, y) in piece.cells() {
            if y >= 0 && y < Board::ROWS as i32 && x >= 0 && x < Board::COLS as i32 {
                self.rows[y as usize][x as usize] = Cell::Piece(piece.kind());
            }
        }
    }

    /// Removes every full row in one pass, prepending that many empty rows
    /// at the top, and returns the number of rows cleared.
    pub fn clear_full_rows(&mut self) -> usize {
        let mut kept: Vec<[Cell; Board::COLS]> = self
            .rows
            .iter()
            .copied()
            .filter(|row| row.iter().any(|cell| cell.is_empty()))
            .collect();
        let cleared = Board::ROWS - kept.len();
        if cleared > 0 {
            let mut rows = vec![[Cell::Empty; Board::COLS]; cleared];
            rows.append(&mut kept);
            for (dst, src) in self.rows.iter_mut().zip(rows) {
                *dst = src;
            }
        }
        cleared
    }

    /// Shifts the grid up by `holes.len()` rows (discarding the topmost)
    /// and appends one garbage row per entry, filled except for the given
    /// hole column.
    pub fn add_garbage_rows(&mut self, holes: &[usize]) {
        for &hole in holes {
            self.rows.rotate_left(1);
            let bottom = &mut self.rows[Board::ROWS - 1];
            *bottom = [Cell::Garbage; Board::COLS];
            bottom[hole] = Cell::Empty;
        }
    }

    /// True iff any of the topmost `n` rows contains a filled cell.
    #[must_use]
    pub fn top_rows_occupied(&self, n: usize) -> bool {
        self.rows[..n.min(Board::ROWS)]
            .iter()
            .any(|row| row.iter().any(|cell| !cell.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::piece::Rotation;

    fn board_with_filled_rows(rows: &[usize]) -> Board {
        let mut board = Board::new();
        for &y in rows {
            board.rows[y] = [Cell::Garbage; Board::COLS];
        }
        board
    }

    #[test]
    fn cell_codes_round_trip() {
        for code in 0..=8 {
            let cell = Cell::from_code(code).unwrap();
            assert_eq!(cell.code(), code);
        }
        assert_eq!(Cell::from_code(9), None);
    }

    #[test]
    fn board_serializes_as_nested_arrays_of_codes() {
        let mut board = Board::new();
        board.rows[Board::ROWS - 1][0] = Cell::Piece(PieceKind::I);
        let json = serde_json::to_value(&board).unwrap();
        let rows = json.get("rows").unwrap().as_array().unwrap();
        assert_eq!(rows.len(), Board::ROWS);
        assert_eq!(rows[Board::ROWS - 1][0], serde_json::json!(1));
        assert_eq!(rows[0][0], serde_json::json!(0));

        let back: Board = serde_json::from_value(json).unwrap();
        assert_eq!(back, board);
    }

    #[test]
    fn collision_is_translation_consistent() {
        let board = Board::new();
        let piece = Piece::spawn(PieceKind::O);
        assert!(!board.collides(&piece));
        // Left wall: O occupies shape columns 0-1, so x = -1 pokes out.
        assert!(board.collides(&piece.translated(-(Board::SPAWN_X + 1), 0)));
        // Right wall.
        assert!(board.collides(&piece.translated(Board::COLS as i32, 0)));
        // Floor.
        assert!(board.collides(&piece.translated(0, Board::ROWS as i32)));
    }

    #[test]
    fn negative_y_never_collides() {
        let board = board_with_filled_rows(&[0]);
        // Entirely above the grid: never a collision, whatever the stack looks like.
        let piece = Piece::spawn(PieceKind::O).translated(0, -4);
        assert!(!board.collides(&piece));
    }

    #[test]
    fn collision_with_occupied_cells() {
        let mut board = Board::new();
        board.rows[1][Board::SPAWN_X as usize] = Cell::Garbage;
        // O at spawn covers rows 0-1 of columns SPAWN_X..SPAWN_X+2.
        assert!(board.collides(&Piece::spawn(PieceKind::O)));
    }

    #[test]
    fn clear_full_rows_removes_exactly_the_full_ones() {
        let mut board = board_with_filled_rows(&[5, 17]);
        board.rows[10][3] = Cell::Piece(PieceKind::T);

        assert_eq!(board.clear_full_rows(), 2);
        // One of the two cleared rows was above the marker, so it shifts
        // down by exactly one.
        assert_eq!(board.cell(3, 11), Cell::Piece(PieceKind::T));
        assert!(board.rows[0].iter().all(|c| c.is_empty()));
        assert!(board.rows[1].iter().all(|c| c.is_empty()));
        assert_eq!(board.clear_full_rows(), 0);
    }

    #[test]
    fn garbage_rows_have_exactly_one_hole() {
        let mut board = Board::new();
        board.rows[Board::ROWS - 1][0] = Cell::Piece(PieceKind::L);

        board.add_garbage_rows(&[4, 9]);

        for y in [Board::ROWS - 2, Board::ROWS - 1] {
            let holes = board.rows[y].iter().filter(|c| c.is_empty()).count();
            assert_eq!(holes, 1);
        }
        assert_eq!(board.cell(4, Board::ROWS - 2), Cell::Empty);
        assert_eq!(board.cell(9, Board::ROWS - 1), Cell::Empty);
        // The pre-existing stack shifted up by two.
        assert_eq!(board.cell(0, Board::ROWS - 3), Cell::Piece(PieceKind::L));
    }

    #[test]
    fn top_rows_occupied_detects_block_out_height() {
        let mut board = Board::new();
        assert!(!board.top_rows_occupied(2));
        board.rows[1][6] = Cell::Garbage;
        assert!(board.top_rows_occupied(2));
        assert!(!board.top_rows_occupied(1));
    }

    #[test]
    fn rotated_i_piece_collides_only_out_of_bounds() {
        let board = Board::new();
        let mut piece = Piece::spawn(PieceKind::I);
        piece = piece.rotated_clockwise();
        assert_eq!(piece.rotation(), Rotation::new(1));
        assert!(!board.collides(&piece));
    }
}
