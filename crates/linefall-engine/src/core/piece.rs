use serde::{Deserialize, Serialize};

use super::board::Board;

/// Enum representing the type of piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// J-piece.
    J = 1,
    /// L-piece.
    L = 2,
    /// O-piece.
    O = 3,
    /// S-piece.
    S = 4,
    /// T-piece.
    T = 5,
    /// Z-piece.
    Z = 6,
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    /// All kinds in catalog order.
    pub const ALL: [PieceKind; PieceKind::LEN] = [
        PieceKind::I,
        PieceKind::J,
        PieceKind::L,
        PieceKind::O,
        PieceKind::S,
        PieceKind::T,
        PieceKind::Z,
    ];

    /// Rotation-0 shape matrix for this kind.
    #[must_use]
    pub const fn base_shape(self) -> Shape {
        BASE_SHAPES[self as usize]
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::T => 'T',
            PieceKind::Z => 'Z',
        }
    }
}

/// Rotation state of a piece.
///
/// One of four states: `0` (spawn), `1` (90° clockwise), `2` (180°),
/// `3` (270° clockwise). Rotation operations wrap around modulo 4.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Rotation(u8);

impl Rotation {
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Rotation(index % 4)
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn clockwise(self) -> Self {
        Rotation((self.0 + 1) % 4)
    }

    #[must_use]
    pub const fn counterclockwise(self) -> Self {
        Rotation((self.0 + 3) % 4)
    }
}

/// A piece shape within its bounding box.
///
/// `size` is the effective bounding box edge (4 for I, 2 for O, 3 for the
/// rest); cells outside `size` are always empty. Rotations are computed by
/// applying the 90° transform, not looked up from precomputed tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    size: usize,
    cells: [[bool; 4]; 4],
}

impl Shape {
    const fn new(size: usize, cells: [[bool; 4]; 4]) -> Self {
        Self { size, cells }
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub const fn is_filled(&self, x: usize, y: usize) -> bool {
        self.cells[y][x]
    }

    /// The shape rotated 90° clockwise within its bounding box.
    #[must_use]
    pub const fn rotated_clockwise(&self) -> Self {
        let mut cells = [[false; 4]; 4];
        let mut y = 0;
        while y < self.size {
            let mut x = 0;
            while x < self.size {
                cells[y][x] = self.cells[self.size - 1 - x][y];
                x += 1;
            }
            y += 1;
        }
        Self::new(self.size, cells)
    }
}

/// Computes the shape matrix for a kind at a given rotation by applying the
/// 90° transform `rotation` times to the rotation-0 shape.
#[must_use]
pub fn piece_matrix(kind: PieceKind, rotation: Rotation) -> Shape {
    let mut shape = kind.base_shape();
    for _ in 0..rotation.index() {
        shape = shape.rotated_clockwise();
    }
    shape
}

const BASE_SHAPES: [Shape; PieceKind::LEN] = {
    const C: bool = true;
    const E: bool = false;
    [
        // I-piece
        Shape::new(4, [[E; 4], [C, C, C, C], [E; 4], [E; 4]]),
        // J-piece
        Shape::new(3, [[C, E, E, E], [C, C, C, E], [E; 4], [E; 4]]),
        // L-piece
        Shape::new(3, [[E, E, C, E], [C, C, C, E], [E; 4], [E; 4]]),
        // O-piece
        Shape::new(2, [[C, C, E, E], [C, C, E, E], [E; 4], [E; 4]]),
        // S-piece
        Shape::new(3, [[E, C, C, E], [C, C, E, E], [E; 4], [E; 4]]),
        // T-piece
        Shape::new(3, [[E, C, E, E], [C, C, C, E], [E; 4], [E; 4]]),
        // Z-piece
        Shape::new(3, [[C, C, E, E], [E, C, C, E], [E; 4], [E; 4]]),
    ]
};

/// A falling piece: kind, rotation state, current shape matrix, and
/// board-relative anchor position.
///
/// # Coordinate system
///
/// - (0, 0) is the top-left of the board; x grows rightward, y downward.
/// - `y` may be negative while a freshly spawned or kicked piece still sits
///   above the visible grid; cells above the grid never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    rotation: Rotation,
    shape: Shape,
    x: i32,
    y: i32,
}

impl Piece {
    /// Instantiates a piece at the fixed spawn position, rotation 0.
    #[must_use]
    pub fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            rotation: Rotation::default(),
            shape: kind.base_shape(),
            x: Board::SPAWN_X,
            y: 0,
        }
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Absolute board coordinates of every filled cell of the shape.
    #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let size = self.shape.size();
        (0..size).flat_map(move |dy| {
            (0..size)
                .filter(move |&dx| self.shape.is_filled(dx, dy))
                .map(move |dx| (self.x + dx as i32, self.y + dy as i32))
        })
    }

    #[must_use]
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// The piece with shape and rotation index advanced one step clockwise,
    /// position unchanged. Kick resolution is the caller's concern.
    #[must_use]
    pub fn rotated_clockwise(&self) -> Self {
        Self {
            rotation: self.rotation.clockwise(),
            shape: self.shape.rotated_clockwise(),
            ..*self
        }
    }

    /// Counterclockwise counterpart of [`Piece::rotated_clockwise`].
    #[must_use]
    pub fn rotated_counterclockwise(&self) -> Self {
        // Three clockwise quarter turns; the shape transform only rotates one way.
        let mut shape = self.shape;
        for _ in 0..3 {
            shape = shape.rotated_clockwise();
        }
        Self {
            rotation: self.rotation.counterclockwise(),
            shape,
            ..*self
        }
    }

    /// The piece dropped straight down to its resting position.
    #[must_use]
    pub fn dropped(&self, board: &Board) -> Self {
        let mut piece = *self;
        loop {
            let below = piece.translated(0, 1);
            if board.collides(&below) {
                return piece;
            }
            piece = below;
        }
    }
}
