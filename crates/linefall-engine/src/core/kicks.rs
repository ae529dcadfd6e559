use super::piece::{PieceKind, Rotation};

/// Five wall-kick offset candidates for one directed rotation transition.
///
/// Offsets are applied to the pre-rotation anchor as `(x + dx, y - dy)`:
/// positive `dy` moves the piece up, matching SRS table conventions.
pub type KickOffsets = [(i32, i32); 5];

/// Returns the kick candidates for the directed transition `from -> to`.
///
/// The I piece uses its own table; all other kinds share one. Only the
/// eight quarter-turn transitions are meaningful; a degenerate transition
/// falls back to the identity-only first candidate set.
#[must_use]
pub fn kick_offsets(kind: PieceKind, from: Rotation, to: Rotation) -> &'static KickOffsets {
    let table = if kind == PieceKind::I {
        &I_KICKS
    } else {
        &NORMAL_KICKS
    };
    &table[transition_index(from, to)]
}

fn transition_index(from: Rotation, to: Rotation) -> usize {
    match (from.index(), to.index()) {
        (0, 1) => 0,
        (1, 2) => 1,
        (2, 3) => 2,
        (3, 0) => 3,
        (1, 0) => 4,
        (2, 1) => 5,
        (3, 2) => 6,
        (0, 3) => 7,
        _ => 0,
    }
}

// Transition order: 0->1, 1->2, 2->3, 3->0, 1->0, 2->1, 3->2, 0->3.
const I_KICKS: [KickOffsets; 8] = [
    [(0, 0), (-2, 0), (1, 0), (-2, -1), (1, 2)],
    [(0, 0), (-1, 0), (2, 0), (-1, 2), (2, -1)],
    [(0, 0), (2, 0), (-1, 0), (2, 1), (-1, -2)],
    [(0, 0), (1, 0), (-2, 0), (1, -2), (-2, 1)],
    [(0, 0), (2, 0), (-1, 0), (2, 1), (-1, -2)],
    [(0, 0), (1, 0), (-2, 0), (1, -2), (-2, 1)],
    [(0, 0), (-2, 0), (1, 0), (-2, -1), (1, 2)],
    [(0, 0), (-1, 0), (2, 0), (-1, 2), (2, -1)],
];

const NORMAL_KICKS: [KickOffsets; 8] = [
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
];
