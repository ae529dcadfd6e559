use std::collections::VecDeque;

use arrayvec::ArrayVec;
use rand::{SeedableRng as _, prelude::StdRng, seq::SliceRandom};

use crate::core::PieceKind;

/// How many upcoming pieces are exposed as the next-piece preview.
pub const PREVIEW_LEN: usize = 3;

/// Supplies pieces using the 7-bag system.
///
/// Every window of seven consecutive draws contains each kind exactly
/// once, which bounds droughts while staying random. The queue refills
/// itself so that a preview of [`PREVIEW_LEN`] pieces is always
/// available.
#[derive(Debug, Clone)]
pub struct PieceQueue {
    rng: StdRng,
    bag: VecDeque<PieceKind>,
}

impl Default for PieceQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceQueue {
    /// Creates a queue seeded from the OS random source.
    #[must_use]
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Like [`Self::new`], but deterministic for a given seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        let mut this = Self {
            rng,
            bag: VecDeque::with_capacity(PieceKind::LEN * 2),
        };
        this.fill_bag();
        this
    }

    /// Tops the bag up with shuffled sets of 7 until at least 8 pieces
    /// remain, so one `pop_next` still leaves a full preview behind.
    fn fill_bag(&mut self) {
        while self.bag.len() <= PieceKind::LEN {
            let mut new_bag = PieceKind::ALL;
            new_bag.shuffle(&mut self.rng);
            self.bag.extend(new_bag);
        }
    }

    /// Draws the next piece, refilling the bag as needed.
    ///
    /// # Panics
    ///
    /// Panics if the bag is empty, which the refill logic prevents.
    pub fn pop_next(&mut self) -> PieceKind {
        self.fill_bag();
        self.bag.pop_front().expect("piece bag should never be empty")
    }

    /// The upcoming pieces, in draw order, truncated to the preview depth.
    #[must_use]
    pub fn preview(&self) -> ArrayVec<PieceKind, PREVIEW_LEN> {
        self.bag.iter().copied().take(PREVIEW_LEN).collect()
    }
}
