//! Game rules: the 7-bag piece queue and the per-player session state
//! machine driving moves, rotation, locking, scoring, and garbage.

pub use self::{piece_queue::*, session::*};

pub(crate) mod piece_queue;
pub(crate) mod session;
