//! Wire types shared by the relay server and the game client.
//!
//! Messages are JSON objects tagged by a `"type"` field, with camelCase
//! variant and field names. Board snapshots reuse the engine's compact
//! cell encoding.

pub use self::{message::*, room::*};

pub(crate) mod message;
pub(crate) mod room;
