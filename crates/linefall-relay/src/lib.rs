//! Room-based matchmaking relay for two-player matches.
//!
//! Connection tasks parse frames and forward them as commands into a
//! single coordinator task that owns the [`Lobby`]. The relay never
//! simulates gameplay; it stores last-known snapshots and routes
//! messages between the two players of a room and its spectators.

pub use self::{config::*, error::*, lobby::*, room::*};

pub mod server;

pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod lobby;
pub(crate) mod room;
