//! Client-side glue between a local game engine and the relay.
//!
//! [`SyncAdapter`] owns the local [`linefall_engine::GameSession`],
//! mirrors the opponent's relayed state, and translates engine events
//! into wire messages. [`NetClient`] drives the websocket transport
//! with automatic reconnection.

pub use self::{adapter::*, error::*, net::*};

pub(crate) mod adapter;
pub(crate) mod error;
pub(crate) mod net;
