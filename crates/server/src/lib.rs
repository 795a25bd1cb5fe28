//! Room server - multiplayer rooms over line-delimited JSON
//!
//! Clients run their own engines and report a snapshot whenever a piece
//! locks. The server trusts those snapshots: it serves the next piece from the
//! room's shared sequence, relays garbage lines derived from score deltas and
//! decides when a game is over.
//!
//! # Module Structure
//!
//! - [`protocol`]: inbound/outbound message types and line parsing
//! - [`room`]: one room's roster, status and piece stream
//! - [`garbage`]: score delta to garbage lines, fan-out to opponents
//! - [`registry`]: every room transition, as a pure step returning envelopes
//! - [`runtime`]: the single coordinator task that owns the registry
//! - [`server`]: TCP listener, per-connection reader and writer tasks
//!
//! # Example
//!
//! ```no_run
//! use blockfall_server::{run_server, ServerConfig};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! run_server(ServerConfig::from_env(), None).await
//! # }
//! ```

pub mod garbage;
pub mod protocol;
pub mod registry;
pub mod room;
pub mod runtime;
pub mod server;

pub use garbage::garbage_lines_owed;
pub use protocol::{
    parse_message, ClientMessage, ConnectionId, Envelope, ProtocolError, RoomStatus, RoomView,
    ServerMessage,
};
pub use registry::{RoomError, RoomRegistry};
pub use room::{Player, Room};
pub use runtime::{run_coordinator, Coordinator, InboundEvent, InboundPayload};
pub use server::{run_server, ServerConfig};
