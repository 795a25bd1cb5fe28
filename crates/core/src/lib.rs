//! Core game logic module - pure, deterministic, and testable
//!
//! This crate contains every game rule shared by the room server and the
//! clients. It has **no dependencies** on networking or I/O: each engine
//! transition is a pure function from one snapshot to the next, so the same
//! code drives the server's bookkeeping, the bot and any client prediction.
//!
//! # Module Structure
//!
//! - [`catalog`]: the seven shapes, spawn positions and rotation delta tables
//! - [`board`]: 10x20 grid with merge, line clearing and garbage injection
//! - [`engine`]: the per-player simulation snapshot and its transitions
//! - [`sequencer`]: a room's shared, append-only piece stream
//! - [`session`]: client-side drivers for versus and solo play
//!
//! # Game Rules
//!
//! - **Uniform draws**: every piece is an independent uniform pick among seven kinds
//! - **Table rotation**: fixed per-state deltas, no wall kicks; invalid rotations are rejected
//! - **Scoring**: `100` per cleared row plus a flat `10` on every lock
//! - **Garbage**: indestructible rows pushed in from the bottom; they never clear
//!
//! # Example
//!
//! ```
//! use blockfall_core::{Engine, PieceSequencer, Piece};
//!
//! let mut seq = PieceSequencer::with_seed(12345, 100);
//! let mut engine = Engine::new().spawn_piece(Piece::spawn(seq.piece_at(0)));
//!
//! // Let the piece fall until it locks
//! while engine.piece.is_some() {
//!     engine = engine.translate_down();
//! }
//! assert_eq!(engine.score, 10);
//! ```

pub mod board;
pub mod catalog;
pub mod engine;
pub mod sequencer;
pub mod session;

pub use blockfall_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use catalog::{rotation_delta, spawn_blocks, Piece};
pub use engine::{Engine, SettlePolicy};
pub use sequencer::{random_kind, PieceSequencer};
pub use session::{Outcome, Pacer, SoloGame, SoloTick, VersusSession};
