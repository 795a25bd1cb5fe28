//! Blockfall (workspace facade crate).
//!
//! Exposes `blockfall::{core, server, types}` while the implementation lives in
//! dedicated crates under `crates/`.

pub use blockfall_core as core;
pub use blockfall_server as server;
pub use blockfall_types as types;
