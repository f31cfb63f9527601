//! Frontline simulation library.
//!
//! Exposes the province graph and board types, the unit registry, the
//! pathfinder, battle and retreat resolution, the turn state machine and
//! the line protocol for use by integration tests and the binaries.

pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod hooks;
pub mod movegen;
pub mod protocol;
pub mod registry;
pub mod resolve;
pub mod selfplay;
pub mod store;

pub use error::{GameError, Result};
