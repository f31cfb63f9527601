//! Board representation and game-state types.
//!
//! Contains the core data structures for provinces, the adjacency graph,
//! divisions, the per-user turn record and the combined board view.

pub mod adjacency;
pub mod province;
pub mod state;
pub mod turn;
pub mod unit;

pub use adjacency::{MapError, ProvinceGraph, BUNDLED_ADJACENCY, BUNDLED_PROVINCES};
pub use province::{Province, ProvinceId, ProvinceStatus, ProvinceType};
pub use state::{BoardView, Snapshot};
pub use turn::{Turn, TurnId, TurnPhase, UserId};
pub use unit::{division_name, ordinal, Faction, Unit, UnitId, UnitType, FULL_HEALTH};
