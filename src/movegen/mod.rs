//! Legal move generation.
//!
//! Enumerates where a division may go this phase, shortest-step routes
//! across the province graph, and retreat destinations.

pub mod path;
pub mod retreat;

use rand::Rng;

use crate::board::{BoardView, Faction, ProvinceId, Unit, UnitId};
use crate::resolve::battle::matchup_allowed;

pub use path::{distance, next_step};
pub use retreat::retreat_destinations;

/// What entering an adjacent province would mean for a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveKind {
    /// The province is empty.
    Advance,
    /// A friendly unit is there; the two swap places.
    Swap(UnitId),
    /// An opposing unit is there; entering starts a battle.
    Attack(UnitId),
}

/// Every adjacent province `unit` may enter right now, with what it means.
///
/// Empty when the unit has no movement left. Attacks forbidden by the
/// matchup rule are left out.
pub fn legal_moves(view: &BoardView<'_>, unit: &Unit) -> Vec<(ProvinceId, MoveKind)> {
    if unit.movement == 0 {
        return Vec::new();
    }
    view.graph
        .adjacency(unit.position.as_str())
        .iter()
        .filter_map(|dest| {
            let kind = match view.unit_at(dest.as_str()) {
                None => MoveKind::Advance,
                Some(other) if other.faction == unit.faction => MoveKind::Swap(other.id),
                Some(other) if matchup_allowed(unit, other) => MoveKind::Attack(other.id),
                Some(_) => return None,
            };
            Some((dest.clone(), kind))
        })
        .collect()
}

/// Picks a random legal move for a random allied unit that can still move.
pub fn random_allied_move(
    view: &BoardView<'_>,
    rng: &mut impl Rng,
) -> Option<(UnitId, ProvinceId, MoveKind)> {
    let mut options = Vec::new();
    for unit in view.units_of(Faction::Allied) {
        for (dest, kind) in legal_moves(view, unit) {
            options.push((unit.id, dest, kind));
        }
    }
    if options.is_empty() {
        return None;
    }
    let idx = rng.gen_range(0..options.len());
    Some(options.swap_remove(idx))
}
