//! Retreat resolution.
//!
//! A displaced unit falls back to a random legal destination. With none
//! available it is destroyed. Neither branch is an error.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crate::board::{BoardView, ProvinceGraph, ProvinceId, Turn, Unit, UnitId};
use crate::movegen::retreat_destinations;
use crate::registry::UnitRegistry;
use crate::store::StoreError;

/// Where a retreating unit ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetreatOutcome {
    Relocated { unit: UnitId, to: ProvinceId },
    Destroyed { unit: UnitId },
}

/// A retreat and the turn's refreshed unit list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retreat {
    pub outcome: RetreatOutcome,
    pub units: Vec<Unit>,
}

/// Retreats `unit` into a uniformly random empty province of its own
/// faction next to its position, or deletes it when there is none.
///
/// Only storage failures are errors.
pub fn retreat(
    unit: &Unit,
    turn: &Turn,
    graph: &ProvinceGraph,
    registry: &UnitRegistry,
    rng: &mut impl Rng,
) -> Result<Retreat, StoreError> {
    let units = registry.list_units(turn.id)?;
    let view = BoardView::new(graph, turn, &units);
    let candidates = retreat_destinations(&view, unit);

    let outcome = match candidates.choose(rng) {
        Some(dest) => {
            let mut moved = unit.clone();
            registry.relocate(&mut moved, dest.clone())?;
            info!(unit = %unit.name, from = %unit.position, to = %dest, "retreated");
            RetreatOutcome::Relocated {
                unit: unit.id,
                to: dest.clone(),
            }
        }
        None => {
            registry.delete_unit(unit.id)?;
            info!(unit = %unit.name, at = %unit.position, "destroyed, no line of retreat");
            RetreatOutcome::Destroyed { unit: unit.id }
        }
    };

    Ok(Retreat {
        outcome,
        units: registry.list_units(turn.id)?,
    })
}
