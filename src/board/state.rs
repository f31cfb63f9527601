//! Board view: one turn's position on the static map.
//!
//! Couples the province graph, the turn record and the turn's units for
//! occupancy and control queries. Holds borrows only; mutation goes through
//! the unit registry and the turn record.

use std::collections::HashSet;

use serde::Serialize;

use super::adjacency::ProvinceGraph;
use super::province::{ProvinceId, ProvinceStatus};
use super::turn::Turn;
use super::unit::{Faction, Unit, UnitId};

/// Read-only position of a single turn.
#[derive(Debug, Clone, Copy)]
pub struct BoardView<'a> {
    pub graph: &'a ProvinceGraph,
    pub turn: &'a Turn,
    pub units: &'a [Unit],
}

impl<'a> BoardView<'a> {
    pub fn new(graph: &'a ProvinceGraph, turn: &'a Turn, units: &'a [Unit]) -> Self {
        BoardView { graph, turn, units }
    }

    /// The unit occupying a province, if any.
    pub fn unit_at(&self, province: &str) -> Option<&'a Unit> {
        self.units.iter().find(|u| u.position == province)
    }

    pub fn unit(&self, id: UnitId) -> Option<&'a Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn is_empty(&self, province: &str) -> bool {
        self.unit_at(province).is_none()
    }

    pub fn controller(&self, province: &str) -> Faction {
        self.turn.controller_of(province)
    }

    /// Provinces holding any unit; impassable for pathfinding.
    pub fn occupied(&self) -> HashSet<ProvinceId> {
        self.units.iter().map(|u| u.position.clone()).collect()
    }

    pub fn units_of(&self, faction: Faction) -> impl Iterator<Item = &'a Unit> + 'a {
        self.units.iter().filter(move |u| u.faction == faction)
    }

    /// Every province with its controller for this turn.
    pub fn province_statuses(&self) -> Vec<ProvinceStatus> {
        self.graph
            .all_provinces()
            .iter()
            .map(|p| ProvinceStatus {
                id: p.id.clone(),
                name: p.name.clone(),
                province_type: p.province_type,
                controller: self.controller(p.id.as_str()),
            })
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            armies: self.units.to_vec(),
            provinces: self.province_statuses(),
            turn_number: self.turn.current_turn,
            turn_ending: self.turn.is_ending,
        }
    }
}

/// Full refreshed view returned by every accepted operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub armies: Vec<Unit>,
    pub provinces: Vec<ProvinceStatus>,
    pub turn_number: u32,
    pub turn_ending: bool,
}

impl Snapshot {
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.armies.iter().find(|u| u.id == id)
    }

    pub fn controller(&self, province: &str) -> Option<Faction> {
        self.provinces
            .iter()
            .find(|p| p.id == province)
            .map(|p| p.controller)
    }
}
