//! Unit registry: lifecycle of divisions.
//!
//! The registry is the only writer of unit records. Battle and retreat code
//! mutate a unit in memory and hand it back here to be persisted.

use std::sync::Arc;

use tracing::debug;

use crate::board::{division_name, Faction, ProvinceId, TurnId, Unit, UnitId, UnitType, FULL_HEALTH};
use crate::store::{GameStore, StoreError};

/// Creates, moves, lists and deletes divisions through a [`GameStore`].
#[derive(Clone)]
pub struct UnitRegistry {
    store: Arc<dyn GameStore>,
}

impl UnitRegistry {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        UnitRegistry { store }
    }

    /// Creates a division at full health with its type's movement and the
    /// next ordinal for `(turn, faction)`. Fails if the turn does not exist.
    pub fn create_unit(
        &self,
        turn: TurnId,
        unit_type: UnitType,
        faction: Faction,
        position: ProvinceId,
    ) -> Result<Unit, StoreError> {
        if self.store.turn(turn)?.is_none() {
            return Err(StoreError::MissingTurn(turn));
        }
        let id = self.store.next_unit_id()?;
        let unit_number = self.store.next_ordinal(turn, faction)?;
        let unit = Unit {
            id,
            turn_id: turn,
            unit_type,
            faction,
            position,
            movement: unit_type.base_movement(),
            health: FULL_HEALTH,
            unit_number,
            name: division_name(unit_number, faction, unit_type),
        };
        self.store.insert_unit(unit.clone())?;
        debug!(unit = %unit.name, at = %unit.position, "created division");
        Ok(unit)
    }

    /// Moves a unit one step: sets its position and spends one movement
    /// point. Adjacency and occupancy are the caller's responsibility.
    pub fn move_unit(&self, unit: &mut Unit, destination: ProvinceId) -> Result<(), StoreError> {
        unit.position = destination;
        unit.spend_movement();
        self.store.save_unit(unit)
    }

    /// Changes a unit's position without touching its movement.
    pub fn relocate(&self, unit: &mut Unit, destination: ProvinceId) -> Result<(), StoreError> {
        unit.position = destination;
        self.store.save_unit(unit)
    }

    pub fn save(&self, unit: &Unit) -> Result<(), StoreError> {
        self.store.save_unit(unit)
    }

    pub fn list_units(&self, turn: TurnId) -> Result<Vec<Unit>, StoreError> {
        self.store.units(turn)
    }

    pub fn get(&self, id: UnitId) -> Result<Option<Unit>, StoreError> {
        self.store.unit(id)
    }

    /// Permanently removes a unit.
    pub fn delete_unit(&self, id: UnitId) -> Result<bool, StoreError> {
        self.store.delete_unit(id)
    }

    /// Restores every unit of the turn to its type's movement.
    pub fn reset_movement(&self, turn: TurnId) -> Result<Vec<Unit>, StoreError> {
        let mut units = self.store.units(turn)?;
        for u in &mut units {
            u.reset_movement();
            self.store.save_unit(u)?;
        }
        Ok(units)
    }
}
