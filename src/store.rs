//! Persistence seam for turn and unit records.
//!
//! Turns are keyed by user, units by turn. The store also owns the
//! per-(turn, faction) ordinal counters, which must hand out each number
//! exactly once even under concurrent unit creation.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::board::{Faction, ProvinceId, Turn, TurnId, Unit, UnitId, UserId};

/// Errors raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("turn {0} does not exist")]
    MissingTurn(TurnId),

    #[error("user '{0}' already has a turn")]
    DuplicateTurn(UserId),

    #[error("unit {0} does not exist")]
    MissingUnit(UnitId),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage operations the game core relies on.
pub trait GameStore: Send + Sync {
    fn turn_for_user(&self, user: &UserId) -> Result<Option<Turn>, StoreError>;
    fn turn(&self, id: TurnId) -> Result<Option<Turn>, StoreError>;
    /// Creates turn 1 for `user` with the given allied provinces.
    fn create_turn(&self, user: &UserId, controlled: Vec<ProvinceId>) -> Result<Turn, StoreError>;
    fn save_turn(&self, turn: &Turn) -> Result<(), StoreError>;

    /// Units of a turn in creation order.
    fn units(&self, turn: TurnId) -> Result<Vec<Unit>, StoreError>;
    fn unit(&self, id: UnitId) -> Result<Option<Unit>, StoreError>;
    fn next_unit_id(&self) -> Result<UnitId, StoreError>;
    /// Increments and returns the counter for `(turn, faction)`.
    fn next_ordinal(&self, turn: TurnId, faction: Faction) -> Result<u32, StoreError>;
    fn insert_unit(&self, unit: Unit) -> Result<(), StoreError>;
    fn save_unit(&self, unit: &Unit) -> Result<(), StoreError>;
    /// Returns false if the unit did not exist.
    fn delete_unit(&self, id: UnitId) -> Result<bool, StoreError>;
}

#[derive(Default)]
struct Tables {
    turns: HashMap<TurnId, Turn>,
    by_user: HashMap<UserId, TurnId>,
    units: BTreeMap<UnitId, Unit>,
    ordinals: HashMap<(TurnId, Faction), u32>,
}

/// In-process store backed by hash maps behind a single mutex.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    next_turn: AtomicU64,
    next_unit: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GameStore for MemoryStore {
    fn turn_for_user(&self, user: &UserId) -> Result<Option<Turn>, StoreError> {
        let t = self.tables();
        Ok(t.by_user.get(user).and_then(|id| t.turns.get(id)).cloned())
    }

    fn turn(&self, id: TurnId) -> Result<Option<Turn>, StoreError> {
        Ok(self.tables().turns.get(&id).cloned())
    }

    fn create_turn(&self, user: &UserId, controlled: Vec<ProvinceId>) -> Result<Turn, StoreError> {
        let mut t = self.tables();
        if t.by_user.contains_key(user) {
            return Err(StoreError::DuplicateTurn(user.clone()));
        }
        let id = TurnId(self.next_turn.fetch_add(1, Ordering::Relaxed) + 1);
        let turn = Turn::new(id, user.clone(), controlled);
        t.by_user.insert(user.clone(), id);
        t.turns.insert(id, turn.clone());
        Ok(turn)
    }

    fn save_turn(&self, turn: &Turn) -> Result<(), StoreError> {
        let mut t = self.tables();
        match t.turns.get_mut(&turn.id) {
            Some(slot) => {
                *slot = turn.clone();
                Ok(())
            }
            None => Err(StoreError::MissingTurn(turn.id)),
        }
    }

    fn units(&self, turn: TurnId) -> Result<Vec<Unit>, StoreError> {
        Ok(self
            .tables()
            .units
            .values()
            .filter(|u| u.turn_id == turn)
            .cloned()
            .collect())
    }

    fn unit(&self, id: UnitId) -> Result<Option<Unit>, StoreError> {
        Ok(self.tables().units.get(&id).cloned())
    }

    fn next_unit_id(&self) -> Result<UnitId, StoreError> {
        Ok(UnitId(self.next_unit.fetch_add(1, Ordering::Relaxed) + 1))
    }

    fn next_ordinal(&self, turn: TurnId, faction: Faction) -> Result<u32, StoreError> {
        let mut t = self.tables();
        let seq = t.ordinals.entry((turn, faction)).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }

    fn insert_unit(&self, unit: Unit) -> Result<(), StoreError> {
        let mut t = self.tables();
        if !t.turns.contains_key(&unit.turn_id) {
            return Err(StoreError::MissingTurn(unit.turn_id));
        }
        t.units.insert(unit.id, unit);
        Ok(())
    }

    fn save_unit(&self, unit: &Unit) -> Result<(), StoreError> {
        let mut t = self.tables();
        match t.units.get_mut(&unit.id) {
            Some(slot) => {
                *slot = unit.clone();
                Ok(())
            }
            None => Err(StoreError::MissingUnit(unit.id)),
        }
    }

    fn delete_unit(&self, id: UnitId) -> Result<bool, StoreError> {
        Ok(self.tables().units.remove(&id).is_some())
    }
}
