//! The per-user turn record.
//!
//! A turn owns the allied controlled-province set and the ending-phase
//! bookkeeping. Province control is never stored on provinces: a province
//! is allied exactly when its id is in `controlled_provinces`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::province::ProvinceId;
use super::unit::{Faction, UnitId};

/// Identifier of a turn record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(pub u64);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the player owning a turn, as issued by the token service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

/// Where a turn is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPhase {
    /// The player moves and fights.
    Active,
    /// Enemy units act one per call.
    Ending,
}

/// Game state container for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub user_id: UserId,
    pub current_turn: u32,
    pub is_ending: bool,
    pub controlled_provinces: Vec<ProvinceId>,
    pub processed_unit_ids: Vec<UnitId>,
}

impl Turn {
    /// A fresh turn 1 in the active phase.
    pub fn new(id: TurnId, user_id: UserId, controlled: Vec<ProvinceId>) -> Self {
        let mut turn = Turn {
            id,
            user_id,
            current_turn: 1,
            is_ending: false,
            controlled_provinces: Vec::with_capacity(controlled.len()),
            processed_unit_ids: Vec::new(),
        };
        for p in controlled {
            turn.control(p);
        }
        turn
    }

    pub fn phase(&self) -> TurnPhase {
        if self.is_ending {
            TurnPhase::Ending
        } else {
            TurnPhase::Active
        }
    }

    pub fn is_controlled(&self, province: &str) -> bool {
        self.controlled_provinces.iter().any(|p| p == province)
    }

    /// The derived controller of a province for this turn.
    pub fn controller_of(&self, province: &str) -> Faction {
        if self.is_controlled(province) {
            Faction::Allied
        } else {
            Faction::Enemy
        }
    }

    /// Adds a province to the allied set. Returns false if already present.
    pub fn control(&mut self, province: ProvinceId) -> bool {
        if self.is_controlled(province.as_str()) {
            return false;
        }
        self.controlled_provinces.push(province);
        true
    }

    /// Removes a province from the allied set. Returns false if absent.
    pub fn release(&mut self, province: &str) -> bool {
        let before = self.controlled_provinces.len();
        self.controlled_provinces.retain(|p| p != province);
        self.controlled_provinces.len() != before
    }

    /// Hands a province to `faction`.
    pub fn transfer(&mut self, province: &ProvinceId, faction: Faction) {
        match faction {
            Faction::Allied => {
                self.control(province.clone());
            }
            Faction::Enemy => {
                self.release(province.as_str());
            }
        }
    }

    pub fn is_processed(&self, unit: UnitId) -> bool {
        self.processed_unit_ids.contains(&unit)
    }

    pub fn mark_processed(&mut self, unit: UnitId) {
        if !self.is_processed(unit) {
            self.processed_unit_ids.push(unit);
        }
    }

    /// Enters the ending phase.
    pub fn begin_ending(&mut self) {
        self.is_ending = true;
    }

    /// Leaves the ending phase and starts the next turn.
    pub fn roll_over(&mut self) {
        self.is_ending = false;
        self.current_turn += 1;
        self.processed_unit_ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn() -> Turn {
        Turn::new(
            TurnId(1),
            UserId::from("u"),
            vec!["a".into(), "b".into(), "a".into()],
        )
    }

    #[test]
    fn new_turn_starts_active_at_one() {
        let t = turn();
        assert_eq!(t.current_turn, 1);
        assert_eq!(t.phase(), TurnPhase::Active);
        assert!(t.processed_unit_ids.is_empty());
    }

    #[test]
    fn duplicate_controlled_ids_collapse() {
        let t = turn();
        assert_eq!(t.controlled_provinces.len(), 2);
    }

    #[test]
    fn controller_is_derived_from_set() {
        let t = turn();
        assert_eq!(t.controller_of("a"), Faction::Allied);
        assert_eq!(t.controller_of("c"), Faction::Enemy);
    }

    #[test]
    fn control_and_release() {
        let mut t = turn();
        assert!(t.control("c".into()));
        assert!(!t.control("c".into()));
        assert!(t.release("a"));
        assert!(!t.release("a"));
        assert_eq!(t.controller_of("a"), Faction::Enemy);
        assert_eq!(t.controller_of("c"), Faction::Allied);
    }

    #[test]
    fn transfer_follows_faction() {
        let mut t = turn();
        t.transfer(&"c".into(), Faction::Allied);
        assert!(t.is_controlled("c"));
        t.transfer(&"c".into(), Faction::Enemy);
        assert!(!t.is_controlled("c"));
    }

    #[test]
    fn roll_over_clears_processed() {
        let mut t = turn();
        t.begin_ending();
        t.mark_processed(UnitId(4));
        t.mark_processed(UnitId(4));
        assert_eq!(t.processed_unit_ids, vec![UnitId(4)]);
        assert_eq!(t.phase(), TurnPhase::Ending);

        t.roll_over();
        assert_eq!(t.current_turn, 2);
        assert!(!t.is_ending);
        assert!(t.processed_unit_ids.is_empty());
    }
}
