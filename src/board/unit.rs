//! Unit types, factions and divisions.
//!
//! A division belongs to exactly one turn and sits in exactly one province.
//! Its ordinal name ("2nd Enemy Armor Division") is fixed at creation.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::province::ProvinceId;
use super::turn::TurnId;

/// Starting health of every new division.
pub const FULL_HEALTH: u32 = 100;

/// The kind of a division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Infantry,
    Armor,
}

impl UnitType {
    /// Movement points granted at the start of each ending phase.
    pub const fn base_movement(self) -> u32 {
        match self {
            UnitType::Infantry => 1,
            UnitType::Armor => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            UnitType::Infantry => "infantry",
            UnitType::Armor => "armor",
        }
    }

    pub fn parse(s: &str) -> Option<UnitType> {
        match s {
            "infantry" => Some(UnitType::Infantry),
            "armor" => Some(UnitType::Armor),
            _ => None,
        }
    }

    const fn title(self) -> &'static str {
        match self {
            UnitType::Infantry => "Infantry",
            UnitType::Armor => "Armor",
        }
    }
}

/// The two sides of the war.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    /// Player controlled.
    Allied,
    /// AI controlled.
    Enemy,
}

impl Faction {
    pub const fn opponent(self) -> Faction {
        match self {
            Faction::Allied => Faction::Enemy,
            Faction::Enemy => Faction::Allied,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Faction::Allied => "allied",
            Faction::Enemy => "enemy",
        }
    }

    pub fn parse(s: &str) -> Option<Faction> {
        match s {
            "allied" => Some(Faction::Allied),
            "enemy" => Some(Faction::Enemy),
            _ => None,
        }
    }

    const fn title(self) -> &'static str {
        match self {
            Faction::Allied => "Allied",
            Faction::Enemy => "Enemy",
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a division, unique across all turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A division on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub turn_id: TurnId,
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    pub faction: Faction,
    pub position: ProvinceId,
    pub movement: u32,
    pub health: u32,
    /// Faction-scoped sequence number within the turn, starting at 1.
    pub unit_number: u32,
    pub name: String,
}

impl Unit {
    pub fn is_allied(&self) -> bool {
        self.faction == Faction::Allied
    }

    pub fn is_enemy(&self) -> bool {
        self.faction == Faction::Enemy
    }

    /// Spends one movement point if any remain. Returns false when exhausted.
    pub fn spend_movement(&mut self) -> bool {
        if self.movement > 0 {
            self.movement -= 1;
            true
        } else {
            false
        }
    }

    /// Restores movement to the type default.
    pub fn reset_movement(&mut self) {
        self.movement = self.unit_type.base_movement();
    }
}

/// Formats `n` as an English ordinal: 1st, 2nd, 3rd, 4th, 11th, 21st, 112th.
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// Builds a division name such as "1st Allied Infantry Division".
pub fn division_name(number: u32, faction: Faction, unit_type: UnitType) -> String {
    format!(
        "{} {} {} Division",
        ordinal(number),
        faction.title(),
        unit_type.title()
    )
}
