//! Battle detection and outcome application.
//!
//! Battles are not simulated here. This module decides whether one may
//! start and applies the externally graded verdict. Manual moves, enemy
//! engagements and surrenders all go through these functions.

use rand::Rng;
use tracing::info;

use crate::board::{Faction, ProvinceGraph, ProvinceId, Turn, Unit, UnitType};
use crate::error::{GameError, Result};
use crate::registry::UnitRegistry;

use super::retreat::{retreat, Retreat};

/// The unit of the opposing faction standing on `position`, if any.
pub fn detect_encounter<'a>(
    units: &'a [Unit],
    from_faction: Faction,
    position: &str,
) -> Option<&'a Unit> {
    units
        .iter()
        .find(|u| u.position == position && u.faction != from_faction)
}

/// Whether `attacker` may start a battle against `defender`.
///
/// Allied infantry can never attack armor.
pub fn matchup_allowed(attacker: &Unit, defender: &Unit) -> bool {
    !(attacker.faction == Faction::Allied
        && attacker.unit_type == UnitType::Infantry
        && defender.unit_type == UnitType::Armor)
}

pub fn check_matchup(attacker: &Unit, defender: &Unit) -> Result<()> {
    if matchup_allowed(attacker, defender) {
        Ok(())
    } else {
        Err(GameError::IllegalMatchup)
    }
}

/// What a won battle changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VictoryReport {
    pub province: ProvinceId,
    pub captured_city: bool,
    pub retreat: Retreat,
}

/// Applies a win for `attacker`.
///
/// The attacker moves into the defender's province and spends one
/// movement point. The province passes to the attacker's faction and the
/// defender is sent to retreat. `turn` is updated in memory only; the
/// caller saves it.
pub fn apply_victory(
    attacker: &mut Unit,
    defender: &Unit,
    turn: &mut Turn,
    graph: &ProvinceGraph,
    registry: &UnitRegistry,
    rng: &mut impl Rng,
) -> Result<VictoryReport> {
    let province = defender.position.clone();
    registry.move_unit(attacker, province.clone())?;
    turn.transfer(&province, attacker.faction);

    let captured_city = graph.province(province.as_str()).is_some_and(|p| p.is_city());
    info!(
        attacker = %attacker.name,
        defender = %defender.name,
        province = %province,
        captured_city,
        "battle won"
    );

    let retreat = retreat(defender, turn, graph, registry, rng)?;
    Ok(VictoryReport {
        province,
        captured_city,
        retreat,
    })
}

/// An attack beaten back: the attacker stays put and loses one movement point.
pub fn repel(attacker: &mut Unit, registry: &UnitRegistry) -> Result<()> {
    attacker.spend_movement();
    registry.save(attacker)?;
    info!(attacker = %attacker.name, movement = attacker.movement, "attack repelled");
    Ok(())
}
