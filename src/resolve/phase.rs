//! Turn phase sequencing.
//!
//! A turn is Active until the player ends it. The ending phase then runs one
//! step per call: first a single enemy reinforcement, then one action for
//! one enemy unit at a time, until no enemy can act and the turn rolls over.
//!
//! Phase flow:
//! - Active -> Ending: reset movement, try one reinforcement
//! - Ending -> Ending: one enemy unit acts, or is marked processed
//! - Ending -> Active: nothing left to act, `current_turn += 1`

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::board::{BoardView, Faction, ProvinceGraph, ProvinceId, Turn, Unit, UnitType};
use crate::config::RuleConfig;
use crate::error::{GameError, Result};
use crate::registry::UnitRegistry;

use super::enemy::{choose_enemy_action, EnemyAction};

/// What one call to [`advance`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "step")]
pub enum TurnStep {
    /// The ending phase began and an enemy unit was raised.
    Reinforced { unit: Unit },
    /// An enemy unit acted (or, with [`EnemyAction::Idle`], was set aside).
    UnitActed { unit: Unit, action: EnemyAction },
    /// An enemy unit attacked; the verdict comes from outside.
    PendingBattle { attacker: Unit, defender: Unit },
    /// The phase finished and the turn rolled over.
    TurnEnded { turn_number: u32 },
}

/// Empty enemy-held provinces next to any allied unit, without duplicates,
/// in discovery order.
pub fn reinforcement_sites(view: &BoardView<'_>) -> Vec<ProvinceId> {
    let mut sites: Vec<ProvinceId> = Vec::new();
    for unit in view.units_of(Faction::Allied) {
        for p in view.graph.adjacency(unit.position.as_str()) {
            if view.is_empty(p.as_str())
                && view.controller(p.as_str()) == Faction::Enemy
                && !sites.contains(p)
            {
                sites.push(p.clone());
            }
        }
    }
    sites
}

/// Runs one step of the turn state machine.
///
/// `turn` is updated in memory; the caller persists it. Unit changes are
/// written through `registry` as they happen. A failed reinforcement is
/// logged and the call carries on with enemy unit processing.
pub fn advance(
    turn: &mut Turn,
    graph: &ProvinceGraph,
    registry: &UnitRegistry,
    rules: &RuleConfig,
    rng: &mut impl Rng,
) -> Result<TurnStep> {
    if !turn.is_ending {
        turn.begin_ending();
        let units = registry.reset_movement(turn.id)?;
        info!(turn = turn.current_turn, user = %turn.user_id, "ending phase started");

        let sites = reinforcement_sites(&BoardView::new(graph, turn, &units));
        if let Some(site) = sites.choose(rng) {
            let unit_type = if rng.gen_bool(rules.reinforcement_infantry_chance) {
                UnitType::Infantry
            } else {
                UnitType::Armor
            };
            match registry.create_unit(turn.id, unit_type, Faction::Enemy, site.clone()) {
                Ok(unit) => {
                    info!(unit = %unit.name, at = %unit.position, "enemy reinforcement");
                    return Ok(TurnStep::Reinforced { unit });
                }
                Err(err) => warn!(error = %err, at = %site, "reinforcement failed"),
            }
        }
    }

    step_enemy_unit(turn, graph, registry, rng)
}

fn step_enemy_unit(
    turn: &mut Turn,
    graph: &ProvinceGraph,
    registry: &UnitRegistry,
    rng: &mut impl Rng,
) -> Result<TurnStep> {
    let units = registry.list_units(turn.id)?;
    let available: Vec<&Unit> = units
        .iter()
        .filter(|u| u.is_enemy() && u.movement > 0 && !turn.is_processed(u.id))
        .collect();

    let Some(&unit) = available.choose(rng) else {
        turn.roll_over();
        info!(user = %turn.user_id, turn = turn.current_turn, "turn ended");
        return Ok(TurnStep::TurnEnded {
            turn_number: turn.current_turn,
        });
    };

    let action = choose_enemy_action(&BoardView::new(graph, turn, &units), unit);
    debug!(unit = %unit.name, ?action, "enemy action");

    let mut actor = unit.clone();
    match &action {
        EnemyAction::Capture { to } | EnemyAction::Advance { to, .. } => {
            registry.move_unit(&mut actor, to.clone())?;
            turn.release(to.as_str());
        }
        EnemyAction::Engage { defender } => {
            let defender = units
                .iter()
                .find(|u| u.id == *defender)
                .cloned()
                .ok_or(GameError::UnitNotFound(*defender))?;
            info!(attacker = %actor.name, defender = %defender.name, "enemy attack pending");
            return Ok(TurnStep::PendingBattle {
                attacker: actor,
                defender,
            });
        }
        EnemyAction::Idle => turn.mark_processed(actor.id),
    }

    Ok(TurnStep::UnitActed {
        unit: actor,
        action,
    })
}
