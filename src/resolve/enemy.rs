//! Enemy decision policy.
//!
//! Chooses at most one action for one enemy unit per call. Pure: looks at a
//! [`BoardView`] and returns what to do; the phase driver applies it.

use serde::Serialize;
use tracing::debug;

use crate::board::{BoardView, Faction, ProvinceId, Unit, UnitId};
use crate::movegen::next_step;

/// Why an advancing enemy picked its route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Toward the allied unit with the thinnest support.
    WeakestFlank,
    /// Toward the first reachable empty province on the front.
    OpenObjective,
    /// Toward the first empty province on the front.
    Frontline,
}

/// One enemy action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum EnemyAction {
    /// Walk into an empty allied province and take it.
    Capture { to: ProvinceId },
    /// Attack an adjacent allied unit; resolved externally.
    Engage { defender: UnitId },
    /// Step toward an objective.
    Advance { to: ProvinceId, objective: Objective },
    /// Nothing useful to do this phase.
    Idle,
}

pub fn choose_enemy_action(view: &BoardView<'_>, unit: &Unit) -> EnemyAction {
    let neighbors = view.graph.adjacency(unit.position.as_str());

    if let Some(p) = neighbors
        .iter()
        .find(|p| view.controller(p.as_str()) == Faction::Allied && view.is_empty(p.as_str()))
    {
        return EnemyAction::Capture { to: p.clone() };
    }

    if let Some(defender) = neighbors
        .iter()
        .filter_map(|p| view.unit_at(p.as_str()))
        .find(|u| u.faction == Faction::Allied)
    {
        return EnemyAction::Engage {
            defender: defender.id,
        };
    }

    let occupied = view.occupied();
    let open_step = |target: &str| {
        next_step(view.graph, unit.position.as_str(), target, &occupied)
            .filter(|step| *step != unit.position && view.is_empty(step.as_str()))
    };

    // The flank unit's own province is occupied and therefore blocked, so
    // no route reaches it and this falls through to the objective scan.
    if let Some(flank) = weakest_flank(view) {
        if let Some(to) = open_step(flank.position.as_str()) {
            debug!(unit = %unit.name, toward = %flank.name, step = %to, "advancing on weakest flank");
            return EnemyAction::Advance {
                to,
                objective: Objective::WeakestFlank,
            };
        }
    }

    let on_front = |id: &str| {
        view.is_empty(id)
            && view
                .graph
                .adjacency(id)
                .iter()
                .any(|n| view.controller(n.as_str()) == Faction::Enemy)
    };

    let objective = view
        .graph
        .all_provinces()
        .iter()
        .map(|p| p.id.as_str())
        .find(|id| on_front(*id) && open_step(*id).is_some());
    if let Some(target) = objective {
        if let Some(to) = open_step(target) {
            debug!(unit = %unit.name, toward = target, step = %to, "advancing on open objective");
            return EnemyAction::Advance {
                to,
                objective: Objective::OpenObjective,
            };
        }
    }

    // Mirrors the objective scan without the reachability filter. Whenever
    // the scan above found nothing, the first front province has no step
    // either, so this falls through to idle.
    let frontline = view
        .graph
        .all_provinces()
        .iter()
        .map(|p| p.id.as_str())
        .find(|id| on_front(*id));
    if let Some(to) = frontline.and_then(open_step) {
        debug!(unit = %unit.name, step = %to, "advancing to frontline");
        return EnemyAction::Advance {
            to,
            objective: Objective::Frontline,
        };
    }

    EnemyAction::Idle
}

/// The allied unit with the fewest neighbors that hold an allied unit on
/// enemy-controlled ground. Ties go to the earliest unit.
pub fn weakest_flank<'a>(view: &BoardView<'a>) -> Option<&'a Unit> {
    let support = |u: &Unit| {
        view.graph
            .adjacency(u.position.as_str())
            .iter()
            .filter(|p| {
                view.controller(p.as_str()) == Faction::Enemy
                    && view
                        .unit_at(p.as_str())
                        .is_some_and(|n| n.faction == Faction::Allied)
            })
            .count()
    };

    let mut best: Option<(&'a Unit, usize)> = None;
    for u in view.units_of(Faction::Allied) {
        let score = support(u);
        if best.map_or(true, |(_, s)| score < s) {
            best = Some((u, score));
        }
    }
    best.map(|(u, _)| u)
}
