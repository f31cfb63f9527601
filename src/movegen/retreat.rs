//! Retreat destination generation.
//!
//! A displaced unit may fall back only into an adjacent province that is
//! empty and held by its own faction.

use crate::board::{BoardView, ProvinceId, Unit};

/// Legal retreat destinations for `unit`, in adjacency order.
///
/// Returns an empty vec when the unit has nowhere to go.
pub fn retreat_destinations(view: &BoardView<'_>, unit: &Unit) -> Vec<ProvinceId> {
    view.graph
        .adjacency(unit.position.as_str())
        .iter()
        .filter(|p| view.is_empty(p.as_str()) && view.controller(p.as_str()) == unit.faction)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{
        division_name, Faction, ProvinceGraph, Turn, TurnId, UnitId, UnitType, UserId, FULL_HEALTH,
    };

    // a - b - c, plus d hanging off b
    fn graph() -> ProvinceGraph {
        ProvinceGraph::from_json(
            r#"[{"id":"a"},{"id":"b"},{"id":"c"},{"id":"d"}]"#,
            r#"{"a":["b"],"b":["a","c","d"],"c":["b"],"d":["b"]}"#,
        )
        .unwrap()
    }

    fn unit(id: u64, faction: Faction, at: &str) -> Unit {
        Unit {
            id: UnitId(id),
            turn_id: TurnId(1),
            unit_type: UnitType::Infantry,
            faction,
            position: at.into(),
            movement: 1,
            health: FULL_HEALTH,
            unit_number: id as u32,
            name: division_name(id as u32, faction, UnitType::Infantry),
        }
    }

    #[test]
    fn allied_unit_retreats_to_empty_allied_neighbors() {
        let g = graph();
        let t = Turn::new(TurnId(1), UserId::from("u"), vec!["a".into(), "b".into(), "c".into()]);
        let units = vec![unit(1, Faction::Allied, "b"), unit(2, Faction::Allied, "c")];
        let view = BoardView::new(&g, &t, &units);

        assert_eq!(retreat_destinations(&view, &units[0]), vec![ProvinceId::from("a")]);
    }

    #[test]
    fn enemy_unit_retreats_to_enemy_ground() {
        let g = graph();
        let t = Turn::new(TurnId(1), UserId::from("u"), vec!["a".into(), "b".into()]);
        let units = vec![unit(1, Faction::Enemy, "b")];
        let view = BoardView::new(&g, &t, &units);

        assert_eq!(
            retreat_destinations(&view, &units[0]),
            vec![ProvinceId::from("c"), ProvinceId::from("d")]
        );
    }

    #[test]
    fn surrounded_unit_has_no_destinations() {
        let g = graph();
        let t = Turn::new(TurnId(1), UserId::from("u"), vec![]);
        let units = vec![
            unit(1, Faction::Enemy, "b"),
            unit(2, Faction::Allied, "a"),
            unit(3, Faction::Allied, "c"),
            unit(4, Faction::Enemy, "d"),
        ];
        let view = BoardView::new(&g, &t, &units);

        assert!(retreat_destinations(&view, &units[0]).is_empty());
    }
}
