//! End-to-end rule scenarios driven through the public `Game` API.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use frontline::board::{
    BoardView, Faction, ProvinceGraph, ProvinceId, Turn, TurnId, Unit, UnitId, UnitType, UserId,
};
use frontline::config::{CampaignConfig, GameConfig, UnitPlacement};
use frontline::game::{BattleVerdict, Game, MoveOutcome};
use frontline::hooks::NoopHooks;
use frontline::movegen::retreat_destinations;
use frontline::registry::UnitRegistry;
use frontline::resolve::{self, EnemyAction, RetreatOutcome, TurnStep};
use frontline::store::{GameStore, MemoryStore, StoreError};
use frontline::GameError;
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn user() -> UserId {
    UserId::from("scenario")
}

fn seeded(seed: u64) -> GameConfig {
    GameConfig {
        seed,
        ..GameConfig::default()
    }
}

fn campaign(controlled: &[&str], units: Vec<UnitPlacement>) -> CampaignConfig {
    CampaignConfig {
        controlled_provinces: controlled.iter().map(|p| ProvinceId::from(*p)).collect(),
        initial_units: units,
    }
}

fn game_on(graph: ProvinceGraph, config: GameConfig, store: Arc<dyn GameStore>) -> Game {
    let hooks = Arc::new(NoopHooks);
    Game::with_parts(config, Arc::new(graph), store, hooks.clone(), hooks)
}

fn line_graph() -> ProvinceGraph {
    ProvinceGraph::from_json(
        r#"[{"id":"a"},{"id":"b"},{"id":"c"}]"#,
        r#"{"a":["b"],"b":["a","c"],"c":["b"]}"#,
    )
    .unwrap()
}

fn allied_provinces(game: &Game) -> BTreeSet<String> {
    game.provinces(&user())
        .unwrap()
        .into_iter()
        .filter(|p| p.controller == Faction::Allied)
        .map(|p| p.id.to_string())
        .collect()
}

#[test]
fn enemy_advances_into_uncovered_province() {
    let config = GameConfig {
        seed: 7,
        campaign: campaign(
            &["a", "b"],
            vec![
                UnitPlacement::new(UnitType::Infantry, Faction::Allied, "a"),
                UnitPlacement::new(UnitType::Infantry, Faction::Enemy, "c"),
            ],
        ),
        ..GameConfig::default()
    };
    let game = game_on(line_graph(), config, Arc::new(MemoryStore::new()));
    game.new_campaign(&user()).unwrap();

    // b is allied, so there is nowhere to reinforce; the enemy moves at once.
    let outcome = game.advance_turn(&user()).unwrap();
    match outcome.step {
        TurnStep::UnitActed { unit, action } => {
            assert_eq!(unit.position, "b");
            assert!(matches!(action, EnemyAction::Capture { .. } | EnemyAction::Advance { .. }));
        }
        other => panic!("expected the enemy to move, got {:?}", other),
    }
    assert_eq!(outcome.state.controller("b"), Some(Faction::Enemy));
    assert_eq!(allied_provinces(&game), BTreeSet::from(["a".to_string()]));
}

#[test]
fn infantry_cannot_attack_armor() {
    let config = GameConfig {
        seed: 3,
        campaign: campaign(
            &["crossroads"],
            vec![
                UnitPlacement::new(UnitType::Infantry, Faction::Allied, "crossroads"),
                UnitPlacement::new(UnitType::Armor, Faction::Enemy, "dunmere"),
            ],
        ),
        ..GameConfig::default()
    };
    let game = Game::new(config).unwrap();
    let before = game.new_campaign(&user()).unwrap();

    let err = game
        .move_division(&user(), UnitId(1), "dunmere")
        .unwrap_err();
    assert!(matches!(err, GameError::IllegalMatchup));
    assert_eq!(err.to_string(), "infantry units cannot attack armor units");
    assert!(matches!(
        game.resolve_battle_outcome(&user(), UnitId(1), UnitId(2), BattleVerdict::passed()),
        Err(GameError::IllegalMatchup)
    ));
    assert_eq!(game.snapshot(&user()).unwrap(), before);
}

#[test]
fn moves_succeed_only_when_legal() {
    let layout = Game::new(seeded(1)).unwrap();
    let start = layout.new_campaign(&user()).unwrap();
    let graph = layout.graph();

    for unit in &start.armies {
        for province in graph.all_provinces() {
            let game = Game::new(seeded(1)).unwrap();
            game.new_campaign(&user()).unwrap();
            let dest = province.id.as_str();

            let legal = unit.faction == Faction::Allied
                && unit.movement > 0
                && graph.is_adjacent(unit.position.as_str(), dest);
            match game.move_division(&user(), unit.id, dest) {
                Ok(_) => assert!(legal, "{} moved to {}", unit.name, dest),
                Err(GameError::IllegalMatchup) => assert!(legal),
                Err(err) => {
                    assert!(!legal, "{} -> {} rejected: {}", unit.name, dest, err);
                    assert_eq!(game.snapshot(&user()).unwrap(), start);
                }
            }
        }
    }
}

#[test]
fn moves_are_rejected_once_the_turn_is_ending() {
    let game = Game::new(seeded(4)).unwrap();
    let start = game.new_campaign(&user()).unwrap();
    game.advance_turn(&user()).unwrap();

    for unit in start.armies.iter().filter(|u| u.is_allied()) {
        for neighbor in game.graph().adjacency(unit.position.as_str()) {
            assert!(matches!(
                game.move_division(&user(), unit.id, neighbor.as_str()),
                Err(GameError::TurnEnding)
            ));
        }
    }
}

#[test]
fn ending_phase_terminates_within_unit_budget() {
    for seed in 1..=20 {
        let game = Game::new(seeded(seed)).unwrap();
        game.new_campaign(&user()).unwrap();

        let mut calls = 0;
        let mut budget = None;
        loop {
            let outcome = game.advance_turn(&user()).unwrap();
            calls += 1;
            if budget.is_none() {
                // Each enemy unit acts at most once per movement point plus
                // one idle step; one more call rolls the turn over.
                let enemies: Vec<&Unit> =
                    outcome.state.armies.iter().filter(|u| u.is_enemy()).collect();
                let work: usize = enemies.iter().map(|u| u.movement as usize + 1).sum();
                budget = Some(work + 2);
            }
            match outcome.step {
                TurnStep::TurnEnded { turn_number } => {
                    assert_eq!(turn_number, 2);
                    break;
                }
                TurnStep::PendingBattle { attacker, defender } => {
                    let verdict = if calls % 2 == 0 {
                        BattleVerdict::passed()
                    } else {
                        BattleVerdict::Surrendered
                    };
                    game.resolve_battle_outcome(&user(), attacker.id, defender.id, verdict)
                        .unwrap();
                }
                _ => {}
            }
            assert!(
                calls <= budget.unwrap_or(usize::MAX),
                "seed {} exceeded {:?} calls",
                seed,
                budget
            );
        }
    }
}

#[test]
fn surrounded_unit_is_destroyed_on_retreat() {
    let graph = ProvinceGraph::from_json(
        r#"[{"id":"hub"},{"id":"n"},{"id":"s"},{"id":"e"}]"#,
        r#"{"hub":["n","s","e"],"n":["hub"],"s":["hub"],"e":["hub"]}"#,
    )
    .unwrap();
    let store: Arc<dyn GameStore> = Arc::new(MemoryStore::new());
    let registry = UnitRegistry::new(store.clone());
    // Only "s" is allied, and it is occupied.
    let turn = store
        .create_turn(&user(), vec!["hub".into(), "s".into()])
        .unwrap();
    let victim = registry
        .create_unit(turn.id, UnitType::Infantry, Faction::Allied, "hub".into())
        .unwrap();
    registry
        .create_unit(turn.id, UnitType::Armor, Faction::Allied, "s".into())
        .unwrap();

    let units = registry.list_units(turn.id).unwrap();
    let view = BoardView::new(&graph, &turn, &units);
    assert!(retreat_destinations(&view, &victim).is_empty());

    let mut rng = SmallRng::seed_from_u64(9);
    let retreat = resolve::retreat(&victim, &turn, &graph, &registry, &mut rng).unwrap();
    assert_eq!(retreat.outcome, RetreatOutcome::Destroyed { unit: victim.id });
    assert_eq!(retreat.units.len(), 1);
    assert!(registry.get(victim.id).unwrap().is_none());
}

#[test]
fn control_set_tracks_captures_and_surrenders() {
    let game = Game::new(seeded(12)).unwrap();
    game.new_campaign(&user()).unwrap();
    let mut expected: BTreeSet<String> = ["harbor", "millbrook", "westmarch", "oakvale", "southwatch", "fernhill"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(allied_provinces(&game), expected);

    // The enemy in ashford takes millbrook; 1st Infantry falls back to harbor.
    let report = game
        .resolve_battle_outcome(&user(), UnitId(5), UnitId(1), BattleVerdict::Surrendered)
        .unwrap();
    assert!(!report.captured_city);
    expected.remove("millbrook");
    assert_eq!(allied_provinces(&game), expected);
    assert_eq!(report.state.unit(UnitId(1)).unwrap().position, "harbor");
    assert_eq!(report.state.unit(UnitId(5)).unwrap().position, "millbrook");

    // 2nd Infantry retakes it from oakvale; the enemy retreats to ashford.
    let report = game
        .resolve_battle_outcome(&user(), UnitId(2), UnitId(5), BattleVerdict::passed())
        .unwrap();
    expected.insert("millbrook".into());
    assert_eq!(allied_provinces(&game), expected);
    assert_eq!(report.state.unit(UnitId(5)).unwrap().position, "ashford");

    // A repelled enemy attack changes nothing but the attacker's movement.
    let report = game
        .resolve_battle_outcome(&user(), UnitId(7), UnitId(3), BattleVerdict::passed())
        .unwrap();
    assert_eq!(report.state.unit(UnitId(7)).unwrap().position, "redwater");
    assert_eq!(report.state.unit(UnitId(7)).unwrap().movement, 0);
    assert_eq!(allied_provinces(&game), expected);
}

/// Delegates to a [`MemoryStore`] but can be told to refuse new units.
struct FlakyStore {
    inner: MemoryStore,
    refuse_inserts: AtomicBool,
}

impl GameStore for FlakyStore {
    fn turn_for_user(&self, user: &UserId) -> Result<Option<Turn>, StoreError> {
        self.inner.turn_for_user(user)
    }
    fn turn(&self, id: TurnId) -> Result<Option<Turn>, StoreError> {
        self.inner.turn(id)
    }
    fn create_turn(&self, user: &UserId, controlled: Vec<ProvinceId>) -> Result<Turn, StoreError> {
        self.inner.create_turn(user, controlled)
    }
    fn save_turn(&self, turn: &Turn) -> Result<(), StoreError> {
        self.inner.save_turn(turn)
    }
    fn units(&self, turn: TurnId) -> Result<Vec<Unit>, StoreError> {
        self.inner.units(turn)
    }
    fn unit(&self, id: UnitId) -> Result<Option<Unit>, StoreError> {
        self.inner.unit(id)
    }
    fn next_unit_id(&self) -> Result<UnitId, StoreError> {
        self.inner.next_unit_id()
    }
    fn next_ordinal(&self, turn: TurnId, faction: Faction) -> Result<u32, StoreError> {
        self.inner.next_ordinal(turn, faction)
    }
    fn insert_unit(&self, unit: Unit) -> Result<(), StoreError> {
        if self.refuse_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("insert refused".into()));
        }
        self.inner.insert_unit(unit)
    }
    fn save_unit(&self, unit: &Unit) -> Result<(), StoreError> {
        self.inner.save_unit(unit)
    }
    fn delete_unit(&self, id: UnitId) -> Result<bool, StoreError> {
        self.inner.delete_unit(id)
    }
}

#[test]
fn failed_reinforcement_does_not_fail_the_step() {
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
        refuse_inserts: AtomicBool::new(false),
    });
    let config = GameConfig {
        seed: 21,
        campaign: campaign(
            &["harbor", "millbrook"],
            vec![
                UnitPlacement::new(UnitType::Infantry, Faction::Allied, "millbrook"),
                UnitPlacement::new(UnitType::Infantry, Faction::Enemy, "blackfen"),
            ],
        ),
        ..GameConfig::default()
    };
    let graph = ProvinceGraph::bundled().unwrap();
    let game = game_on(graph, config, store.clone());
    game.new_campaign(&user()).unwrap();

    // ashford is an empty enemy province next to millbrook.
    store.refuse_inserts.store(true, Ordering::SeqCst);
    let outcome = game.advance_turn(&user()).unwrap();

    assert!(matches!(outcome.step, TurnStep::UnitActed { .. }));
    assert!(outcome.state.turn_ending);
    assert_eq!(outcome.state.armies.len(), 2);
}

#[test]
fn concurrent_creation_hands_out_distinct_ordinals() {
    const PER_THREAD: usize = 25;
    const THREADS: usize = 8;

    let store: Arc<dyn GameStore> = Arc::new(MemoryStore::new());
    let registry = UnitRegistry::new(store.clone());
    let turn = store.create_turn(&user(), Vec::new()).unwrap();

    let units: Vec<Unit> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let registry = registry.clone();
                let faction = if i % 2 == 0 {
                    Faction::Allied
                } else {
                    Faction::Enemy
                };
                s.spawn(move || {
                    (0..PER_THREAD)
                        .map(|_| {
                            registry
                                .create_unit(turn.id, UnitType::Infantry, faction, "x".into())
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let per_faction = THREADS / 2 * PER_THREAD;
    for faction in [Faction::Allied, Faction::Enemy] {
        let mut ordinals: Vec<u32> = units
            .iter()
            .filter(|u| u.faction == faction)
            .map(|u| u.unit_number)
            .collect();
        ordinals.sort_unstable();
        let expected: Vec<u32> = (1..=per_faction as u32).collect();
        assert_eq!(ordinals, expected, "{:?} ordinals", faction);
    }

    let ids: BTreeSet<UnitId> = units.iter().map(|u| u.id).collect();
    assert_eq!(ids.len(), units.len());
}

#[test]
fn campaigns_for_different_users_run_in_parallel() {
    let game = Arc::new(Game::new(seeded(8)).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let game = game.clone();
            thread::spawn(move || {
                let user = UserId::new(format!("player-{}", i));
                let start = game.new_campaign(&user).unwrap();
                assert!(matches!(
                    game.move_division(&user, start.armies[0].id, "harbor"),
                    Ok(MoveOutcome::Moved { .. })
                ));
                game.snapshot(&user).unwrap()
            })
        })
        .collect();

    for handle in handles {
        let snap = handle.join().unwrap();
        assert_eq!(snap.armies.len(), 9);
        assert_eq!(snap.armies[0].position, "harbor");
        assert_eq!(snap.armies[0].unit_number, 1);
    }
}
