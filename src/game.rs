//! Game service.
//!
//! Owns the shared map, the store, the collaborators and the random source,
//! and exposes every player-facing operation. Mutating calls for one turn
//! run one at a time behind a per-turn mutex; different turns proceed in
//! parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};

use crate::board::{
    BoardView, Faction, ProvinceGraph, ProvinceId, ProvinceStatus, ProvinceType, Snapshot, Turn,
    TurnId, Unit, UnitId, UnitType, UserId,
};
use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::hooks::{AchievementHook, HookError, NoopHooks, RewardLedger, SolvedProblem, XpReason};
use crate::registry::UnitRegistry;
use crate::resolve::{self, TurnStep};
use crate::store::{GameStore, MemoryStore};

/// Verdict handed back by the external grading flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleVerdict {
    /// The player's solution passed. Carries the problem when one was graded.
    Passed { problem: Option<SolvedProblem> },
    Failed,
    Surrendered,
}

impl BattleVerdict {
    pub fn passed() -> Self {
        BattleVerdict::Passed { problem: None }
    }

    pub fn solved(problem: SolvedProblem) -> Self {
        BattleVerdict::Passed {
            problem: Some(problem),
        }
    }

    fn problem(&self) -> Option<&SolvedProblem> {
        match self {
            BattleVerdict::Passed { problem } => problem.as_ref(),
            _ => None,
        }
    }
}

/// A battle waiting for a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattleDescriptor {
    pub attacker: Unit,
    pub defender: Unit,
}

/// Result of [`Game::move_division`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum MoveOutcome {
    Moved { state: Snapshot },
    Battle { battle: BattleDescriptor },
}

/// Result of [`Game::advance_turn`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvanceOutcome {
    pub step: TurnStep,
    pub state: Snapshot,
}

/// Result of [`Game::resolve_battle_outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattleReport {
    pub passed: bool,
    pub surrendered: bool,
    /// The allied side took a city.
    pub captured_city: bool,
    pub state: Snapshot,
}

/// Result of [`Game::recruit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecruitReport {
    pub unit: Option<Unit>,
    pub state: Snapshot,
}

pub struct Game {
    graph: Arc<ProvinceGraph>,
    store: Arc<dyn GameStore>,
    registry: UnitRegistry,
    config: GameConfig,
    achievements: Arc<dyn AchievementHook>,
    ledger: Arc<dyn RewardLedger>,
    rng: Mutex<SmallRng>,
    turn_locks: Mutex<HashMap<TurnId, Arc<Mutex<()>>>>,
}

impl Game {
    /// A game on the configured map with an in-memory store and no-op
    /// collaborators.
    pub fn new(config: GameConfig) -> Result<Self> {
        config.validate()?;
        let graph = Arc::new(config.map.load()?);
        let hooks = Arc::new(NoopHooks);
        Ok(Game::with_parts(
            config,
            graph,
            Arc::new(MemoryStore::new()),
            hooks.clone(),
            hooks,
        ))
    }

    pub fn with_parts(
        config: GameConfig,
        graph: Arc<ProvinceGraph>,
        store: Arc<dyn GameStore>,
        achievements: Arc<dyn AchievementHook>,
        ledger: Arc<dyn RewardLedger>,
    ) -> Self {
        let rng = if config.seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(config.seed)
        };
        Game {
            registry: UnitRegistry::new(store.clone()),
            graph,
            store,
            config,
            achievements,
            ledger,
            rng: Mutex::new(rng),
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn graph(&self) -> &ProvinceGraph {
        &self.graph
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    /// Starts a campaign: turn 1 with the configured territory and army.
    pub fn new_campaign(&self, user: &UserId) -> Result<Snapshot> {
        if self.store.turn_for_user(user)?.is_some() {
            return Err(GameError::CampaignExists(user.clone()));
        }
        let campaign = &self.config.campaign;
        let placed = campaign
            .controlled_provinces
            .iter()
            .chain(campaign.initial_units.iter().map(|u| &u.position));
        for p in placed {
            if !self.graph.contains(p.as_str()) {
                return Err(GameError::UnknownProvince(p.to_string()));
            }
        }

        let turn = self
            .store
            .create_turn(user, campaign.controlled_provinces.clone())?;
        let lock = self.turn_lock(turn.id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        for placement in &campaign.initial_units {
            self.registry.create_unit(
                turn.id,
                placement.unit_type,
                placement.faction,
                placement.position.clone(),
            )?;
        }
        info!(user = %user, turn = %turn.id, units = campaign.initial_units.len(), "campaign started");
        self.snapshot_of(&turn)
    }

    pub fn turn(&self, user: &UserId) -> Result<Turn> {
        self.store
            .turn_for_user(user)?
            .ok_or_else(|| GameError::TurnNotFound(user.clone()))
    }

    pub fn armies(&self, user: &UserId) -> Result<Vec<Unit>> {
        let turn = self.turn(user)?;
        Ok(self.registry.list_units(turn.id)?)
    }

    pub fn provinces(&self, user: &UserId) -> Result<Vec<ProvinceStatus>> {
        let turn = self.turn(user)?;
        let units = self.registry.list_units(turn.id)?;
        Ok(BoardView::new(&self.graph, &turn, &units).province_statuses())
    }

    pub fn snapshot(&self, user: &UserId) -> Result<Snapshot> {
        self.snapshot_of(&self.turn(user)?)
    }

    /// Neighbors of the province a unit stands on.
    pub fn adjacencies_of_unit(&self, unit: UnitId) -> Result<Vec<ProvinceId>> {
        let unit = self
            .registry
            .get(unit)?
            .ok_or(GameError::UnitNotFound(unit))?;
        Ok(self.graph.adjacency(unit.position.as_str()).to_vec())
    }

    /// Moves an allied division one province.
    ///
    /// Entering an enemy-held province does not move anything; it returns
    /// the battle to be fought. Entering a friendly-held province swaps the
    /// two divisions.
    pub fn move_division(
        &self,
        user: &UserId,
        unit: UnitId,
        destination: &str,
    ) -> Result<MoveOutcome> {
        self.with_turn(user, |turn| {
            let mut mover = self.unit_in(turn, unit)?;
            if turn.is_ending {
                return Err(GameError::TurnEnding);
            }
            if !mover.is_allied() {
                return Err(GameError::NotAllied);
            }
            if mover.movement == 0 {
                return Err(GameError::NoMovement);
            }
            if !self.graph.contains(destination) {
                return Err(GameError::UnknownProvince(destination.to_string()));
            }
            if !self.graph.is_adjacent(mover.position.as_str(), destination) {
                return Err(GameError::NotAdjacent {
                    from: mover.position.clone(),
                    to: destination.into(),
                });
            }

            let units = self.registry.list_units(turn.id)?;
            if let Some(defender) = resolve::detect_encounter(&units, mover.faction, destination) {
                resolve::check_matchup(&mover, defender)?;
                info!(attacker = %mover.name, defender = %defender.name, "battle pending");
                return Ok(MoveOutcome::Battle {
                    battle: BattleDescriptor {
                        attacker: mover,
                        defender: defender.clone(),
                    },
                });
            }

            let dest = ProvinceId::from(destination);
            let origin = mover.position.clone();
            let occupant = units.iter().find(|u| u.position == destination).cloned();
            self.registry.move_unit(&mut mover, dest.clone())?;
            match occupant {
                Some(mut friend) => {
                    if self.config.rules.friendly_swap_refund {
                        mover.movement += 1;
                        self.registry.save(&mover)?;
                    }
                    self.registry.relocate(&mut friend, origin)?;
                    info!(unit = %mover.name, with = %friend.name, "divisions swapped");
                }
                None => info!(unit = %mover.name, from = %origin, to = %dest, "division moved"),
            }
            turn.control(dest);
            self.store.save_turn(turn)?;

            Ok(MoveOutcome::Moved {
                state: self.snapshot_of(turn)?,
            })
        })
    }

    /// Runs one step of the turn state machine.
    ///
    /// Callers keep calling until the step is [`TurnStep::TurnEnded`].
    pub fn advance_turn(&self, user: &UserId) -> Result<AdvanceOutcome> {
        self.with_turn(user, |turn| {
            let step = resolve::advance(
                turn,
                &self.graph,
                &self.registry,
                &self.config.rules,
                &mut self.call_rng(),
            )?;
            self.store.save_turn(turn)?;

            if let TurnStep::TurnEnded { turn_number } = step {
                absorb(
                    self.achievements.on_turn_completed(&turn.user_id, turn_number),
                    "turn achievement",
                );
            }
            Ok(AdvanceOutcome {
                step,
                state: self.snapshot_of(turn)?,
            })
        })
    }

    /// Applies an externally graded battle verdict.
    ///
    /// For an allied attacker a pass wins the battle; failure and surrender
    /// change nothing. For an enemy attacker a pass repels the attack, and a
    /// surrender hands the defender's province to the enemy.
    pub fn resolve_battle_outcome(
        &self,
        user: &UserId,
        attacker: UnitId,
        defender: UnitId,
        verdict: BattleVerdict,
    ) -> Result<BattleReport> {
        self.with_turn(user, |turn| {
            let mut attacker = self.unit_in(turn, attacker)?;
            let defender = self.unit_in(turn, defender)?;
            if attacker.faction == defender.faction {
                return Err(GameError::NotOpposed {
                    attacker: attacker.id,
                    defender: defender.id,
                });
            }
            if attacker.is_allied() && turn.is_ending {
                return Err(GameError::TurnEnding);
            }
            if attacker.is_allied() && attacker.movement == 0 {
                return Err(GameError::NoMovement);
            }
            resolve::check_matchup(&attacker, &defender)?;
            if !self
                .graph
                .is_adjacent(attacker.position.as_str(), defender.position.as_str())
            {
                return Err(GameError::NotAdjacent {
                    from: attacker.position.clone(),
                    to: defender.position.clone(),
                });
            }

            let passed = matches!(verdict, BattleVerdict::Passed { .. });
            let surrendered = verdict == BattleVerdict::Surrendered;
            let mut captured = None;

            if attacker.is_allied() {
                if passed {
                    let report = resolve::apply_victory(
                        &mut attacker,
                        &defender,
                        turn,
                        &self.graph,
                        &self.registry,
                        &mut self.call_rng(),
                    )?;
                    if report.captured_city {
                        captured = Some(report.province);
                    }
                }
            } else if passed {
                resolve::repel(&mut attacker, &self.registry)?;
            } else if surrendered {
                resolve::apply_victory(
                    &mut attacker,
                    &defender,
                    turn,
                    &self.graph,
                    &self.registry,
                    &mut self.call_rng(),
                )?;
            }
            self.store.save_turn(turn)?;
            info!(
                attacker = %attacker.name,
                defender = %defender.name,
                passed,
                surrendered,
                "battle resolved"
            );

            if let Some(province) = &captured {
                absorb(
                    self.ledger.award_xp(
                        &turn.user_id,
                        self.config.rules.city_capture_xp,
                        XpReason::CityCaptured {
                            province: province.to_string(),
                        },
                    ),
                    "city capture reward",
                );
            }
            if let Some(problem) = verdict.problem() {
                self.reward_problem(&turn.user_id, problem);
            }

            Ok(BattleReport {
                passed,
                surrendered,
                captured_city: captured.is_some(),
                state: self.snapshot_of(turn)?,
            })
        })
    }

    /// Raises a new allied division in a controlled province after a solved
    /// problem. Barracks raise infantry, anything else armor. An occupied
    /// province deploys to the first free controlled province instead.
    pub fn recruit(
        &self,
        user: &UserId,
        province: &str,
        verdict: BattleVerdict,
    ) -> Result<RecruitReport> {
        self.with_turn(user, |turn| {
            let target = self
                .graph
                .province(province)
                .ok_or_else(|| GameError::UnknownProvince(province.to_string()))?;
            if !turn.is_controlled(province) {
                return Err(GameError::NotControlled(target.id.clone()));
            }
            let BattleVerdict::Passed { problem } = &verdict else {
                return Ok(RecruitReport {
                    unit: None,
                    state: self.snapshot_of(turn)?,
                });
            };

            let units = self.registry.list_units(turn.id)?;
            let view = BoardView::new(&self.graph, turn, &units);
            let site = if view.is_empty(province) {
                target.id.clone()
            } else {
                turn.controlled_provinces
                    .iter()
                    .find(|p| view.is_empty(p.as_str()))
                    .cloned()
                    .ok_or(GameError::NoDeploySpace)?
            };
            let unit_type = match target.province_type {
                ProvinceType::Barracks => UnitType::Infantry,
                _ => UnitType::Armor,
            };

            let unit = self
                .registry
                .create_unit(turn.id, unit_type, Faction::Allied, site)?;
            info!(unit = %unit.name, at = %unit.position, "division recruited");
            if let Some(problem) = problem {
                self.reward_problem(&turn.user_id, problem);
            }

            Ok(RecruitReport {
                unit: Some(unit),
                state: self.snapshot_of(turn)?,
            })
        })
    }

    fn reward_problem(&self, user: &UserId, problem: &SolvedProblem) {
        absorb(
            self.ledger.award_xp(
                user,
                self.config.rules.xp_for(problem.difficulty),
                XpReason::ProblemSolved {
                    problem: problem.id.clone(),
                },
            ),
            "problem reward",
        );
        absorb(
            self.achievements.on_problem_solved(user, problem),
            "problem achievement",
        );
    }

    fn snapshot_of(&self, turn: &Turn) -> Result<Snapshot> {
        let units = self.registry.list_units(turn.id)?;
        Ok(BoardView::new(&self.graph, turn, &units).snapshot())
    }

    fn unit_in(&self, turn: &Turn, id: UnitId) -> Result<Unit> {
        self.registry
            .get(id)?
            .filter(|u| u.turn_id == turn.id)
            .ok_or(GameError::UnitNotFound(id))
    }

    fn rng(&self) -> MutexGuard<'_, SmallRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A generator for one operation, seeded from the shared one. The shared
    /// lock is released before the operation touches the store.
    fn call_rng(&self) -> SmallRng {
        SmallRng::seed_from_u64(self.rng().gen())
    }

    fn turn_lock(&self, id: TurnId) -> Arc<Mutex<()>> {
        self.turn_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_default()
            .clone()
    }

    /// Runs `f` on a fresh copy of the user's turn while holding its lock.
    fn with_turn<T>(&self, user: &UserId, f: impl FnOnce(&mut Turn) -> Result<T>) -> Result<T> {
        let id = self.turn(user)?.id;
        let lock = self.turn_lock(id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut turn = self
            .store
            .turn(id)?
            .ok_or(GameError::TurnIdNotFound(id))?;
        f(&mut turn)
    }
}

fn absorb(result: std::result::Result<(), HookError>, what: &'static str) {
    if let Err(err) = result {
        warn!(error = %err, what, "collaborator call failed");
    }
}
