//! Headless self-play campaigns.
//!
//! Plays whole campaigns with a random allied policy and random battle
//! verdicts, driving the ending phase to completion each turn. Used to soak
//! the turn state machine and to gather balance statistics.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};

use crate::board::{BoardView, Faction, UserId};
use crate::config::GameConfig;
use crate::error::Result;
use crate::game::{BattleVerdict, Game, MoveOutcome};
use crate::hooks::RecordingHooks;
use crate::movegen::random_allied_move;
use crate::resolve::TurnStep;
use crate::store::MemoryStore;

/// Configuration for self-play.
#[derive(Debug, Clone)]
pub struct SelfPlayConfig {
    /// Number of campaigns to play.
    pub num_games: usize,
    /// Turns per campaign before it is stopped.
    pub max_turns: u32,
    /// Allied moves attempted per turn.
    pub moves_per_turn: usize,
    /// Ending-phase steps allowed per turn before the campaign is abandoned.
    pub max_steps_per_turn: usize,
    /// Probability that the player passes a battle.
    pub pass_chance: f64,
    /// Probability that the player surrenders a failed defence.
    pub surrender_chance: f64,
    /// Probability of recruiting once per turn.
    pub recruit_chance: f64,
    /// Number of parallel threads for concurrent campaigns.
    pub threads: usize,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    /// Map, campaign and rules for every game.
    pub game: GameConfig,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        SelfPlayConfig {
            num_games: 10,
            max_turns: 20,
            moves_per_turn: 4,
            max_steps_per_turn: 500,
            pass_chance: 0.6,
            surrender_chance: 0.3,
            recruit_chance: 0.25,
            threads: 4,
            seed: 0,
            game: GameConfig::default(),
        }
    }
}

/// Per-turn counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TurnRecord {
    pub turn: u32,
    pub allied_moves: usize,
    pub battles: usize,
    pub recruits: usize,
    pub reinforcements: usize,
    pub enemy_actions: usize,
    pub provinces_held: usize,
}

/// Why a campaign stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Finish {
    TurnLimit,
    AlliesDestroyed,
    EnemyDestroyed,
    Stalled,
}

/// A complete self-play campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameRecord {
    pub game_id: usize,
    pub finish: Finish,
    pub turns_played: u32,
    pub allied_units_lost: usize,
    pub enemy_units_lost: usize,
    pub provinces_held: usize,
    pub cities_captured: usize,
    pub xp_earned: u32,
    pub turns: Vec<TurnRecord>,
}

#[derive(Default)]
struct Tally {
    allied_created: usize,
    enemy_created: usize,
    cities: usize,
}

fn random_verdict(config: &SelfPlayConfig, defending: bool, rng: &mut impl Rng) -> BattleVerdict {
    if rng.gen_bool(config.pass_chance) {
        BattleVerdict::passed()
    } else if defending && rng.gen_bool(config.surrender_chance) {
        BattleVerdict::Surrendered
    } else {
        BattleVerdict::Failed
    }
}

fn count(game: &Game, user: &UserId, faction: Faction) -> Result<usize> {
    Ok(game
        .armies(user)?
        .iter()
        .filter(|u| u.faction == faction)
        .count())
}

/// Plays one campaign to its end.
pub fn play_game(config: &SelfPlayConfig, game_id: usize, rng: &mut SmallRng) -> Result<GameRecord> {
    let mut game_config = config.game.clone();
    game_config.seed = rng.gen::<u64>() | 1;
    let graph = Arc::new(game_config.map.load()?);
    let hooks = Arc::new(RecordingHooks::new());
    let game = Game::with_parts(
        game_config,
        graph,
        Arc::new(MemoryStore::new()),
        hooks.clone(),
        hooks.clone(),
    );

    let user = UserId::new(format!("selfplay-{}", game_id));
    game.new_campaign(&user)?;
    let mut tally = Tally {
        allied_created: count(&game, &user, Faction::Allied)?,
        enemy_created: count(&game, &user, Faction::Enemy)?,
        cities: 0,
    };

    let mut turns = Vec::new();
    let mut finish = Finish::TurnLimit;
    'campaign: for _ in 0..config.max_turns {
        let mut record = TurnRecord {
            turn: game.turn(&user)?.current_turn,
            ..TurnRecord::default()
        };

        play_allied_turn(&game, &user, config, rng, &mut record, &mut tally)?;

        let mut steps = 0;
        loop {
            let outcome = game.advance_turn(&user)?;
            match outcome.step {
                TurnStep::TurnEnded { .. } => break,
                TurnStep::Reinforced { .. } => {
                    record.reinforcements += 1;
                    tally.enemy_created += 1;
                }
                TurnStep::UnitActed { .. } => record.enemy_actions += 1,
                TurnStep::PendingBattle { attacker, defender } => {
                    record.battles += 1;
                    let verdict = random_verdict(config, true, rng);
                    game.resolve_battle_outcome(&user, attacker.id, defender.id, verdict)?;
                }
            }
            steps += 1;
            if steps >= config.max_steps_per_turn {
                warn!(game_id, turn = record.turn, "ending phase stalled");
                finish = Finish::Stalled;
                turns.push(record);
                break 'campaign;
            }
        }

        record.provinces_held = game.turn(&user)?.controlled_provinces.len();
        turns.push(record);

        if count(&game, &user, Faction::Allied)? == 0 {
            finish = Finish::AlliesDestroyed;
            break;
        }
        if count(&game, &user, Faction::Enemy)? == 0 {
            finish = Finish::EnemyDestroyed;
            break;
        }
    }

    let allied_left = count(&game, &user, Faction::Allied)?;
    let enemy_left = count(&game, &user, Faction::Enemy)?;
    Ok(GameRecord {
        game_id,
        finish,
        turns_played: turns.len() as u32,
        allied_units_lost: tally.allied_created.saturating_sub(allied_left),
        enemy_units_lost: tally.enemy_created.saturating_sub(enemy_left),
        provinces_held: game.turn(&user)?.controlled_provinces.len(),
        cities_captured: tally.cities,
        xp_earned: hooks.total_xp(&user),
        turns,
    })
}

fn play_allied_turn(
    game: &Game,
    user: &UserId,
    config: &SelfPlayConfig,
    rng: &mut SmallRng,
    record: &mut TurnRecord,
    tally: &mut Tally,
) -> Result<()> {
    if rng.gen_bool(config.recruit_chance) {
        let turn = game.turn(user)?;
        if let Some(province) = turn.controlled_provinces.choose(rng) {
            // Recruiting fails when every controlled province is full.
            if let Ok(report) = game.recruit(user, province.as_str(), BattleVerdict::passed()) {
                if report.unit.is_some() {
                    record.recruits += 1;
                    tally.allied_created += 1;
                }
            }
        }
    }

    for _ in 0..config.moves_per_turn {
        let turn = game.turn(user)?;
        let units = game.armies(user)?;
        let view = BoardView::new(game.graph(), &turn, &units);
        let Some((unit, dest, _)) = random_allied_move(&view, rng) else {
            break;
        };

        match game.move_division(user, unit, dest.as_str())? {
            MoveOutcome::Moved { .. } => record.allied_moves += 1,
            MoveOutcome::Battle { battle } => {
                record.battles += 1;
                let verdict = random_verdict(config, false, rng);
                let report =
                    game.resolve_battle_outcome(user, unit, battle.defender.id, verdict)?;
                if report.captured_city {
                    tally.cities += 1;
                }
            }
        }
    }
    Ok(())
}

/// Runs self-play and returns all completed campaigns.
pub fn run_self_play(config: &SelfPlayConfig) -> Vec<GameRecord> {
    let mut games = Vec::with_capacity(config.num_games);
    run_self_play_with_callback(config, |game| {
        games.push(game);
    });
    games.sort_by_key(|g| g.game_id);
    games
}

/// Runs self-play, calling `on_game` with each completed campaign.
///
/// Campaigns that fail with an error are logged and skipped.
pub fn run_self_play_with_callback<F>(config: &SelfPlayConfig, on_game: F)
where
    F: FnMut(GameRecord) + Send,
{
    if config.threads > 1 {
        run_self_play_parallel(config, on_game);
    } else {
        run_self_play_sequential(config, on_game);
    }
}

fn game_rng(seed: u64, game_id: usize) -> SmallRng {
    if seed != 0 {
        SmallRng::seed_from_u64(seed.wrapping_add(game_id as u64))
    } else {
        SmallRng::from_entropy()
    }
}

fn play_logged(config: &SelfPlayConfig, game_id: usize) -> Option<GameRecord> {
    let start = Instant::now();
    let mut rng = game_rng(config.seed, game_id);
    match play_game(config, game_id, &mut rng) {
        Ok(game) => {
            info!(
                game_id,
                finish = ?game.finish,
                turns = game.turns_played,
                provinces = game.provinces_held,
                secs = start.elapsed().as_secs_f64(),
                "campaign finished"
            );
            Some(game)
        }
        Err(err) => {
            warn!(game_id, error = %err, "campaign failed");
            None
        }
    }
}

fn run_self_play_sequential<F>(config: &SelfPlayConfig, mut on_game: F)
where
    F: FnMut(GameRecord),
{
    for i in 0..config.num_games {
        if let Some(game) = play_logged(config, i) {
            on_game(game);
        }
    }
}

/// Plays campaigns concurrently on a rayon pool, delivering them to the
/// callback through a channel.
fn run_self_play_parallel<F>(config: &SelfPlayConfig, mut on_game: F)
where
    F: FnMut(GameRecord) + Send,
{
    use rayon::prelude::*;
    use std::sync::mpsc;

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
    {
        Ok(pool) => pool,
        Err(err) => {
            warn!(error = %err, "thread pool unavailable, playing sequentially");
            return run_self_play_sequential(config, on_game);
        }
    };

    let completed = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<GameRecord>();
    let config_clone = config.clone();
    let handle = std::thread::spawn(move || {
        pool.install(|| {
            (0..config_clone.num_games)
                .into_par_iter()
                .for_each_with(tx, |tx, i| {
                    if let Some(game) = play_logged(&config_clone, i) {
                        completed.fetch_add(1, Ordering::Relaxed);
                        // The receiver only goes away if the caller panicked.
                        let _ = tx.send(game);
                    }
                });
        });
        completed.into_inner()
    });

    for game in rx {
        on_game(game);
    }
    match handle.join() {
        Ok(n) => info!(completed = n, "self-play finished"),
        Err(_) => warn!("self-play worker panicked"),
    }
}

/// Writes campaigns as JSON lines.
pub fn write_jsonl<W: Write>(games: &[GameRecord], out: &mut W) -> std::io::Result<()> {
    for game in games {
        serde_json::to_writer(&mut *out, game)?;
        writeln!(out)?;
    }
    out.flush()
}

/// Prints aggregate statistics to stderr.
pub fn print_summary(games: &[GameRecord]) {
    let total = games.len().max(1) as f64;
    let finished = |f: Finish| games.iter().filter(|g| g.finish == f).count();
    let turns: u32 = games.iter().map(|g| g.turns_played).sum();
    let held: usize = games.iter().map(|g| g.provinces_held).sum();
    let allied_lost: usize = games.iter().map(|g| g.allied_units_lost).sum();
    let enemy_lost: usize = games.iter().map(|g| g.enemy_units_lost).sum();

    eprintln!("=== Self-Play Summary ===");
    eprintln!("Games: {}", games.len());
    eprintln!("Avg turns/game: {:.1}", turns as f64 / total);
    eprintln!("Avg provinces held: {:.1}", held as f64 / total);
    eprintln!("Avg allied units lost: {:.1}", allied_lost as f64 / total);
    eprintln!("Avg enemy units lost: {:.1}", enemy_lost as f64 / total);
    eprintln!("Turn limit reached: {}", finished(Finish::TurnLimit));
    eprintln!("Allies destroyed: {}", finished(Finish::AlliesDestroyed));
    eprintln!("Enemy destroyed: {}", finished(Finish::EnemyDestroyed));
    eprintln!("Stalled: {}", finished(Finish::Stalled));
}
