//! Outcome resolution.
//!
//! Battle detection and verdict application, retreats, the enemy policy
//! and the turn state machine that drives it.

pub mod battle;
pub mod enemy;
pub mod phase;
pub mod retreat;

pub use battle::{apply_victory, check_matchup, detect_encounter, repel, VictoryReport};
pub use enemy::{choose_enemy_action, weakest_flank, EnemyAction, Objective};
pub use phase::{advance, reinforcement_sites, TurnStep};
pub use retreat::{retreat, Retreat, RetreatOutcome};
