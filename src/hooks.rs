//! External collaborators: achievement awards and the XP ledger.
//!
//! The core only calls these after its own state change has been saved.
//! Failures are the collaborator's concern; the caller logs and continues.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::board::UserId;

/// Difficulty rating of a coding problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Basic,
    Easy,
    Medium,
    Hard,
    #[serde(other)]
    Unrated,
}

impl Difficulty {
    pub fn parse(s: &str) -> Difficulty {
        match s {
            "basic" => Difficulty::Basic,
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Unrated,
        }
    }
}

/// A problem the player solved to win a battle or recruit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvedProblem {
    pub id: String,
    pub difficulty: Difficulty,
}

/// Why XP was granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum XpReason {
    ProblemSolved { problem: String },
    CityCaptured { province: String },
}

/// Error reported by a collaborator.
#[derive(Debug, thiserror::Error)]
#[error("{collaborator} failed: {message}")]
pub struct HookError {
    pub collaborator: &'static str,
    pub message: String,
}

/// Achievement bookkeeping.
pub trait AchievementHook: Send + Sync {
    fn on_turn_completed(&self, user: &UserId, turn_count: u32) -> Result<(), HookError>;
    fn on_problem_solved(&self, user: &UserId, problem: &SolvedProblem) -> Result<(), HookError>;
}

/// XP ledger.
pub trait RewardLedger: Send + Sync {
    fn award_xp(&self, user: &UserId, amount: u32, reason: XpReason) -> Result<(), HookError>;
}

/// Collaborators that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl AchievementHook for NoopHooks {
    fn on_turn_completed(&self, _user: &UserId, _turn_count: u32) -> Result<(), HookError> {
        Ok(())
    }

    fn on_problem_solved(&self, _user: &UserId, _problem: &SolvedProblem) -> Result<(), HookError> {
        Ok(())
    }
}

impl RewardLedger for NoopHooks {
    fn award_xp(&self, _user: &UserId, _amount: u32, _reason: XpReason) -> Result<(), HookError> {
        Ok(())
    }
}

/// One recorded collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    TurnCompleted { user: UserId, turn_count: u32 },
    ProblemSolved { user: UserId, problem: String },
    Xp { user: UserId, amount: u32, reason: XpReason },
}

/// Collaborators that remember every call, in order.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    events: Mutex<Vec<HookEvent>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HookEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sum of XP awarded to `user`.
    pub fn total_xp(&self, user: &UserId) -> u32 {
        self.events()
            .iter()
            .filter_map(|e| match e {
                HookEvent::Xp { user: u, amount, .. } if u == user => Some(*amount),
                _ => None,
            })
            .sum()
    }

    fn push(&self, event: HookEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl AchievementHook for RecordingHooks {
    fn on_turn_completed(&self, user: &UserId, turn_count: u32) -> Result<(), HookError> {
        self.push(HookEvent::TurnCompleted {
            user: user.clone(),
            turn_count,
        });
        Ok(())
    }

    fn on_problem_solved(&self, user: &UserId, problem: &SolvedProblem) -> Result<(), HookError> {
        self.push(HookEvent::ProblemSolved {
            user: user.clone(),
            problem: problem.id.clone(),
        });
        Ok(())
    }
}

impl RewardLedger for RecordingHooks {
    fn award_xp(&self, user: &UserId, amount: u32, reason: XpReason) -> Result<(), HookError> {
        self.push(HookEvent::Xp {
            user: user.clone(),
            amount,
            reason,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parse_falls_back_to_unrated() {
        assert_eq!(Difficulty::parse("hard"), Difficulty::Hard);
        assert_eq!(Difficulty::parse("legendary"), Difficulty::Unrated);
        let d: Difficulty = serde_json::from_str("\"impossible\"").unwrap();
        assert_eq!(d, Difficulty::Unrated);
    }

    #[test]
    fn recording_hooks_keep_order_and_sum_xp() {
        let hooks = RecordingHooks::new();
        let user = UserId::from("u");
        hooks.on_turn_completed(&user, 2).unwrap();
        hooks
            .award_xp(
                &user,
                100,
                XpReason::ProblemSolved {
                    problem: "p1".into(),
                },
            )
            .unwrap();
        hooks
            .award_xp(
                &UserId::from("other"),
                5,
                XpReason::CityCaptured {
                    province: "harbor".into(),
                },
            )
            .unwrap();

        let events = hooks.events();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            HookEvent::TurnCompleted {
                user: user.clone(),
                turn_count: 2
            }
        );
        assert_eq!(hooks.total_xp(&user), 100);
    }
}
