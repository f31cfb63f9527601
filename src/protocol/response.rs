//! Command execution and JSON replies.
//!
//! Every command produces exactly one JSON object on one line. Rejected
//! operations carry the reason, an error kind and, when the user has a
//! campaign, the unchanged state.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::board::{Snapshot, UserId};
use crate::error::GameError;
use crate::game::{BattleVerdict, Game};

use super::parser::{parse_command, Command, ParseError, Verdict};

/// Error reply body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Snapshot>,
}

/// What the main loop should do after a line.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Nothing to print.
    Silent,
    /// Print this line.
    Line(String),
    /// Stop reading input.
    Quit,
}

impl From<Verdict> for BattleVerdict {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::Pass(problem) => BattleVerdict::Passed { problem },
            Verdict::Fail => BattleVerdict::Failed,
            Verdict::Surrender => BattleVerdict::Surrendered,
        }
    }
}

/// Parses and executes one input line.
pub fn handle_line(game: &Game, line: &str) -> Reply {
    match parse_command(line) {
        Ok(None) => Reply::Silent,
        Ok(Some(Command::Quit)) => Reply::Quit,
        Ok(Some(cmd)) => Reply::Line(execute(game, cmd).to_string()),
        Err(err) => Reply::Line(parse_error(&err).to_string()),
    }
}

/// Executes a parsed command and returns its JSON reply.
pub fn execute(game: &Game, cmd: Command) -> Value {
    debug!(?cmd, "executing");
    let user = command_user(&cmd);
    let result = match cmd {
        Command::NewCampaign { user } => game.new_campaign(&user).map(to_value),
        Command::Armies { user } => game.armies(&user).map(|a| json!({ "armies": a })),
        Command::Provinces { user } => game.provinces(&user).map(|p| json!({ "provinces": p })),
        Command::Turn { user } => game.snapshot(&user).map(to_value),
        Command::Move {
            user,
            unit,
            destination,
        } => game
            .move_division(&user, unit, &destination)
            .map(to_value),
        Command::Adjacent { unit } => game
            .adjacencies_of_unit(unit)
            .map(|n| json!({ "unit": unit, "adjacent": n })),
        Command::EndTurn { user } => game.advance_turn(&user).map(to_value),
        Command::Battle {
            user,
            attacker,
            defender,
            verdict,
        } => game
            .resolve_battle_outcome(&user, attacker, defender, verdict.into())
            .map(to_value),
        Command::Recruit {
            user,
            province,
            verdict,
        } => game
            .recruit(&user, &province, verdict.into())
            .map(to_value),
        Command::Quit => Ok(json!({ "bye": true })),
    };

    match result {
        Ok(v) => v,
        Err(err) => {
            let state = user.and_then(|u| game.snapshot(&u).ok());
            error_value(&err, state)
        }
    }
}

fn command_user(cmd: &Command) -> Option<UserId> {
    match cmd {
        Command::NewCampaign { user }
        | Command::Armies { user }
        | Command::Provinces { user }
        | Command::Turn { user }
        | Command::Move { user, .. }
        | Command::EndTurn { user }
        | Command::Battle { user, .. }
        | Command::Recruit { user, .. } => Some(user.clone()),
        Command::Adjacent { .. } | Command::Quit => None,
    }
}

fn to_value<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

pub fn error_value(err: &GameError, state: Option<Snapshot>) -> Value {
    let body = ErrorResponse {
        error: err.to_string(),
        kind: err.kind(),
        state,
    };
    serde_json::to_value(body).unwrap_or(Value::Null)
}

fn parse_error(err: &ParseError) -> Value {
    json!({ "error": err.to_string(), "kind": "invalid_command" })
}
