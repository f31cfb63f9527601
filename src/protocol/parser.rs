//! Line protocol command parser.
//!
//! Parses one line of input into a structured `Command` that the main loop
//! dispatches on. Tokens are whitespace separated; ids never contain spaces.

use thiserror::Error;

use crate::board::{UnitId, UserId};
use crate::hooks::{Difficulty, SolvedProblem};

/// Errors from parsing a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command: '{0}'")]
    UnknownCommand(String),

    #[error("malformed {command}: expected '{usage}'")]
    Usage {
        command: &'static str,
        usage: &'static str,
    },

    #[error("invalid division id: '{0}'")]
    InvalidUnitId(String),

    #[error("invalid verdict: '{0}'")]
    InvalidVerdict(String),
}

/// Grading result as written on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass(Option<SolvedProblem>),
    Fail,
    Surrender,
}

/// A parsed client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `newcampaign <user>`
    NewCampaign { user: UserId },

    /// `armies <user>`
    Armies { user: UserId },

    /// `provinces <user>`
    Provinces { user: UserId },

    /// `turn <user>`: full snapshot of the user's turn.
    Turn { user: UserId },

    /// `move <user> <unit> <province>`
    Move {
        user: UserId,
        unit: UnitId,
        destination: String,
    },

    /// `adjacent <unit>`
    Adjacent { unit: UnitId },

    /// `endturn <user>`: one step of the ending phase.
    EndTurn { user: UserId },

    /// `battle <user> <attacker> <defender> pass|fail|surrender [problem difficulty]`
    Battle {
        user: UserId,
        attacker: UnitId,
        defender: UnitId,
        verdict: Verdict,
    },

    /// `recruit <user> <province> pass|fail [problem difficulty]`
    Recruit {
        user: UserId,
        province: String,
        verdict: Verdict,
    },

    /// Terminate the process.
    Quit,
}

/// Parses a single line of input.
///
/// Returns `Ok(None)` for blank lines and `#` comments.
pub fn parse_command(line: &str) -> Result<Option<Command>, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let cmd = match tokens[0] {
        "quit" => Command::Quit,
        "newcampaign" => Command::NewCampaign {
            user: user_arg(&tokens, "newcampaign")?,
        },
        "armies" => Command::Armies {
            user: user_arg(&tokens, "armies")?,
        },
        "provinces" => Command::Provinces {
            user: user_arg(&tokens, "provinces")?,
        },
        "turn" => Command::Turn {
            user: user_arg(&tokens, "turn")?,
        },
        "endturn" => Command::EndTurn {
            user: user_arg(&tokens, "endturn")?,
        },
        "adjacent" => parse_adjacent(&tokens)?,
        "move" => parse_move(&tokens)?,
        "battle" => parse_battle(&tokens)?,
        "recruit" => parse_recruit(&tokens)?,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Some(cmd))
}

fn usage(command: &'static str) -> ParseError {
    let usage = match command {
        "move" => "move <user> <unit> <province>",
        "adjacent" => "adjacent <unit>",
        "battle" => "battle <user> <attacker> <defender> pass|fail|surrender [problem difficulty]",
        "recruit" => "recruit <user> <province> pass|fail [problem difficulty]",
        "newcampaign" => "newcampaign <user>",
        "armies" => "armies <user>",
        "provinces" => "provinces <user>",
        "turn" => "turn <user>",
        _ => "endturn <user>",
    };
    ParseError::Usage { command, usage }
}

fn user_arg(tokens: &[&str], command: &'static str) -> Result<UserId, ParseError> {
    match tokens {
        [_, user] => Ok(UserId::from(*user)),
        _ => Err(usage(command)),
    }
}

fn unit_id(token: &str) -> Result<UnitId, ParseError> {
    token
        .parse::<u64>()
        .map(UnitId)
        .map_err(|_| ParseError::InvalidUnitId(token.to_string()))
}

/// Parses `pass|fail|surrender` plus an optional `<problem> <difficulty>`.
fn parse_verdict(tokens: &[&str], allow_surrender: bool) -> Result<Verdict, ParseError> {
    let (word, rest) = match tokens.split_first() {
        Some(split) => split,
        None => return Err(ParseError::InvalidVerdict(String::new())),
    };
    match (*word, rest) {
        ("pass", []) => Ok(Verdict::Pass(None)),
        ("pass", [id, difficulty]) => Ok(Verdict::Pass(Some(SolvedProblem {
            id: id.to_string(),
            difficulty: Difficulty::parse(difficulty),
        }))),
        ("fail", []) => Ok(Verdict::Fail),
        ("surrender", []) if allow_surrender => Ok(Verdict::Surrender),
        _ => Err(ParseError::InvalidVerdict(tokens.join(" "))),
    }
}

/// Parses `adjacent <unit>`.
fn parse_adjacent(tokens: &[&str]) -> Result<Command, ParseError> {
    match tokens {
        [_, unit] => Ok(Command::Adjacent {
            unit: unit_id(unit)?,
        }),
        _ => Err(usage("adjacent")),
    }
}

/// Parses `move <user> <unit> <province>`.
fn parse_move(tokens: &[&str]) -> Result<Command, ParseError> {
    match tokens {
        [_, user, unit, destination] => Ok(Command::Move {
            user: UserId::from(*user),
            unit: unit_id(unit)?,
            destination: destination.to_string(),
        }),
        _ => Err(usage("move")),
    }
}

/// Parses `battle <user> <attacker> <defender> <verdict...>`.
fn parse_battle(tokens: &[&str]) -> Result<Command, ParseError> {
    if tokens.len() < 5 {
        return Err(usage("battle"));
    }
    Ok(Command::Battle {
        user: UserId::from(tokens[1]),
        attacker: unit_id(tokens[2])?,
        defender: unit_id(tokens[3])?,
        verdict: parse_verdict(&tokens[4..], true)?,
    })
}

/// Parses `recruit <user> <province> <verdict...>`.
fn parse_recruit(tokens: &[&str]) -> Result<Command, ParseError> {
    if tokens.len() < 4 {
        return Err(usage("recruit"));
    }
    Ok(Command::Recruit {
        user: UserId::from(tokens[1]),
        province: tokens[2].to_string(),
        verdict: parse_verdict(&tokens[3..], false)?,
    })
}
