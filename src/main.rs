//! Frontline: turn and army simulation core behind a line protocol.
//!
//! Reads one command per line from stdin and writes one JSON object per
//! line to stdout. Logs go to stderr, filtered by `RUST_LOG`.
//!
//! The config path comes from the first argument or `FRONTLINE_CONFIG`;
//! without either the built-in campaign is used.

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use frontline::config::{load_config, GameConfig};
use frontline::game::Game;
use frontline::protocol::{handle_line, Reply};

fn config_path() -> Option<PathBuf> {
    env::args()
        .nth(1)
        .or_else(|| env::var("FRONTLINE_CONFIG").ok())
        .map(PathBuf::from)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let config = match config_path() {
        Some(path) => match load_config(&path) {
            Ok(c) => c,
            Err(e) => {
                error!(path = %path.display(), error = %e, "bad config");
                process::exit(2);
            }
        },
        None => GameConfig::default(),
    };

    let game = match Game::new(config) {
        Ok(g) => g,
        Err(e) => {
            error!(error = %e, "failed to start");
            process::exit(2);
        }
    };
    info!(provinces = game.graph().len(), "ready");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        match handle_line(&game, &line) {
            Reply::Silent => {}
            Reply::Line(reply) => {
                if writeln!(out, "{}", reply).and_then(|_| out.flush()).is_err() {
                    break;
                }
            }
            Reply::Quit => break,
        }
    }
}
