//! Line protocol.
//!
//! One command per input line, one JSON object per output line. The parser
//! turns text into `Command`s and the response module runs them against a
//! [`crate::game::Game`].

pub mod parser;
pub mod response;

pub use parser::{parse_command, Command, ParseError, Verdict};
pub use response::{error_value, execute, handle_line, ErrorResponse, Reply};
