//! UCI command parsing.

use cinder_core::Position;
use cinder_engine::ClockParams;
use tracing::warn;

use crate::error::UciError;

/// Parameters of the `go` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoParams {
    /// Clock fields (`wtime btime winc binc movestogo movetime`).
    pub clock: ClockParams,
    /// `go depth N` limit, if given.
    pub depth: Option<i32>,
    /// `go infinite`.
    pub infinite: bool,
}

/// A parsed UCI command.
#[derive(Debug)]
pub enum Command {
    /// `uci`: identify the engine.
    Uci,
    /// `isready`: synchronization ping.
    IsReady,
    /// `ucinewgame`: reset engine state for a fresh game.
    UciNewGame,
    /// `position`: set up a board with optional moves applied.
    Position(Position),
    /// `go`: start searching.
    Go(GoParams),
    /// `stop`: halt the current search.
    Stop,
    /// `quit`: exit the engine.
    Quit,
    /// `d`: print the current board (extension).
    Print,
    /// `ttstats`: print transposition-table counters (extension).
    TtStats,
    /// Unrecognized command, silently ignored per the UCI convention.
    Unknown(String),
}

/// Parse a single line of UCI input into a [`Command`].
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(Command::Unknown(String::new()));
    }

    match tokens[0] {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "d" => Ok(Command::Print),
        "ttstats" => Ok(Command::TtStats),
        "position" => parse_position(&tokens[1..]),
        "go" => parse_go(&tokens[1..]),
        _ => Ok(Command::Unknown(tokens[0].to_string())),
    }
}

/// Parse the `position` command arguments.
///
/// Supports:
/// - `position startpos [moves e2e4 d7d5 ...]`
/// - `position fen <6-field-fen> [moves e2e4 d7d5 ...]`
///
/// An illegal move in the list is logged and stops the application of the
/// remaining moves; the prefix played so far stands.
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    if tokens.is_empty() {
        return Err(UciError::MalformedPosition);
    }

    let (mut pos, rest) = if tokens[0] == "startpos" {
        (Position::starting_position(), &tokens[1..])
    } else if tokens[0] == "fen" {
        if tokens.len() < 7 {
            return Err(UciError::InvalidFen {
                fen: tokens[1..].join(" "),
            });
        }
        let fen = tokens[1..7].join(" ");
        let pos = Position::from_fen(&fen).map_err(|_| UciError::InvalidFen { fen })?;
        (pos, &tokens[7..])
    } else {
        return Err(UciError::MalformedPosition);
    };

    if let Some((&"moves", moves)) = rest.split_first() {
        for uci in moves {
            match pos.parse_uci_move(uci) {
                Ok(m) => pos.make(&m),
                Err(err) => {
                    warn!(%err, "stopping move application");
                    break;
                }
            }
        }
    }

    Ok(Command::Position(pos))
}

/// Parse the `go` command arguments. Unknown subcommands are ignored.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    let mut iter = tokens.iter();
    while let Some(&token) = iter.next() {
        match token {
            "infinite" => params.infinite = true,
            "wtime" => params.clock.wtime = parse_value(token, iter.next())?,
            "btime" => params.clock.btime = parse_value(token, iter.next())?,
            "winc" => params.clock.winc = parse_value(token, iter.next())?,
            "binc" => params.clock.binc = parse_value(token, iter.next())?,
            "movestogo" => params.clock.movestogo = parse_value(token, iter.next())?,
            "movetime" => params.clock.movetime = parse_value(token, iter.next())?,
            "depth" => params.depth = Some(parse_value(token, iter.next())?),
            _ => {}
        }
    }

    Ok(Command::Go(params))
}

fn parse_value<T: std::str::FromStr>(param: &str, value: Option<&&str>) -> Result<T, UciError> {
    let value = value.ok_or_else(|| UciError::MissingGoValue {
        param: param.to_string(),
    })?;
    value.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: value.to_string(),
    })
}
