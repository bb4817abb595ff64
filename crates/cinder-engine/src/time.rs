//! Time management: derive soft and hard search budgets from the UCI clock.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use cinder_core::{Color, Position};

use crate::search::control::SearchControl;

/// Fraction of the per-move allocation spent before the soft deadline.
const SOFT_TIME_FACTOR: f64 = 0.4;

/// Hard deadline as a multiple of the soft deadline.
const HARD_TIME_FACTOR: f64 = 2.5;

/// Milliseconds always held back so the flag never falls on overhead.
const SAFETY_BUFFER_MS: u64 = 50;

/// Floor for any computed budget, in milliseconds.
const MIN_SEARCH_TIME_MS: u64 = 10;

/// Clock fields of the UCI `go` command, in milliseconds. Absent fields
/// stay 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockParams {
    /// White's remaining time.
    pub wtime: u64,
    /// Black's remaining time.
    pub btime: u64,
    /// White's increment per move.
    pub winc: u64,
    /// Black's increment per move.
    pub binc: u64,
    /// Moves until the next time control, 0 when unknown.
    pub movestogo: u32,
    /// Fixed time for this move; overrides the clock when nonzero.
    pub movetime: u64,
}

/// Guess how many moves remain, from material and move number.
///
/// Openings budget for a long game ahead, endgames for a short one.
pub fn estimate_moves_to_go(pos: &Position) -> u32 {
    let pieces = pos.piece_count();
    let full_moves = pos.full_move_number() as i64;

    let estimate = if pieces >= 24 {
        (35 - full_moves / 2).max(25)
    } else if pieces >= 12 {
        (25 - full_moves / 3).max(15)
    } else {
        (15 - full_moves / 4).max(8)
    };
    estimate as u32
}

/// Compute the `(soft, hard)` budgets for this move, or `None` for an
/// unconstrained search.
pub fn calculate_search_time(pos: &Position, clock: &ClockParams) -> Option<(Duration, Duration)> {
    // No clock information at all means `go infinite`.
    if clock.wtime == 0 && clock.btime == 0 && clock.movetime == 0 {
        return None;
    }

    if clock.movetime > 0 {
        let fixed = Duration::from_millis(clock.movetime);
        return Some((fixed, fixed));
    }

    let (remaining, increment) = match pos.side_to_move() {
        Color::White => (clock.wtime, clock.winc),
        Color::Black => (clock.btime, clock.binc),
    };

    // Nearly flagged: spend the bare minimum and move.
    if remaining < SAFETY_BUFFER_MS {
        let min = Duration::from_millis(MIN_SEARCH_TIME_MS);
        return Some((min, min));
    }

    let moves_to_go = if clock.movestogo > 0 {
        clock.movestogo
    } else {
        estimate_moves_to_go(pos)
    } as u64;

    // Increments for the remaining moves are already ours to spend.
    let effective = remaining - SAFETY_BUFFER_MS + increment * (moves_to_go - 1);
    let base = effective / moves_to_go;

    let soft = ((base as f64 * SOFT_TIME_FACTOR) as u64).max(MIN_SEARCH_TIME_MS);
    let hard = ((soft as f64 * HARD_TIME_FACTOR) as u64).max(MIN_SEARCH_TIME_MS);

    let cap = remaining - SAFETY_BUFFER_MS;
    Some((
        Duration::from_millis(soft.min(cap)),
        Duration::from_millis(hard.min(cap)),
    ))
}

/// Build a [`SearchControl`] for the `go` parameters and current position.
pub fn limits_from_go(
    clock: &ClockParams,
    infinite: bool,
    pos: &Position,
    stopped: Arc<AtomicBool>,
) -> SearchControl {
    if infinite {
        return SearchControl::new_infinite(stopped);
    }
    match calculate_search_time(pos, clock) {
        Some((soft, hard)) => SearchControl::new_timed(stopped, soft, hard),
        None => SearchControl::new_infinite(stopped),
    }
}
