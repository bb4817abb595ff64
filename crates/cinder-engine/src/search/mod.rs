//! Search algorithms and move ordering.

pub mod control;
pub mod heuristics;
pub mod negamax;
pub mod ordering;
pub mod tt;

use cinder_core::{Move, Position};
use tracing::debug;

use control::SearchControl;
use heuristics::{HistoryTable, KillerTable};
use negamax::{MATE_SCORE, PvTable, SearchContext, negamax};
use tt::{DEFAULT_TT_BITS, TranspositionTable, TtStats};

/// Iterative deepening never exceeds this depth; it also sizes the
/// triangular PV table.
pub const MAX_DEPTH: usize = 64;

/// Result of a completed search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best move from the last completed iteration, `None` when the root
    /// has no legal moves.
    pub best_move: Option<Move>,
    /// Principal variation supporting `best_move`.
    pub pv: Vec<Move>,
    /// Score in centipawns from the side to move's perspective.
    pub score: i32,
    /// Nodes visited over all iterations.
    pub nodes: u64,
    /// Deepest completed iteration.
    pub depth: i32,
}

/// Iterative-deepening searcher owning the transposition table.
///
/// The table lives as long as the searcher and is only cleared on
/// `ucinewgame`; killers, history, and the PV table are rebuilt per search.
pub struct Searcher {
    tt: TranspositionTable,
}

impl Searcher {
    /// Create a searcher with the default-sized transposition table.
    pub fn new() -> Self {
        Self::with_tt_bits(DEFAULT_TT_BITS)
    }

    /// Create a searcher with a `2^bits`-slot transposition table.
    pub fn with_tt_bits(bits: u32) -> Self {
        Self {
            tt: TranspositionTable::new(bits),
        }
    }

    /// Clear the transposition table, preserving the allocation.
    pub fn clear_tt(&mut self) {
        self.tt.clear();
        debug!("transposition table cleared");
    }

    /// Table hit/store counters for the `ttstats` command.
    pub fn tt_stats(&self) -> TtStats {
        self.tt.stats()
    }

    /// Run iterative-deepening search up to `max_depth`.
    ///
    /// Calls `on_iter(depth, score, nodes, pv)` after each completed
    /// iteration so the caller can emit UCI `info` lines (or capture them
    /// in tests). The final result always carries the last fully completed
    /// iteration; an aborted iteration is discarded.
    pub fn search<F>(
        &mut self,
        pos: &Position,
        max_depth: i32,
        control: &SearchControl,
        mut on_iter: F,
    ) -> SearchResult
    where
        F: FnMut(i32, i32, u64, &[Move]),
    {
        let mut pos = pos.clone();
        let mut ctx = SearchContext {
            nodes: 0,
            tt: &mut self.tt,
            pv: PvTable::new(),
            control,
            killers: KillerTable::new(),
            history: HistoryTable::new(),
        };

        let mut best_move: Option<Move> = None;
        let mut best_line: Vec<Move> = Vec::new();
        let mut best_score = 0;
        let mut completed_depth = 0;

        // Best-move stability feeds the soft-deadline extension.
        let mut last_iteration_best_move: Option<Move> = None;
        let mut best_move_changes = 0u32;

        for depth in 1..=max_depth.clamp(1, MAX_DEPTH as i32) {
            let score = negamax(&mut pos, depth, -MATE_SCORE, MATE_SCORE, 0, true, &mut ctx);

            // A depth-1 iteration is kept even when interrupted; anything is
            // better than no move at all.
            if control.is_stopped() && depth > 1 {
                break;
            }

            let line = ctx.pv.root_line();
            if let Some(first) = line.first().cloned() {
                if last_iteration_best_move.is_some() && last_iteration_best_move != Some(first.clone()) {
                    best_move_changes += 1;
                }
                best_move = Some(first);
                best_line = line;
                last_iteration_best_move = best_move.clone();
            }
            best_score = score;
            completed_depth = depth;

            on_iter(depth, score, ctx.nodes, &best_line);

            if should_stop_iterating(control, &mut best_move_changes) {
                break;
            }
        }

        let nodes = ctx.nodes;

        // Never resign by accident: if no iteration produced a PV, any
        // legal move beats returning nothing.
        if best_move.is_none() {
            best_move = pos.legal_moves().first().cloned();
            if let Some(m) = best_move.clone() {
                best_line = vec![m];
            }
        }

        SearchResult {
            best_move,
            pv: best_line,
            score: best_score,
            nodes,
            depth: completed_depth,
        }
    }
}

/// Decide between iterations whether to deepen further.
///
/// Crossing the soft deadline normally stops the loop. When the best move
/// changed at least twice since the last check and less than a third of the
/// hard budget is spent, the position is considered unstable: the soft limit
/// grows 30% once and the change counter resets.
fn should_stop_iterating(control: &SearchControl, best_move_changes: &mut u32) -> bool {
    if control.is_stopped() {
        return true;
    }
    if !control.should_stop_iterating() {
        return false;
    }
    if *best_move_changes >= 2
        && let Some(hard) = control.hard_limit()
        && control.elapsed() < hard / 3
    {
        control.extend_soft();
        *best_move_changes = 0;
        return false;
    }
    true
}

impl std::fmt::Debug for Searcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Searcher").field("tt", &self.tt).finish()
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}
