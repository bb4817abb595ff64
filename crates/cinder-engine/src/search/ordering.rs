//! Move ordering: TT move, MVV-LVA captures, promotions, killers, history.

use std::cmp::Reverse;

use cinder_core::{Color, Move, MoveList, Role};

use crate::search::heuristics::HistoryTable;

/// Ordering score for the move from the transposition table.
const TT_MOVE_SCORE: i32 = 10_000;

/// Base score for captures, on top of the MVV-LVA term.
const CAPTURE_BASE: i32 = 3_000;

/// Bonus for the primary killer at this ply.
const PRIMARY_KILLER_SCORE: i32 = 500;

/// Bonus for the secondary killer at this ply.
const SECONDARY_KILLER_SCORE: i32 = 400;

/// Small edge for castling.
const CASTLE_SCORE: i32 = 300;

/// Piece values in centipawns used for capture and promotion ordering.
pub fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => 100,
        Role::Knight => 300,
        Role::Bishop => 320,
        Role::Rook => 500,
        Role::Queen => 900,
        Role::King => 0,
    }
}

/// Score a move for main-search ordering. Higher scores are searched first.
fn score_move(
    m: &Move,
    tt_move: Option<Move>,
    killers: [Option<Move>; 2],
    history: &HistoryTable,
    side: Color,
) -> i32 {
    if tt_move.as_ref() == Some(m) {
        return TT_MOVE_SCORE;
    }

    let mut score = 0;

    if let Some(victim) = m.capture() {
        score += CAPTURE_BASE + piece_value(victim) * 100 - piece_value(m.role());
    } else {
        // Killers and history apply to quiet moves only.
        if killers[0].as_ref() == Some(m) {
            score += PRIMARY_KILLER_SCORE;
        } else if killers[1].as_ref() == Some(m) {
            score += SECONDARY_KILLER_SCORE;
        }
        score += history.score(side, m);
    }

    if let Some(promotion) = m.promotion() {
        score += piece_value(promotion);
    }

    if m.is_castle() {
        score += CASTLE_SCORE;
    }

    score
}

/// MVV-LVA plus promotion score for quiescence ordering.
fn score_tactical(m: &Move) -> i32 {
    let mut score = 0;
    if let Some(victim) = m.capture() {
        score += piece_value(victim) * 100 - piece_value(m.role());
    }
    if let Some(promotion) = m.promotion() {
        score += piece_value(promotion);
    }
    score
}

/// Reorder `moves` in place for the main search.
///
/// Stable sort on descending score: ties keep the move generator's order, so
/// a given position always yields the same sequence.
pub fn order_moves(
    moves: &mut MoveList,
    tt_move: Option<Move>,
    killers: [Option<Move>; 2],
    history: &HistoryTable,
    side: Color,
) {
    moves.sort_by_key(|m| Reverse(score_move(m, tt_move.clone(), killers.clone(), history, side)));
}

/// Restrict `moves` to captures and promotions and order them for
/// quiescence. Killers and history do not apply here.
pub fn order_tactical(moves: &mut MoveList) {
    moves.retain(|m| m.is_capture() || m.is_promotion());
    moves.sort_by_key(|m| Reverse(score_tactical(m)));
}
