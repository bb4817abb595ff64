//! The [`Position`] facade consumed by the search core.

use std::fmt;
use std::str::FromStr;

use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, MoveList, Piece, Position as _, Square};

use crate::error::{FenError, MoveError};
use crate::outcome::{GameOverReason, GameResult};
use crate::pretty::PrettyPosition;

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A chess position with make/unmake support and repetition history.
///
/// Wraps a [`shakmaty::Chess`] together with the current Zobrist hash and a
/// pair of parallel stacks: previous game states (so [`unmake`](Self::unmake)
/// is exactly reversible) and their hashes (so repetitions can be counted
/// across both the game prefix and the current search path).
#[derive(Clone)]
pub struct Position {
    chess: Chess,
    hash: u64,
    undo: Vec<Chess>,
    hashes: Vec<u64>,
}

fn compute_hash(chess: &Chess) -> u64 {
    chess.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0
}

impl Position {
    /// The standard starting position with empty history.
    pub fn starting_position() -> Self {
        let chess = Chess::default();
        let hash = compute_hash(&chess);
        Self {
            chess,
            hash,
            undo: Vec::new(),
            hashes: Vec::new(),
        }
    }

    /// Parse a 6-field FEN string. The history starts empty.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parsed: Fen = fen.parse().map_err(|_| FenError::Syntax { fen: fen.to_string() })?;
        let chess: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|_| FenError::IllegalPosition { fen: fen.to_string() })?;
        let hash = compute_hash(&chess);
        Ok(Self {
            chess,
            hash,
            undo: Vec::new(),
            hashes: Vec::new(),
        })
    }

    /// The current position as a FEN string.
    pub fn fen(&self) -> String {
        Fen::from_position(self.chess.clone(), EnPassantMode::Legal).to_string()
    }

    /// Zobrist hash of the current position.
    ///
    /// Equal positions hash equally; the move counters are not part of the
    /// hash, so repetitions of the same placement collide as intended.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// The side to move.
    pub fn side_to_move(&self) -> Color {
        self.chess.turn()
    }

    /// Whether the side to move is in check.
    pub fn in_check(&self) -> bool {
        self.chess.is_check()
    }

    /// Whether `m` captures a piece (including en passant).
    pub fn is_capture(&self, m: &Move) -> bool {
        m.is_capture()
    }

    /// All legal moves in the current position.
    pub fn legal_moves(&self) -> MoveList {
        self.chess.legal_moves()
    }

    /// Play `m`, pushing the previous state onto the undo stack.
    ///
    /// `m` must be legal in the current position.
    pub fn make(&mut self, m: &Move) {
        self.undo.push(self.chess.clone());
        self.hashes.push(self.hash);
        self.chess.play_unchecked(m);
        self.hash = compute_hash(&self.chess);
    }

    /// Undo the most recent [`make`](Self::make), restoring the previous
    /// state bit-for-bit.
    pub fn unmake(&mut self) {
        debug_assert!(!self.undo.is_empty(), "unmake without a matching make");
        if let (Some(prev), Some(hash)) = (self.undo.pop(), self.hashes.pop()) {
            self.chess = prev;
            self.hash = hash;
        }
    }

    /// Pass the move to the opponent, if doing so leaves a valid position.
    ///
    /// Returns `false` (and leaves the position untouched) when the turn
    /// cannot be swapped, e.g. because the side to move is in check. Undone
    /// with [`unmake_null`](Self::unmake_null).
    pub fn try_make_null(&mut self) -> bool {
        match self.chess.clone().swap_turn() {
            Ok(next) => {
                self.undo.push(std::mem::replace(&mut self.chess, next));
                self.hashes.push(self.hash);
                self.hash = compute_hash(&self.chess);
                true
            }
            Err(_) => false,
        }
    }

    /// Undo a successful [`try_make_null`](Self::try_make_null).
    pub fn unmake_null(&mut self) {
        self.unmake();
    }

    /// Whether the current position occurred at least `n + 1` times, counting
    /// the game prefix and the current search path.
    ///
    /// Only positions since the last irreversible move can repeat, so the
    /// scan is bounded by the halfmove clock.
    pub fn is_repetition(&self, n: usize) -> bool {
        let lookback = (self.chess.halfmoves() as usize).min(self.hashes.len());
        let mut count = 1;
        for hash in self.hashes.iter().rev().take(lookback) {
            if *hash == self.hash {
                count += 1;
                if count > n {
                    return true;
                }
            }
        }
        false
    }

    /// Number of half-moves since the last capture or pawn move.
    pub fn halfmove_clock(&self) -> u32 {
        self.chess.halfmoves()
    }

    /// Whether the fifty-move rule has triggered.
    pub fn is_half_move_draw(&self) -> bool {
        self.chess.halfmoves() >= 100
    }

    /// Result claimed under the fifty-move rule: a mate on the hundredth
    /// half-move still wins, anything else is a draw.
    pub fn half_move_draw_type(&self) -> GameResult {
        if self.chess.is_checkmate() {
            GameResult::Loss
        } else {
            GameResult::Draw
        }
    }

    /// Whether neither side can deliver mate with the remaining material.
    pub fn is_insufficient_material(&self) -> bool {
        self.chess.is_insufficient_material()
    }

    /// Why and how the game ended, or `None` while it is still in progress.
    pub fn game_result(&self) -> Option<(GameOverReason, GameResult)> {
        if self.chess.is_checkmate() {
            return Some((GameOverReason::Checkmate, GameResult::Loss));
        }
        if self.chess.is_stalemate() {
            return Some((GameOverReason::Stalemate, GameResult::Draw));
        }
        if self.chess.is_insufficient_material() {
            return Some((GameOverReason::InsufficientMaterial, GameResult::Draw));
        }
        if self.is_half_move_draw() {
            return Some((GameOverReason::FiftyMoves, GameResult::Draw));
        }
        if self.is_repetition(2) {
            return Some((GameOverReason::Repetition, GameResult::Draw));
        }
        None
    }

    /// Whether the game is over for any reason.
    pub fn is_game_over(&self) -> bool {
        self.game_result().is_some()
    }

    /// The piece on `square`, if any.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.chess.board().piece_at(square)
    }

    /// The king square of `color`.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.chess.board().king_of(color)
    }

    /// Number of men on the board, kings excluded.
    pub fn piece_count(&self) -> u32 {
        (self.chess.board().occupied() & !self.chess.board().kings()).count() as u32
    }

    /// The full-move number (starts at 1, incremented after Black moves).
    pub fn full_move_number(&self) -> u32 {
        self.chess.fullmoves().get()
    }

    /// Whether the side to move has a piece other than pawns and the king.
    ///
    /// Null-move pruning must be disabled without such material, where
    /// zugzwang is common.
    pub fn has_non_pawn_material(&self) -> bool {
        let board = self.chess.board();
        let pieces = board.knights() | board.bishops() | board.rooks() | board.queens();
        (board.by_color(self.chess.turn()) & pieces).any()
    }

    /// Interpret a UCI move string (`e2e4`, `e7e8q`) in the current position.
    pub fn parse_uci_move(&self, uci: &str) -> Result<Move, MoveError> {
        let parsed: UciMove = uci.parse().map_err(|_| MoveError::Syntax { uci: uci.to_string() })?;
        parsed
            .to_move(&self.chess)
            .map_err(|_| MoveError::Illegal { uci: uci.to_string() })
    }

    /// UCI notation for `m` (castling rendered king-to-destination, `e1g1`).
    pub fn to_uci(&self, m: &Move) -> String {
        m.to_uci(CastlingMode::Standard).to_string()
    }

    /// Wrapper for pretty-printing the board as an 8x8 grid.
    pub fn pretty(&self) -> PrettyPosition<'_> {
        PrettyPosition(self)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::starting_position()
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position(\"{}\")", self.fen())
    }
}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}
