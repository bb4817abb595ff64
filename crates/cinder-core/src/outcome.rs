//! Game termination reasons and results.

/// Why a game is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    /// The side to move is checkmated.
    Checkmate,
    /// The side to move has no legal moves and is not in check.
    Stalemate,
    /// The current position occurred at least three times.
    Repetition,
    /// One hundred half-moves without a capture or pawn move.
    FiftyMoves,
    /// Neither side can deliver mate with the remaining material.
    InsufficientMaterial,
}

/// Outcome of a finished game, from the side to move's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    /// The side to move lost (it is checkmated).
    Loss,
    /// The game is drawn.
    Draw,
}
