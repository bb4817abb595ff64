//! Error types for FEN and UCI move parsing.

/// Errors that occur when parsing a FEN string into a [`Position`](crate::Position).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    /// The string is not syntactically valid FEN.
    #[error("unparsable FEN: \"{fen}\"")]
    Syntax {
        /// The offending FEN string.
        fen: String,
    },
    /// The FEN parsed but does not describe a legal chess position.
    #[error("illegal position: \"{fen}\"")]
    IllegalPosition {
        /// The offending FEN string.
        fen: String,
    },
}

/// Errors that occur when interpreting a UCI move string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// The string is not of the form `e2e4` / `e7e8q`.
    #[error("unparsable UCI move: \"{uci}\"")]
    Syntax {
        /// The offending move string.
        uci: String,
    },
    /// The move parsed but is not legal in the current position.
    #[error("illegal move: \"{uci}\"")]
    Illegal {
        /// The offending move string.
        uci: String,
    },
}
