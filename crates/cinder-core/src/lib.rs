//! Board collaborator for the cinder engine.
//!
//! Chess rules, move generation, Zobrist hashing, and FEN handling come from
//! [`shakmaty`]; this crate wraps them in a [`Position`] facade that adds the
//! state the rules crate does not keep: an undo stack for exactly-reversible
//! make/unmake and a hash history for repetition detection.

mod error;
mod outcome;
mod position;
mod pretty;

pub use error::{FenError, MoveError};
pub use outcome::{GameOverReason, GameResult};
pub use position::{Position, STARTING_FEN};
pub use pretty::PrettyPosition;

pub use shakmaty::{Bitboard, CastlingMode, Color, File, Move, MoveList, Piece, Rank, Role, Square};
