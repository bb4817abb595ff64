//! ASCII rendering for the UCI `d` command.

use std::fmt;

use shakmaty::{File, Rank, Square};

use crate::position::Position;

/// Wrapper for pretty-printing a position as an 8x8 grid.
pub struct PrettyPosition<'a>(pub(crate) &'a Position);

impl fmt::Display for PrettyPosition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pos = self.0;
        for rank in Rank::ALL.iter().rev() {
            write!(f, "{}  ", u32::from(*rank) + 1)?;
            for file in File::ALL {
                let c = pos
                    .piece_at(Square::from_coords(file, *rank))
                    .map_or('.', |piece| piece.char());
                if file == File::H {
                    write!(f, "{c}")?;
                } else {
                    write!(f, "{c} ")?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "   a b c d e f g h")?;
        write!(f, "fen: {}", pos.fen())
    }
}
