//! Error types for the rules engine.

use crate::square::Square;

/// Errors raised by board construction and rule queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChessError {
    /// The FEN placement field could not be walked.
    #[error("bad FEN: {0}")]
    BadFen(String),

    /// A letter in the FEN placement field is not a piece.
    #[error("illegal piece letter: '{0}'")]
    IllegalPiece(char),

    /// A piece was required but the square is empty.
    #[error("square {0} is empty")]
    EmptySquare(Square),

    #[error("invalid square: {0}")]
    InvalidSquare(String),

    /// The destination is not in the legal move set of the origin.
    #[error("illegal move: {from} -> {to}")]
    IllegalMove { from: Square, to: Square },
}

pub type ChessResult<T> = Result<T, ChessError>;
