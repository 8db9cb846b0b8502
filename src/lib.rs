pub mod board;
pub mod config;
pub mod console;
pub mod error;
pub mod game;
pub mod movegen;
pub mod square;

pub use board::{Board, CastlingRights, Color, Piece, PieceKind, STARTING_FEN};
pub use error::{ChessError, ChessResult};
pub use game::{ClickOutcome, Game, GameStatus, Selection};
pub use movegen::{MoveGenerator, MoveSet};
pub use square::{square_from_click, Square};
