//! Turn handling on top of the board and move generator.
//!
//! `Game` owns the board, the side to move and the current selection. A
//! presentation layer feeds it clicks and reads back the selection to
//! highlight.

use tracing::{debug, info, warn};

use crate::board::{Board, Color, PieceKind};
use crate::error::{ChessError, ChessResult};
use crate::movegen::{MoveGenerator, MoveSet};
use crate::square::{square_from_click, Square};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    WaitingForSelection,
    PieceSelected { square: Square, moves: MoveSet },
}

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Selected { square: Square, moves: MoveSet },
    Deselected(Square),
    Moved { from: Square, to: Square },
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Check(Color),
    Checkmate { winner: Color },
    Stalemate,
}

#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    generator: MoveGenerator,
    current_player: Color,
    selection: Selection,
}

impl Game {
    /// Light to move on `board`.
    pub fn new(board: Board) -> Self {
        Self {
            board,
            generator: MoveGenerator::new(),
            current_player: Color::Light,
            selection: Selection::WaitingForSelection,
        }
    }

    /// Load a position. The active-color and castling fields are honoured
    /// when present.
    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        let mut board = Board::from_fen(fen)?;
        let mut fields = fen.split_whitespace().skip(1);
        let current_player = match fields.next() {
            None | Some("w") => Color::Light,
            Some("b") => Color::Dark,
            Some(other) => {
                return Err(ChessError::BadFen(format!("unknown side to move '{other}'")));
            }
        };
        if let Some(castling) = fields.next() {
            board.set_castling_field(castling)?;
        }
        let mut game = Self::new(board);
        game.current_player = current_player;
        Ok(game)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn generator(&self) -> &MoveGenerator {
        &self.generator
    }

    pub fn current_player(&self) -> Color {
        self.current_player
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn switch_player(&mut self) {
        self.current_player = self.current_player.opposite();
    }

    pub fn is_occupied_by_current_player(&self, square: Square) -> bool {
        matches!(self.board.piece_at(square), Some(piece) if piece.color == self.current_player)
    }

    pub fn legal_moves(&self, square: Square) -> ChessResult<MoveSet> {
        self.generator.legal_moves(&self.board, square)
    }

    pub fn click_pixel(&mut self, position: (u32, u32), square_size: u32) -> ChessResult<ClickOutcome> {
        let square = square_from_click(position, square_size)?;
        self.click(square)
    }

    pub fn click(&mut self, square: Square) -> ChessResult<ClickOutcome> {
        let outcome = match self.selection.clone() {
            Selection::WaitingForSelection => {
                if self.is_occupied_by_current_player(square) {
                    self.select(square)?
                } else {
                    ClickOutcome::Ignored
                }
            }
            Selection::PieceSelected { square: selected, moves } => {
                if square == selected {
                    self.selection = Selection::WaitingForSelection;
                    ClickOutcome::Deselected(square)
                } else if moves.contains(&square) {
                    self.apply(selected, square);
                    ClickOutcome::Moved {
                        from: selected,
                        to: square,
                    }
                } else if self.is_occupied_by_current_player(square) {
                    self.select(square)?
                } else {
                    ClickOutcome::Ignored
                }
            }
        };
        debug!(%square, ?outcome, "click");
        Ok(outcome)
    }

    fn select(&mut self, square: Square) -> ChessResult<ClickOutcome> {
        let moves = self.legal_moves(square)?;
        self.selection = Selection::PieceSelected {
            square,
            moves: moves.clone(),
        };
        Ok(ClickOutcome::Selected { square, moves })
    }

    /// Play `from` -> `to` for the side to move, checking legality first.
    pub fn play(&mut self, from: Square, to: Square) -> ChessResult<()> {
        let piece = self.board.piece_required(from)?;
        if piece.color != self.current_player || !self.legal_moves(from)?.contains(&to) {
            warn!(%from, %to, player = %self.current_player, "rejected move");
            return Err(ChessError::IllegalMove { from, to });
        }
        self.apply(from, to);
        Ok(())
    }

    /// Apply an already validated move, hop the rook when the king castles,
    /// and hand the turn over.
    fn apply(&mut self, from: Square, to: Square) {
        let castling_king = matches!(
            self.board.piece_at(from),
            Some(piece) if piece.kind == PieceKind::King && from == piece.color.king_home()
        );
        self.board.move_piece(from, to);

        if castling_king && from.column().abs_diff(to.column()) == 2 {
            let line = from.line();
            let (rook_from, rook_to) = if to.column() > from.column() {
                (Square::at(7, line), Square::at(5, line))
            } else {
                (Square::at(0, line), Square::at(3, line))
            };
            self.board.move_piece(rook_from, rook_to);
        }

        self.selection = Selection::WaitingForSelection;
        self.switch_player();

        let status = self.status();
        if status != GameStatus::Ongoing {
            info!(?status, "game status changed");
        }
    }

    /// Status from the point of view of the side to move.
    pub fn status(&self) -> GameStatus {
        let player = self.current_player;
        let in_check = self
            .board
            .king_square(player)
            .is_some_and(|king| self.generator.is_attacked(&self.board, king, player));

        if in_check {
            if self.generator.has_any_legal_move(&self.board, player) {
                GameStatus::Check(player)
            } else {
                GameStatus::Checkmate {
                    winner: player.opposite(),
                }
            }
        } else if self.generator.is_stalemate(&self.board, player) {
            GameStatus::Stalemate
        } else {
            GameStatus::Ongoing
        }
    }

    /// Full six-field FEN. No en passant target and fresh move counters are
    /// written since neither is tracked.
    pub fn to_fen(&self) -> String {
        let side = match self.current_player {
            Color::Light => 'w',
            Color::Dark => 'b',
        };
        format!(
            "{} {} {} - 0 1",
            self.board.placement(),
            side,
            self.board.castling_field()
        )
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(Board::new())
    }
}
