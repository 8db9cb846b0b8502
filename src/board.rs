use std::fmt;

use tracing::debug;

use crate::error::{ChessError, ChessResult};
use crate::square::{Square, BOARD_SIZE};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

// Indexed by [color][kind].
const FIGURINES: [[char; 6]; 2] = [
    ['♙', '♘', '♗', '♖', '♕', '♔'],
    ['♟', '♞', '♝', '♜', '♛', '♚'],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Case-insensitive FEN letter lookup.
    pub fn from_letter(letter: char) -> ChessResult<Self> {
        match letter.to_ascii_lowercase() {
            'p' => Ok(PieceKind::Pawn),
            'n' => Ok(PieceKind::Knight),
            'b' => Ok(PieceKind::Bishop),
            'r' => Ok(PieceKind::Rook),
            'q' => Ok(PieceKind::Queen),
            'k' => Ok(PieceKind::King),
            _ => Err(ChessError::IllegalPiece(letter)),
        }
    }

    /// Uppercase FEN letter.
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Light,
    Dark,
}

impl Color {
    /// Player order: Light moves first.
    pub const ALL: [Color; 2] = [Color::Light, Color::Dark];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(&self) -> Color {
        match self {
            Color::Light => Color::Dark,
            Color::Dark => Color::Light,
        }
    }

    /// Rank step of a pawn push.
    pub fn forward(self) -> i8 {
        match self {
            Color::Light => 1,
            Color::Dark => -1,
        }
    }

    pub fn pawn_start_rank(self) -> u8 {
        match self {
            Color::Light => 2,
            Color::Dark => 7,
        }
    }

    /// Line holding this side's pieces at the start of a game.
    pub fn back_line(self) -> u8 {
        match self {
            Color::Light => BOARD_SIZE - 1,
            Color::Dark => 0,
        }
    }

    pub fn king_home(self) -> Square {
        Square::at(4, self.back_line())
    }

    pub fn short_rook_home(self) -> Square {
        Square::at(7, self.back_line())
    }

    pub fn long_rook_home(self) -> Square {
        Square::at(0, self.back_line())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Light => f.write_str("light"),
            Color::Dark => f.write_str("dark"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// Uppercase letters are light pieces, lowercase letters dark ones.
    pub fn from_fen_char(letter: char) -> ChessResult<Self> {
        let kind = PieceKind::from_letter(letter)?;
        let color = if letter.is_uppercase() {
            Color::Light
        } else {
            Color::Dark
        };
        Ok(Self { kind, color })
    }

    pub fn fen_char(self) -> char {
        match self.color {
            Color::Light => self.kind.letter(),
            Color::Dark => self.kind.letter().to_ascii_lowercase(),
        }
    }

    pub fn symbol(self) -> char {
        FIGURINES[self.color.index()][self.kind.index()]
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.kind)
    }
}

/// Which castling pieces of one side have left their home squares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRights {
    pub king_moved: bool,
    pub short_rook_moved: bool,
    pub long_rook_moved: bool,
}

impl CastlingRights {
    pub fn may_castle_short(&self) -> bool {
        !self.king_moved && !self.short_rook_moved
    }

    pub fn may_castle_long(&self) -> bool {
        !self.king_moved && !self.long_rook_moved
    }
}

/// Piece placement plus per-side castling flags.
///
/// Squares are stored by `[line][column]`, so the first row is rank 8, the
/// same order FEN lists them in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
    castling: [CastlingRights; 2],
}

impl Board {
    /// Standard starting position.
    pub fn new() -> Self {
        let mut board = Self::empty();
        for color in Color::ALL {
            let back = color.back_line();
            let pawns = match color {
                Color::Light => back - 1,
                Color::Dark => back + 1,
            };
            for (column, kind) in BACK_RANK.iter().enumerate() {
                board.squares[back as usize][column] = Some(Piece::new(*kind, color));
                board.squares[pawns as usize][column] = Some(Piece::new(PieceKind::Pawn, color));
            }
        }
        board
    }

    pub fn empty() -> Self {
        Self {
            squares: [[None; 8]; 8],
            castling: [CastlingRights::default(); 2],
        }
    }

    /// Build a board from the placement field of a FEN string.
    ///
    /// Digits skip that many squares, letters place a piece and advance by
    /// one, and running off the end of a line wraps to the next one. Any
    /// trailing fields (side to move, castling, ...) are split off and
    /// ignored here.
    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        let placement = fen
            .split_whitespace()
            .next()
            .ok_or_else(|| ChessError::BadFen("empty FEN string".to_string()))?;

        let total = (BOARD_SIZE as usize) * (BOARD_SIZE as usize);
        let mut board = Self::empty();
        let mut index = 0usize;
        for rank_text in placement.split('/') {
            for ch in rank_text.chars() {
                if let Some(run) = ch.to_digit(10) {
                    index += run as usize;
                } else if ch.is_alphabetic() {
                    let piece = Piece::from_fen_char(ch)?;
                    if index >= total {
                        return Err(ChessError::BadFen(format!(
                            "piece '{ch}' runs past the last square in '{placement}'"
                        )));
                    }
                    board.squares[index / 8][index % 8] = Some(piece);
                    index += 1;
                } else {
                    return Err(ChessError::BadFen(format!(
                        "unexpected character '{ch}' in '{placement}'"
                    )));
                }
            }
        }
        if index != total {
            return Err(ChessError::BadFen(format!(
                "placement '{placement}' covers {index} of {total} squares"
            )));
        }

        debug!(placement, "loaded board from FEN");
        Ok(board)
    }

    /// Placement field of the FEN for this board.
    pub fn placement(&self) -> String {
        let mut out = String::with_capacity(72);
        for (line, row) in self.squares.iter().enumerate() {
            if line > 0 {
                out.push('/');
            }
            let mut empty = 0u8;
            for cell in row {
                match cell {
                    Some(piece) => {
                        if empty > 0 {
                            out.push((b'0' + empty) as char);
                            empty = 0;
                        }
                        out.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push((b'0' + empty) as char);
            }
        }
        out
    }

    /// Castling availability field ("KQkq" subset or "-") as FEN writes it.
    pub fn castling_field(&self) -> String {
        let mut out = String::new();
        for color in Color::ALL {
            let (short, long) = if color == Color::Light {
                ('K', 'Q')
            } else {
                ('k', 'q')
            };
            if self.castling_intact(color, color.short_rook_home()) {
                out.push(short);
            }
            if self.castling_intact(color, color.long_rook_home()) {
                out.push(long);
            }
        }
        if out.is_empty() {
            out.push('-');
        }
        out
    }

    /// Reset the castling flags from a FEN castling field.
    ///
    /// A wing whose letter is absent counts as having moved its rook, and a
    /// side with no letters at all counts as having moved its king.
    pub fn set_castling_field(&mut self, field: &str) -> ChessResult<()> {
        let mut rights = [CastlingRights {
            king_moved: true,
            short_rook_moved: true,
            long_rook_moved: true,
        }; 2];

        if field != "-" {
            for letter in field.chars() {
                let color = match letter {
                    'K' | 'Q' => Color::Light,
                    'k' | 'q' => Color::Dark,
                    _ => {
                        return Err(ChessError::BadFen(format!(
                            "unexpected castling letter '{letter}' in '{field}'"
                        )));
                    }
                };
                let side = &mut rights[color.index()];
                side.king_moved = false;
                if letter.eq_ignore_ascii_case(&'k') {
                    side.short_rook_moved = false;
                } else {
                    side.long_rook_moved = false;
                }
            }
        }

        self.castling = rights;
        Ok(())
    }

    /// True when neither the king nor the rook on `rook_home` has moved and
    /// both still stand on their home squares.
    pub fn castling_intact(&self, color: Color, rook_home: Square) -> bool {
        let rights = self.castling[color.index()];
        let rook_unmoved = if rook_home == color.short_rook_home() {
            rights.may_castle_short()
        } else if rook_home == color.long_rook_home() {
            rights.may_castle_long()
        } else {
            false
        };
        rook_unmoved
            && self.piece_at(color.king_home()) == Some(Piece::new(PieceKind::King, color))
            && self.piece_at(rook_home) == Some(Piece::new(PieceKind::Rook, color))
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.line() as usize][square.column() as usize]
    }

    pub fn piece_required(&self, square: Square) -> ChessResult<Piece> {
        self.piece_at(square)
            .ok_or(ChessError::EmptySquare(square))
    }

    /// Owner of the piece on `square`.
    pub fn player_at(&self, square: Square) -> ChessResult<Color> {
        self.piece_required(square).map(|piece| piece.color)
    }

    pub fn is_occupied(&self, square: Square) -> bool {
        self.piece_at(square).is_some()
    }

    pub fn place(&mut self, square: Square, piece: Piece) {
        self.squares[square.line() as usize][square.column() as usize] = Some(piece);
    }

    pub fn remove(&mut self, square: Square) -> Option<Piece> {
        self.squares[square.line() as usize][square.column() as usize].take()
    }

    pub fn castling_rights(&self, color: Color) -> CastlingRights {
        self.castling[color.index()]
    }

    /// Relocate whatever stands on `from` to `to`, overwriting `to`.
    ///
    /// No legality check happens here. Moving a king or a rook off its home
    /// corner updates that side's castling flags.
    pub fn move_piece(&mut self, from: Square, to: Square) {
        let Some(piece) = self.remove(from) else {
            return;
        };

        let rights = &mut self.castling[piece.color.index()];
        match piece.kind {
            PieceKind::King => rights.king_moved = true,
            PieceKind::Rook if from == piece.color.short_rook_home() => {
                rights.short_rook_moved = true
            }
            PieceKind::Rook if from == piece.color.long_rook_home() => {
                rights.long_rook_moved = true
            }
            _ => {}
        }

        self.place(to, piece);
        debug!(%from, %to, %piece, "moved piece");
    }

    /// Tentatively relocate `from` to `to`, run `query` on the result, then
    /// put both squares back exactly as they were.
    ///
    /// Castling flags are never touched.
    pub fn simulate<R>(&mut self, from: Square, to: Square, query: impl FnOnce(&Board) -> R) -> R {
        let moving = self.piece_at(from);
        let displaced = self.piece_at(to);

        self.squares[from.line() as usize][from.column() as usize] = None;
        self.squares[to.line() as usize][to.column() as usize] = moving;
        let result = query(self);

        self.squares[to.line() as usize][to.column() as usize] = displaced;
        self.squares[from.line() as usize][from.column() as usize] = moving;
        result
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        let king = Piece::new(PieceKind::King, color);
        Square::all().find(|&square| self.piece_at(square) == Some(king))
    }

    /// Occupied squares belonging to `color`, a8 first.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |square| match self.piece_at(square) {
            Some(piece) if piece.color == color => Some((square, piece)),
            _ => None,
        })
    }

    /// Labelled board for a terminal, rank 8 at the top.
    pub fn render(&self, figurines: bool) -> String {
        let mut out = String::new();
        for (line, row) in self.squares.iter().enumerate() {
            out.push((b'0' + BOARD_SIZE - line as u8) as char);
            for cell in row {
                out.push(' ');
                out.push(match cell {
                    Some(piece) if figurines => piece.symbol(),
                    Some(piece) => piece.fen_char(),
                    None => '.',
                });
            }
            out.push('\n');
        }
        out.push_str("  a b c d e f g h\n");
        out
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in &self.squares {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| cell.map_or('.', Piece::fen_char).to_string())
                .collect();
            writeln!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}
