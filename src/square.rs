//! Board coordinates.
//!
//! A square is addressed either algebraically ("e4") or by zero-based
//! `(column, line)` where column 0 is the a-file and line 0 is rank 8, the
//! top row when the board is drawn.

use std::fmt;
use std::str::FromStr;

use crate::error::{ChessError, ChessResult};

pub const BOARD_SIZE: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    // Field order gives a top-to-bottom, left-to-right ordering.
    line: u8,
    column: u8,
}

impl Square {
    pub fn new(column: u8, line: u8) -> ChessResult<Self> {
        if column >= BOARD_SIZE || line >= BOARD_SIZE {
            return Err(ChessError::InvalidSquare(format!(
                "column {column}, line {line} is off the board"
            )));
        }
        Ok(Self { line, column })
    }

    /// Unchecked constructor for coordinates known to be on the board.
    pub(crate) const fn at(column: u8, line: u8) -> Self {
        Self { line, column }
    }

    pub fn column(self) -> u8 {
        self.column
    }

    pub fn line(self) -> u8 {
        self.line
    }

    pub fn file(self) -> char {
        (b'a' + self.column) as char
    }

    pub fn rank(self) -> char {
        (b'0' + BOARD_SIZE - self.line) as char
    }

    /// Rank as a number, 1 for the bottom row and 8 for the top row.
    pub fn rank_number(self) -> u8 {
        BOARD_SIZE - self.line
    }

    /// Step `d_file` files to the right and `d_rank` ranks up, if that stays
    /// on the board. Ranks grow upwards while lines grow downwards.
    pub fn offset(self, d_file: i8, d_rank: i8) -> Option<Square> {
        let column = self.column as i8 + d_file;
        let line = self.line as i8 - d_rank;
        if (0..BOARD_SIZE as i8).contains(&column) && (0..BOARD_SIZE as i8).contains(&line) {
            Some(Square {
                line: line as u8,
                column: column as u8,
            })
        } else {
            None
        }
    }

    /// Every square, a8 first and h1 last.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..BOARD_SIZE).flat_map(|line| (0..BOARD_SIZE).map(move |column| Square { line, column }))
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(file), Some(rank), None) => {
                Square::new(column_from_file(file)?, line_from_rank(rank)?)
            }
            _ => Err(ChessError::InvalidSquare(format!("'{s}' is not a square"))),
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

pub fn file_from_column(column: u8) -> ChessResult<char> {
    if column >= BOARD_SIZE {
        return Err(ChessError::InvalidSquare(format!("column {column}")));
    }
    Ok((b'a' + column) as char)
}

pub fn rank_from_line(line: u8) -> ChessResult<char> {
    if line >= BOARD_SIZE {
        return Err(ChessError::InvalidSquare(format!("line {line}")));
    }
    Ok((b'0' + BOARD_SIZE - line) as char)
}

pub fn column_from_file(file: char) -> ChessResult<u8> {
    match file {
        'a'..='h' => Ok(file as u8 - b'a'),
        _ => Err(ChessError::InvalidSquare(format!("file '{file}'"))),
    }
}

pub fn line_from_rank(rank: char) -> ChessResult<u8> {
    match rank {
        '1'..='8' => Ok(BOARD_SIZE - (rank as u8 - b'0')),
        _ => Err(ChessError::InvalidSquare(format!("rank '{rank}'"))),
    }
}

/// Map a pixel position inside the drawn board to the square under it.
///
/// The board is drawn with a8 in the top-left corner; `square_size` is the
/// edge length of one square in pixels.
pub fn square_from_click(position: (u32, u32), square_size: u32) -> ChessResult<Square> {
    if square_size == 0 {
        return Err(ChessError::InvalidSquare("square size is zero".to_string()));
    }
    let (x, y) = position;
    let column = x / square_size;
    let line = y / square_size;
    if column >= BOARD_SIZE as u32 || line >= BOARD_SIZE as u32 {
        return Err(ChessError::InvalidSquare(format!(
            "click ({x}, {y}) is outside the board"
        )));
    }
    Square::new(column as u8, line as u8)
}
