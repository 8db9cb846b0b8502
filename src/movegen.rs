use std::collections::BTreeSet;

use tracing::trace;

use crate::board::{Board, Color, Piece, PieceKind};
use crate::error::ChessResult;
use crate::square::Square;

/// Destination squares, ordered a8 first.
pub type MoveSet = BTreeSet<Square>;

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_STEPS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// One castling wing, in columns on the side's back line.
struct Wing {
    rook: u8,
    king_to: u8,
    between: &'static [u8],
    king_path: &'static [u8],
}

const WINGS: [Wing; 2] = [
    Wing {
        rook: 7,
        king_to: 6,
        between: &[5, 6],
        king_path: &[4, 5, 6],
    },
    Wing {
        rook: 0,
        king_to: 2,
        between: &[1, 2, 3],
        king_path: &[4, 3, 2],
    },
];

#[derive(Debug, Clone, Copy, Default)]
pub struct MoveGenerator;

impl MoveGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Walk from `from` in steps of (`d_file`, `d_rank`) for at most `limit`
    /// steps. Empty squares are collected; the first occupied square is
    /// collected only when it holds a piece of the other side, and ends the
    /// walk.
    pub fn squares_ahead(
        &self,
        board: &Board,
        from: Square,
        mover: Color,
        d_file: i8,
        d_rank: i8,
        limit: usize,
    ) -> Vec<Square> {
        let mut squares = Vec::new();
        let mut current = from;
        for _ in 0..limit {
            let Some(next) = current.offset(d_file, d_rank) else {
                break;
            };
            match board.piece_at(next) {
                None => squares.push(next),
                Some(piece) => {
                    if piece.color != mover {
                        squares.push(next);
                    }
                    break;
                }
            }
            current = next;
        }
        squares
    }

    fn rays(
        &self,
        board: &Board,
        from: Square,
        mover: Color,
        directions: &[(i8, i8)],
        limit: usize,
    ) -> MoveSet {
        directions
            .iter()
            .flat_map(|&(d_file, d_rank)| self.squares_ahead(board, from, mover, d_file, d_rank, limit))
            .collect()
    }

    fn pawn_moves(&self, board: &Board, from: Square, color: Color) -> MoveSet {
        let mut moves = MoveSet::new();

        // A piece directly ahead blocks both pushes.
        if let Some(one) = from.offset(0, color.forward()) {
            if !board.is_occupied(one) {
                moves.insert(one);
                if from.rank_number() == color.pawn_start_rank() {
                    if let Some(two) = one.offset(0, color.forward()) {
                        if !board.is_occupied(two) {
                            moves.insert(two);
                        }
                    }
                }
            }
        }

        for target in self.pawn_attacks(from, color) {
            if matches!(board.piece_at(target), Some(piece) if piece.color != color) {
                moves.insert(target);
            }
        }
        moves
    }

    fn pawn_attacks(&self, from: Square, color: Color) -> impl Iterator<Item = Square> {
        [-1, 1]
            .into_iter()
            .filter_map(move |d_file| from.offset(d_file, color.forward()))
    }

    fn knight_moves(&self, board: &Board, from: Square, color: Color) -> MoveSet {
        KNIGHT_OFFSETS
            .iter()
            .filter_map(|&(d_file, d_rank)| from.offset(d_file, d_rank))
            .filter(|&to| !matches!(board.piece_at(to), Some(piece) if piece.color == color))
            .collect()
    }

    fn pseudo_moves_of(&self, board: &Board, from: Square, piece: Piece) -> MoveSet {
        let color = piece.color;
        match piece.kind {
            PieceKind::Pawn => self.pawn_moves(board, from, color),
            PieceKind::Knight => self.knight_moves(board, from, color),
            PieceKind::Bishop => self.rays(board, from, color, &BISHOP_DIRECTIONS, usize::MAX),
            PieceKind::Rook => self.rays(board, from, color, &ROOK_DIRECTIONS, usize::MAX),
            PieceKind::Queen => {
                let mut moves = self.rays(board, from, color, &ROOK_DIRECTIONS, usize::MAX);
                moves.extend(self.rays(board, from, color, &BISHOP_DIRECTIONS, usize::MAX));
                moves
            }
            PieceKind::King => self.rays(board, from, color, &KING_STEPS, 1),
        }
    }

    /// Destinations obeying movement and occupancy rules, without regard to
    /// the mover's king. Castling is not included.
    pub fn pseudo_legal_moves(&self, board: &Board, square: Square) -> ChessResult<MoveSet> {
        let piece = board.piece_required(square)?;
        Ok(self.pseudo_moves_of(board, square, piece))
    }

    /// Squares the piece on `from` threatens. Pawns threaten both forward
    /// diagonals whether or not anything stands there, and never threaten by
    /// pushing.
    fn attack_set(&self, board: &Board, from: Square, piece: Piece) -> MoveSet {
        match piece.kind {
            PieceKind::Pawn => self.pawn_attacks(from, piece.color).collect(),
            _ => self.pseudo_moves_of(board, from, piece),
        }
    }

    /// Squares of the pieces of `defender`'s opponent that attack `square`.
    pub fn attackers(&self, board: &Board, square: Square, defender: Color) -> Vec<Square> {
        board
            .pieces(defender.opposite())
            .filter(|&(from, piece)| self.attack_set(board, from, piece).contains(&square))
            .map(|(from, _)| from)
            .collect()
    }

    pub fn is_attacked(&self, board: &Board, square: Square, defender: Color) -> bool {
        board
            .pieces(defender.opposite())
            .any(|(from, piece)| self.attack_set(board, from, piece).contains(&square))
    }

    fn keeps_king_safe(&self, scratch: &mut Board, from: Square, to: Square, color: Color) -> bool {
        scratch.simulate(from, to, |after| match after.king_square(color) {
            Some(king) => !self.is_attacked(after, king, color),
            None => true,
        })
    }

    /// Legal destinations for the piece on `square`: its pseudo-legal moves
    /// that do not leave its own king attacked, plus castling for a king.
    pub fn legal_moves(&self, board: &Board, square: Square) -> ChessResult<MoveSet> {
        let piece = board.piece_required(square)?;

        // Simulations run on a private copy so callers never observe a
        // half-applied move.
        let mut scratch = board.clone();
        let mut moves: MoveSet = self
            .pseudo_moves_of(board, square, piece)
            .into_iter()
            .filter(|&to| self.keeps_king_safe(&mut scratch, square, to, piece.color))
            .collect();

        if piece.kind == PieceKind::King && square == piece.color.king_home() {
            moves.extend(self.castling_moves(board, piece.color));
        }

        trace!(%square, %piece, count = moves.len(), "computed legal moves");
        Ok(moves)
    }

    /// King destinations for castling (g- and c-file on the back line).
    ///
    /// A wing is offered only when neither the king nor that rook has moved,
    /// both stand at home, the squares between them are empty, and no square
    /// the king stands on or crosses is attacked.
    pub fn castling_moves(&self, board: &Board, color: Color) -> MoveSet {
        let line = color.back_line();
        WINGS
            .iter()
            .filter(|wing| board.castling_intact(color, Square::at(wing.rook, line)))
            .filter(|wing| {
                !wing
                    .between
                    .iter()
                    .any(|&column| board.is_occupied(Square::at(column, line)))
            })
            .filter(|wing| {
                !wing
                    .king_path
                    .iter()
                    .any(|&column| self.is_attacked(board, Square::at(column, line), color))
            })
            .map(|wing| Square::at(wing.king_to, line))
            .collect()
    }

    /// Whether the king on `king_square` is attacked by the other side.
    pub fn is_in_check(&self, board: &Board, king_square: Square) -> ChessResult<bool> {
        let king = board.piece_required(king_square)?;
        Ok(self.is_attacked(board, king_square, king.color))
    }

    /// In check with no legal king move, castling included.
    ///
    /// Only the king's own escapes are considered; blocks and captures by
    /// other pieces are not. `Game::status` reports whole-side mobility.
    pub fn is_checkmate(&self, board: &Board, king_square: Square) -> ChessResult<bool> {
        if !self.is_in_check(board, king_square)? {
            return Ok(false);
        }
        Ok(self.legal_moves(board, king_square)?.is_empty())
    }

    pub fn is_stalemate(&self, board: &Board, player: Color) -> bool {
        if let Some(king) = board.king_square(player) {
            if self.is_attacked(board, king, player) {
                return false;
            }
            if matches!(self.legal_moves(board, king), Ok(moves) if !moves.is_empty()) {
                return false;
            }
        }
        !self.can_player_move_any_piece_except_king(board, player)
    }

    pub fn can_player_move_any_piece_except_king(&self, board: &Board, player: Color) -> bool {
        board
            .pieces(player)
            .filter(|(_, piece)| piece.kind != PieceKind::King)
            .any(|(square, _)| matches!(self.legal_moves(board, square), Ok(moves) if !moves.is_empty()))
    }

    pub fn has_any_legal_move(&self, board: &Board, player: Color) -> bool {
        board
            .pieces(player)
            .any(|(square, _)| matches!(self.legal_moves(board, square), Ok(moves) if !moves.is_empty()))
    }

    /// Every legal (from, to) pair for `player`.
    pub fn all_legal_moves(&self, board: &Board, player: Color) -> Vec<(Square, Square)> {
        board
            .pieces(player)
            .flat_map(|(from, _)| {
                self.legal_moves(board, from)
                    .unwrap_or_default()
                    .into_iter()
                    .map(move |to| (from, to))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn set(names: &[&str]) -> MoveSet {
        names.iter().map(|name| sq(name)).collect()
    }

    fn moves(fen: &str, square: &str) -> MoveSet {
        let board = Board::from_fen(fen).unwrap();
        MoveGenerator::new().legal_moves(&board, sq(square)).unwrap()
    }

    #[test]
    fn test_squares_ahead_stops_at_blockers() {
        let board = Board::from_fen("8/8/8/3p4/8/8/3P4/3R4").unwrap();
        let generator = MoveGenerator::new();
        // Own pawn on d2 blocks immediately.
        assert!(generator
            .squares_ahead(&board, sq("d1"), Color::Light, 0, 1, usize::MAX)
            .is_empty());
        let right = generator.squares_ahead(&board, sq("d1"), Color::Light, 1, 0, usize::MAX);
        assert_eq!(right, vec![sq("e1"), sq("f1"), sq("g1"), sq("h1")]);
        // Opposing pawn on d5 is included and ends the walk.
        let up = generator.squares_ahead(&board, sq("d2"), Color::Light, 0, 1, usize::MAX);
        assert_eq!(up, vec![sq("d3"), sq("d4"), sq("d5")]);
        let one = generator.squares_ahead(&board, sq("d2"), Color::Light, 0, 1, 1);
        assert_eq!(one, vec![sq("d3")]);
    }

    #[test]
    fn test_pawn_moves_from_start() {
        let start = Board::new().placement();
        assert_eq!(moves(&start, "a2"), set(&["a3", "a4"]));
        assert_eq!(moves(&start, "e7"), set(&["e6", "e5"]));
    }

    #[test]
    fn test_pawn_off_start_rank_single_push() {
        assert_eq!(moves("4k3/8/8/8/8/7P/8/4K3", "h3"), set(&["h4"]));
        assert_eq!(moves("4k3/8/3p4/8/8/8/8/4K3", "d6"), set(&["d5"]));
    }

    #[test]
    fn test_pawn_blocked_two_ahead() {
        assert_eq!(moves("4k3/8/8/8/4n3/8/4P3/4K3", "e2"), set(&["e3"]));
        assert_eq!(moves("4k3/8/8/8/4N3/8/4P3/4K3", "e2"), set(&["e3"]));
    }

    #[test]
    fn test_stuck_pawn_keeps_captures() {
        // Directly blocked: no pushes at all.
        assert!(moves("4k3/8/8/8/8/4n3/4P3/4K3", "e2").is_empty());
        // Blocked but a capture is available.
        assert_eq!(moves("4k3/8/8/8/8/3bn3/4P3/4K3", "e2"), set(&["d3"]));
        // Own piece on the diagonal is not a capture.
        assert!(moves("4k3/8/8/8/8/3Bn3/4P3/4K3", "e2").is_empty());
    }

    #[test]
    fn test_pawn_captures_both_sides() {
        assert_eq!(
            moves("4k3/8/8/3p1p2/4P3/8/8/4K3", "e4"),
            set(&["d5", "e5", "f5"])
        );
        assert_eq!(
            moves("4k3/8/8/3p4/2P1P3/8/8/4K3", "d5"),
            set(&["c4", "d4", "e4"])
        );
    }

    #[test]
    fn test_pawn_on_last_rank_has_no_push() {
        assert!(moves("P3k3/8/8/8/8/8/8/4K3", "a8").is_empty());
    }

    #[test]
    fn test_knight_moves() {
        let start = Board::new().placement();
        assert_eq!(moves(&start, "b1"), set(&["a3", "c3"]));
        assert_eq!(moves("4k3/8/8/3N4/8/8/8/4K3", "d5").len(), 8);
        assert_eq!(moves("4k3/8/8/8/8/8/8/N3K3", "a1"), set(&["b3", "c2"]));
    }

    #[test]
    fn test_sliders_on_empty_board() {
        let generator = MoveGenerator::new();
        for square in Square::all() {
            let mut board = Board::empty();
            board.place(square, Piece::new(PieceKind::Rook, Color::Light));
            assert_eq!(generator.legal_moves(&board, square).unwrap().len(), 14);
        }

        assert_eq!(moves("8/8/8/8/3B4/8/8/8", "d4").len(), 13);
        assert_eq!(moves("8/8/8/8/8/8/8/B7", "a1").len(), 7);
        assert_eq!(moves("8/8/8/8/3Q4/8/8/8", "d4").len(), 27);
        assert_eq!(moves("8/8/8/8/8/8/8/Q7", "a1").len(), 21);
    }

    #[test]
    fn test_sliders_blocked_and_capturing() {
        let start = Board::new().placement();
        assert!(moves(&start, "a1").is_empty());
        assert!(moves(&start, "c1").is_empty());
        assert!(moves(&start, "d1").is_empty());
        assert_eq!(
            moves("4k3/8/8/3p4/8/8/8/3R3K", "d1"),
            set(&["a1", "b1", "c1", "e1", "f1", "g1", "d2", "d3", "d4", "d5"])
        );
    }

    #[test]
    fn test_king_moves_avoid_attacked_squares() {
        // The rook on a2 covers the whole second rank.
        assert_eq!(
            moves("4k3/8/8/8/8/8/r7/4K3", "e1"),
            set(&["d1", "f1"])
        );
    }

    #[test]
    fn test_king_cannot_capture_defended_piece() {
        // Rook b7 is defended by the queen on c6.
        assert!(moves("K7/1r6/2q5/8/8/8/8/8", "a8").is_empty());
        // Undefended, the capture is fine.
        assert_eq!(moves("K7/1r6/8/8/8/8/8/8", "a8"), set(&["b7"]));
    }

    #[test]
    fn test_king_cannot_retreat_along_ray() {
        // Rook on a1 checks along the rank; f1 stays on the ray once e1 is vacated.
        let legal = moves("4k3/8/8/8/8/8/8/r3K3", "e1");
        assert!(!legal.contains(&sq("f1")));
        assert!(!legal.contains(&sq("d1")));
        assert_eq!(legal, set(&["d2", "e2", "f2"]));
    }

    #[test]
    fn test_king_respects_pawn_attacks() {
        // Dark pawn on e3 attacks d2 and f2 even though they are empty.
        assert_eq!(
            moves("4k3/8/8/8/8/4p3/8/4K3", "e1"),
            set(&["d1", "e2", "f1"])
        );
    }

    #[test]
    fn test_pinned_piece_cannot_leave_line() {
        assert!(moves("4k3/4r3/8/8/8/8/4B3/4K3", "e2").is_empty());
        assert_eq!(
            moves("4k3/4r3/8/8/8/8/4R3/4K3", "e2"),
            set(&["e3", "e4", "e5", "e6", "e7"])
        );
    }

    #[test]
    fn test_attackers_lists_every_attacker() {
        let board = Board::from_fen("4k3/8/8/8/1b6/8/8/r3K2N").unwrap();
        let generator = MoveGenerator::new();
        let attackers = generator.attackers(&board, sq("e1"), Color::Light);
        assert_eq!(attackers, vec![sq("b4"), sq("a1")]);
        assert!(generator.is_attacked(&board, sq("e1"), Color::Light));
        assert!(!generator.is_attacked(&board, sq("h8"), Color::Light));
    }

    #[test]
    fn test_is_in_check() {
        let generator = MoveGenerator::new();
        let board = Board::from_fen("4k3/8/8/8/1b6/8/8/4K3").unwrap();
        assert!(generator.is_in_check(&board, sq("e1")).unwrap());
        assert!(!generator.is_in_check(&board, sq("e8")).unwrap());
        assert!(!generator.is_in_check(&Board::new(), sq("e1")).unwrap());
        assert!(generator.is_in_check(&board, sq("e4")).is_err());
    }

    #[test]
    fn test_checkmate_with_bishop_on_b4() {
        let generator = MoveGenerator::new();
        let board = Board::from_fen("rnbqk1nr/pppp1ppp/8/8/1b6/3P4/PPP1PPPP/RNBQKBNR w KQkq - 1 2")
            .unwrap();
        assert!(generator.is_in_check(&board, sq("e1")).unwrap());
        assert!(generator.is_checkmate(&board, sq("e1")).unwrap());

        // With e2 vacated the king has an escape square.
        let escape = Board::from_fen("rnbqk1nr/pppp1ppp/8/8/1b6/3P4/PPP2PPP/RNBQKBNR").unwrap();
        assert!(!generator.is_checkmate(&escape, sq("e1")).unwrap());
    }

    #[test]
    fn test_fools_mate() {
        let generator = MoveGenerator::new();
        let board = Board::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR").unwrap();
        assert!(generator.is_checkmate(&board, sq("e1")).unwrap());
        assert!(!generator.has_any_legal_move(&board, Color::Light));
    }

    #[test]
    fn test_not_checkmate_without_check() {
        let generator = MoveGenerator::new();
        assert!(!generator.is_checkmate(&Board::new(), sq("e1")).unwrap());
    }

    #[test]
    fn test_stalemate() {
        let generator = MoveGenerator::new();
        let board = Board::from_fen("K7/1r6/2q5/8/8/8/8/8").unwrap();
        assert!(generator.is_stalemate(&board, Color::Light));

        let with_pawn = Board::from_fen("K7/1r6/2q5/8/8/8/P7/8").unwrap();
        assert!(generator.can_player_move_any_piece_except_king(&with_pawn, Color::Light));
        assert!(!generator.is_stalemate(&with_pawn, Color::Light));
    }

    #[test]
    fn test_no_stalemate_when_in_check() {
        let generator = MoveGenerator::new();
        let board = Board::from_fen("K7/8/8/8/8/8/8/q7").unwrap();
        assert!(!generator.is_stalemate(&board, Color::Light));
        assert!(!generator.is_stalemate(&Board::new(), Color::Light));
    }

    #[test]
    fn test_short_castle_available() {
        let generator = MoveGenerator::new();
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K2R").unwrap();
        assert_eq!(generator.castling_moves(&board, Color::Light), set(&["g1"]));
        assert_eq!(
            generator.legal_moves(&board, sq("e1")).unwrap(),
            set(&["d1", "d2", "e2", "f1", "f2", "g1"])
        );
    }

    #[test]
    fn test_short_castle_rejected() {
        let generator = MoveGenerator::new();
        let blocked = Board::from_fen("4k3/8/8/8/8/8/8/4K1NR").unwrap();
        assert!(generator.castling_moves(&blocked, Color::Light).is_empty());

        let f1_attacked = Board::from_fen("4kr2/8/8/8/8/8/8/4K2R").unwrap();
        assert!(generator.castling_moves(&f1_attacked, Color::Light).is_empty());

        let g1_attacked = Board::from_fen("4k1r1/8/8/8/8/8/8/4K2R").unwrap();
        assert!(generator.castling_moves(&g1_attacked, Color::Light).is_empty());

        let mut king_moved = Board::from_fen("4k3/8/8/8/8/8/8/4K2R").unwrap();
        king_moved.move_piece(sq("e1"), sq("e2"));
        king_moved.move_piece(sq("e2"), sq("e1"));
        assert!(generator.castling_moves(&king_moved, Color::Light).is_empty());

        let mut rook_moved = Board::from_fen("4k3/8/8/8/8/8/8/4K2R").unwrap();
        rook_moved.move_piece(sq("h1"), sq("h2"));
        rook_moved.move_piece(sq("h2"), sq("h1"));
        assert!(generator.castling_moves(&rook_moved, Color::Light).is_empty());
    }

    #[test]
    fn test_castling_while_in_check_rejected() {
        let generator = MoveGenerator::new();
        let board = Board::from_fen("4r1k1/8/8/8/8/8/8/4K2R").unwrap();
        assert!(generator.castling_moves(&board, Color::Light).is_empty());
    }

    #[test]
    fn test_long_castle_both_sides() {
        let generator = MoveGenerator::new();
        let board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R").unwrap();
        assert_eq!(
            generator.castling_moves(&board, Color::Light),
            set(&["c1", "g1"])
        );
        assert_eq!(
            generator.castling_moves(&board, Color::Dark),
            set(&["c8", "g8"])
        );

        // b1 only has to be empty, not safe.
        let b1_attacked = Board::from_fen("1r2k3/8/8/8/8/8/8/R3K3").unwrap();
        assert_eq!(
            generator.castling_moves(&b1_attacked, Color::Light),
            set(&["c1"])
        );

        let d8_attacked = Board::from_fen("r3k3/8/8/8/8/8/8/3RK3").unwrap();
        assert!(generator.castling_moves(&d8_attacked, Color::Dark).is_empty());
    }

    #[test]
    fn test_legal_moves_on_empty_square() {
        let generator = MoveGenerator::new();
        assert!(generator.legal_moves(&Board::new(), sq("e4")).is_err());
        assert!(generator.pseudo_legal_moves(&Board::new(), sq("e4")).is_err());
    }

    #[test]
    fn test_legal_moves_leave_board_untouched() {
        let generator = MoveGenerator::new();
        let board = Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R").unwrap();
        let before = board.clone();
        for (square, _) in board.pieces(Color::Light) {
            generator.legal_moves(&board, square).unwrap();
        }
        assert_eq!(board, before);
    }

    #[test]
    fn test_all_legal_moves_from_start() {
        let generator = MoveGenerator::new();
        assert_eq!(generator.all_legal_moves(&Board::new(), Color::Light).len(), 20);
        assert_eq!(generator.all_legal_moves(&Board::new(), Color::Dark).len(), 20);
    }
}
