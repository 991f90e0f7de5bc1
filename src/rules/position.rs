//! `chess` crate backed oracle.
//!
//! `chess::Board` supplies move generation, check status and FEN parsing.
//! On top of it this tracks what the board type leaves out:
//! - halfmove clock and fullmove number
//! - position hashes since the last irreversible move (repetition)
//! - SAN annotation of every generated move

use std::str::FromStr;

use super::san::{captured_piece, to_san};
use super::{CandidateMove, MoveRequest, Oracle};
use crate::error::OracleError;
use crate::types::{
    piece_code, Board, BoardStatus, ChessMove, ColoredPiece, Color, File, MoveGen, Piece, Rank,
    Square, EMPTY,
};

/// Standard starting position
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Halfmove clock value at which the fifty-move rule applies
const FIFTY_MOVE_PLIES: u32 = 100;

/// A chess position with the counters needed for draw detection.
#[derive(Debug, Clone)]
pub struct Position {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
    /// Hashes since the last pawn move or capture, current position last
    repetitions: Vec<u64>,
}

impl Default for Position {
    fn default() -> Self {
        Self::from_board(Board::default(), 0, 1)
    }
}

impl Position {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_board(board: Board, halfmove_clock: u32, fullmove_number: u32) -> Self {
        Self {
            repetitions: vec![board.get_hash()],
            board,
            halfmove_clock,
            fullmove_number,
        }
    }

    /// Parse a FEN string. Only the placement field is mandatory; missing
    /// fields default to `w - - 0 1`.
    pub fn from_fen(fen: &str) -> Result<Self, OracleError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let Some(placement) = fields.first() else {
            return Err(OracleError::InvalidFen(fen.to_string()));
        };

        let side = fields.get(1).copied().unwrap_or("w");
        let castling = fields.get(2).copied().unwrap_or("-");
        let en_passant = fields.get(3).copied().unwrap_or("-");
        let core = format!("{} {} {} {} 0 1", placement, side, castling, en_passant);

        let board =
            Board::from_str(&core).map_err(|_| OracleError::InvalidFen(fen.to_string()))?;

        let halfmove_clock = fields.get(4).and_then(|s| s.parse().ok()).unwrap_or(0);
        let fullmove_number = fields
            .get(5)
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(1)
            .max(1);

        Ok(Self::from_board(board, halfmove_clock, fullmove_number))
    }

    /// The underlying board
    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    fn candidate(&self, m: ChessMove) -> Option<CandidateMove> {
        let piece = self.board.piece_on(m.get_source())?;
        Some(CandidateMove {
            from: m.get_source(),
            to: m.get_dest(),
            promotion: m.get_promotion(),
            captured: captured_piece(&self.board, m),
            piece,
            color: self.board.side_to_move(),
            san: to_san(&self.board, m),
        })
    }

    fn find_legal(&self, request: MoveRequest) -> Option<ChessMove> {
        let wanted = ChessMove::new(request.from, request.to, request.promotion);
        MoveGen::new_legal(&self.board).find(|m| *m == wanted)
    }

    fn play(&mut self, m: ChessMove) {
        let mover = self.board.side_to_move();
        let irreversible = self.board.piece_on(m.get_source()) == Some(Piece::Pawn)
            || captured_piece(&self.board, m).is_some();

        self.board = self.board.make_move_new(m);

        if irreversible {
            self.halfmove_clock = 0;
            self.repetitions.clear();
        } else {
            self.halfmove_clock += 1;
        }
        if mover == Color::Black {
            self.fullmove_number += 1;
        }
        self.repetitions.push(self.board.get_hash());
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= FIFTY_MOVE_PLIES
    }

    pub fn is_threefold_repetition(&self) -> bool {
        let current = self.board.get_hash();
        self.repetitions.iter().filter(|h| **h == current).count() >= 3
    }

    /// Bare kings, a single minor piece, or bishops all on one square colour.
    pub fn is_insufficient_material(&self) -> bool {
        let board = &self.board;
        let heavy = *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
        if heavy != EMPTY {
            return false;
        }

        let knights = board.pieces(Piece::Knight).popcnt();
        let bishops = *board.pieces(Piece::Bishop);
        if knights + bishops.popcnt() <= 1 {
            return true;
        }
        if knights > 0 {
            return false;
        }

        let mut shades = bishops.map(|sq| (sq.get_rank().to_index() + sq.get_file().to_index()) % 2);
        let first = shades.next();
        shades.all(|shade| Some(shade) == first)
    }

    fn placement_fen(&self) -> String {
        let mut out = String::with_capacity(64);
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                let sq = Square::make_square(Rank::from_index(rank), File::from_index(file));
                match self.piece_at(sq) {
                    Some(p) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        let code = piece_code(p.kind);
                        out.push(if p.color == Color::White {
                            code.to_ascii_uppercase()
                        } else {
                            code
                        });
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if rank > 0 {
                out.push('/');
            }
        }
        out
    }

    fn castling_fen(&self) -> String {
        let mut out = String::new();
        for color in [Color::White, Color::Black] {
            let rights = self.board.castle_rights(color);
            let mut push = |c: char| {
                out.push(if color == Color::White { c.to_ascii_uppercase() } else { c });
            };
            if rights.has_kingside() {
                push('k');
            }
            if rights.has_queenside() {
                push('q');
            }
        }
        if out.is_empty() {
            out.push('-');
        }
        out
    }

    fn en_passant_fen(&self) -> String {
        // The board records the capturable pawn; FEN wants the square behind it.
        self.board
            .en_passant()
            .and_then(|pawn| pawn.forward(self.board.side_to_move()))
            .map(|sq| sq.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

impl Oracle for Position {
    #[inline]
    fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    fn legal_moves(&self) -> Vec<CandidateMove> {
        MoveGen::new_legal(&self.board)
            .filter_map(|m| self.candidate(m))
            .collect()
    }

    fn legal_targets(&self) -> Vec<Square> {
        MoveGen::new_legal(&self.board).map(|m| m.get_dest()).collect()
    }

    fn apply(&mut self, request: MoveRequest) -> Result<CandidateMove, OracleError> {
        let illegal = OracleError::IllegalMove {
            from: request.from,
            to: request.to,
            promotion: request.promotion,
        };
        let m = self.find_legal(request).ok_or_else(|| illegal.clone())?;
        let record = self.candidate(m).ok_or(illegal)?;
        self.play(m);
        Ok(record)
    }

    fn piece_at(&self, square: Square) -> Option<ColoredPiece> {
        let kind = self.board.piece_on(square)?;
        let color = self.board.color_on(square)?;
        Some(ColoredPiece::new(kind, color))
    }

    #[inline]
    fn is_check(&self) -> bool {
        *self.board.checkers() != EMPTY
    }

    #[inline]
    fn is_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }

    #[inline]
    fn is_stalemate(&self) -> bool {
        self.board.status() == BoardStatus::Stalemate
    }

    fn is_draw(&self) -> bool {
        self.is_stalemate()
            || self.is_fifty_move_draw()
            || self.is_insufficient_material()
            || self.is_threefold_repetition()
    }

    #[inline]
    fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    fn to_fen(&self) -> String {
        let side = match self.board.side_to_move() {
            Color::White => "w",
            Color::Black => "b",
        };
        format!(
            "{} {} {} {} {} {}",
            self.placement_fen(),
            side,
            self.castling_fen(),
            self.en_passant_fen(),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    fn load_fen(&mut self, fen: &str) -> Result<(), OracleError> {
        *self = Self::from_fen(fen)?;
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play_all(position: &mut Position, moves: &[(Square, Square)]) {
        for &(from, to) in moves {
            position.apply(MoveRequest::new(from, to)).expect("legal move");
        }
    }

    #[test]
    fn test_start_position_fen() {
        let position = Position::default();
        assert_eq!(position.to_fen(), START_FEN);
        assert_eq!(position.legal_moves().len(), 20);
        assert_eq!(position.side_to_move(), Color::White);
    }

    #[test]
    fn test_placement_only_fen_is_accepted() {
        let position = Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR").unwrap();
        assert_eq!(position.side_to_move(), Color::White);
        assert_eq!(position.fullmove_number(), 1);
        assert_eq!(position.legal_moves().len(), 20);
    }

    #[test]
    fn test_invalid_fen_is_rejected() {
        assert!(matches!(Position::from_fen(""), Err(OracleError::InvalidFen(_))));
        assert!(matches!(
            Position::from_fen("not a position"),
            Err(OracleError::InvalidFen(_))
        ));
    }

    #[test]
    fn test_apply_records_move_and_counters() {
        let mut position = Position::default();
        let record = position.apply(MoveRequest::new(Square::E2, Square::E4)).unwrap();
        assert_eq!(record.san, "e4");
        assert_eq!(record.piece, Piece::Pawn);
        assert_eq!(record.color, Color::White);
        assert_eq!(record.captured, None);
        assert_eq!(position.side_to_move(), Color::Black);
        assert_eq!(position.fullmove_number(), 1);

        position.apply(MoveRequest::new(Square::G8, Square::F6)).unwrap();
        assert_eq!(position.fullmove_number(), 2);
        assert_eq!(position.halfmove_clock(), 1);
    }

    #[test]
    fn test_illegal_move_leaves_position_untouched() {
        let mut position = Position::default();
        let before = position.to_fen();
        let err = position.apply(MoveRequest::new(Square::E2, Square::E5)).unwrap_err();
        assert!(matches!(err, OracleError::IllegalMove { .. }));
        assert_eq!(position.to_fen(), before);
    }

    #[test]
    fn test_clone_is_independent() {
        let position = Position::default();
        let mut copy = position.clone();
        copy.apply(MoveRequest::new(Square::D2, Square::D4)).unwrap();
        assert_eq!(position.side_to_move(), Color::White);
        assert_eq!(copy.side_to_move(), Color::Black);
    }

    #[test]
    fn test_moves_from_square() {
        let position = Position::default();
        let targets: Vec<Square> = position
            .legal_moves_from(Square::E2)
            .iter()
            .map(|m| m.to)
            .collect();
        assert_eq!(targets.len(), 2);
        assert!(targets.contains(&Square::E3));
        assert!(targets.contains(&Square::E4));
        assert!(position.legal_moves_from(Square::E4).is_empty());
    }

    #[test]
    fn test_terminal_predicates() {
        let mated = Position::from_fen("k7/1Q6/1K6/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(mated.is_checkmate());
        assert!(mated.is_check());
        assert!(mated.is_game_over());

        let stalemate = Position::from_fen("k7/8/1Q6/8/8/8/8/7K b - - 0 1").unwrap();
        assert!(stalemate.is_stalemate());
        assert!(stalemate.is_draw());
        assert!(!stalemate.is_checkmate());
    }

    #[test]
    fn test_insufficient_material() {
        let bare = Position::from_fen("8/8/8/4k3/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(bare.is_insufficient_material());

        let knight = Position::from_fen("8/8/8/4k3/8/8/8/4KN2 w - - 0 1").unwrap();
        assert!(knight.is_insufficient_material());

        let rook = Position::from_fen("8/8/8/4k3/8/8/8/R3K3 w - - 0 1").unwrap();
        assert!(!rook.is_insufficient_material());
        assert!(!rook.is_draw());
    }

    #[test]
    fn test_fifty_move_rule_from_fen() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 100 80").unwrap();
        assert!(position.is_fifty_move_draw());
        assert!(position.is_draw());
        assert!(position.to_fen().ends_with(" 100 80"));
    }

    #[test]
    fn test_threefold_repetition() {
        let mut position = Position::default();
        let shuffle = [
            (Square::G1, Square::F3),
            (Square::G8, Square::F6),
            (Square::F3, Square::G1),
            (Square::F6, Square::G8),
        ];
        play_all(&mut position, &shuffle);
        assert!(!position.is_threefold_repetition());
        play_all(&mut position, &shuffle);
        assert!(position.is_threefold_repetition());
        assert!(position.is_draw());
    }

    #[test]
    fn test_fen_round_trip_after_moves() {
        let mut position = Position::default();
        play_all(&mut position, &[(Square::E2, Square::E4), (Square::C7, Square::C5)]);
        let fen = position.to_fen();
        let reloaded = Position::from_fen(&fen).unwrap();
        assert_eq!(reloaded.to_fen(), fen);
        assert_eq!(reloaded.fullmove_number(), 2);
    }
}
