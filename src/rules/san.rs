//! Standard algebraic notation for `chess` crate moves.

use crate::types::{Board, BoardStatus, ChessMove, MoveGen, Piece, Square, EMPTY};

#[inline]
fn file_char(sq: Square) -> char {
    (b'a' + sq.get_file().to_index() as u8) as char
}

#[inline]
fn rank_char(sq: Square) -> char {
    (b'1' + sq.get_rank().to_index() as u8) as char
}

#[inline]
fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

/// Kind of the piece a legal move removes, en passant included.
pub(crate) fn captured_piece(board: &Board, m: ChessMove) -> Option<Piece> {
    if let Some(victim) = board.piece_on(m.get_dest()) {
        return Some(victim);
    }
    let diagonal_pawn_step = board.piece_on(m.get_source()) == Some(Piece::Pawn)
        && m.get_source().get_file() != m.get_dest().get_file();
    diagonal_pawn_step.then_some(Piece::Pawn)
}

#[inline]
fn is_castle(board: &Board, m: ChessMove) -> bool {
    let from = m.get_source().get_file().to_index();
    let to = m.get_dest().get_file().to_index();
    board.piece_on(m.get_source()) == Some(Piece::King) && from.abs_diff(to) == 2
}

/// File, rank or full square of the origin, whichever is the shortest that
/// tells apart same-kind pieces able to reach the same destination.
fn disambiguation(board: &Board, m: ChessMove, piece: Piece) -> String {
    let from = m.get_source();
    let rivals: Vec<Square> = MoveGen::new_legal(board)
        .filter(|other| {
            other.get_dest() == m.get_dest()
                && other.get_source() != from
                && board.piece_on(other.get_source()) == Some(piece)
        })
        .map(|other| other.get_source())
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let shares_file = rivals.iter().any(|sq| sq.get_file() == from.get_file());
    let shares_rank = rivals.iter().any(|sq| sq.get_rank() == from.get_rank());

    if !shares_file {
        file_char(from).to_string()
    } else if !shares_rank {
        rank_char(from).to_string()
    } else {
        from.to_string()
    }
}

/// Format a legal move of `board` in SAN (e.g. "e4", "Nbd2", "exd6",
/// "e8=Q+", "O-O", "Ra8#").
pub fn to_san(board: &Board, m: ChessMove) -> String {
    let Some(piece) = board.piece_on(m.get_source()) else {
        return m.to_string();
    };

    let mut san = String::with_capacity(8);

    if is_castle(board, m) {
        if m.get_dest().get_file().to_index() > m.get_source().get_file().to_index() {
            san.push_str("O-O");
        } else {
            san.push_str("O-O-O");
        }
    } else {
        let capture = captured_piece(board, m).is_some();

        if piece == Piece::Pawn {
            if capture {
                san.push(file_char(m.get_source()));
                san.push('x');
            }
        } else {
            san.push(piece_letter(piece));
            san.push_str(&disambiguation(board, m, piece));
            if capture {
                san.push('x');
            }
        }

        san.push_str(&m.get_dest().to_string());

        if let Some(promo) = m.get_promotion() {
            san.push('=');
            san.push(piece_letter(promo));
        }
    }

    let after = board.make_move_new(m);
    if after.status() == BoardStatus::Checkmate {
        san.push('#');
    } else if *after.checkers() != EMPTY {
        san.push('+');
    }

    san
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn san_of(fen: &str, from: Square, to: Square, promo: Option<Piece>) -> String {
        let board = Board::from_str(fen).expect("valid fen");
        to_san(&board, ChessMove::new(from, to, promo))
    }

    #[test]
    fn test_pawn_push_and_piece_move() {
        let board = Board::default();
        assert_eq!(to_san(&board, ChessMove::new(Square::E2, Square::E4, None)), "e4");
        assert_eq!(to_san(&board, ChessMove::new(Square::G1, Square::F3, None)), "Nf3");
    }

    #[test]
    fn test_pawn_capture_uses_origin_file() {
        let fen = "4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1";
        assert_eq!(san_of(fen, Square::E4, Square::D5, None), "exd5");
    }

    #[test]
    fn test_disambiguation_by_file_then_rank() {
        let knights = "4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1";
        assert_eq!(san_of(knights, Square::B1, Square::D2, None), "Nbd2");

        let rooks = "4k3/8/8/R7/8/8/8/R3K3 w - - 0 1";
        assert_eq!(san_of(rooks, Square::A1, Square::A3, None), "R1a3");
    }

    #[test]
    fn test_castling() {
        let fen = "4k3/8/8/8/8/8/8/4K2R w K - 0 1";
        assert_eq!(san_of(fen, Square::E1, Square::G1, None), "O-O");
    }

    #[test]
    fn test_promotion_suffix() {
        let fen = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1";
        assert_eq!(san_of(fen, Square::E7, Square::E8, Some(Piece::Queen)), "e8=Q");
        assert_eq!(san_of(fen, Square::E7, Square::E8, Some(Piece::Knight)), "e8=N");
    }

    #[test]
    fn test_check_and_mate_suffixes() {
        let check = "4k3/8/8/8/8/8/8/R3K3 w - - 0 1";
        assert_eq!(san_of(check, Square::A1, Square::A8, None), "Ra8+");

        let mate = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1";
        assert_eq!(san_of(mate, Square::A1, Square::A8, None), "Ra8#");
    }

    #[test]
    fn test_en_passant_counts_as_pawn_capture() {
        let board = Board::from_str("4k3/3p4/8/4P3/8/8/8/4K3 b - - 0 1").unwrap();
        let board = board.make_move_new(ChessMove::new(Square::D7, Square::D5, None));
        let ep = ChessMove::new(Square::E5, Square::D6, None);
        assert_eq!(captured_piece(&board, ep), Some(Piece::Pawn));
        assert_eq!(to_san(&board, ep), "exd6");
    }
}
