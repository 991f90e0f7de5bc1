//! Position tables.
//!
//! One 8x8 grid per piece kind, plus a second king grid for the endgame.
//! Grids are written rank 1 first, from white's side of the board: row
//! `r` is the white piece's rank index, and black pieces read the row
//! mirrored vertically (`7 - r`). Columns are files a..h.

use crate::types::{Color, Piece, Square};

type Table = [[i32; 8]; 8];

#[rustfmt::skip]
const PAWN: Table = [
    [ 0,  0,  0,  0,  0,  0,  0,  0],
    [50, 50, 50, 50, 50, 50, 50, 50],
    [10, 10, 20, 30, 30, 20, 10, 10],
    [ 5,  5, 10, 25, 25, 10,  5,  5],
    [ 0,  0,  0, 20, 20,  0,  0,  0],
    [ 5, -5,-10,  0,  0,-10, -5,  5],
    [ 5, 10, 10,-20,-20, 10, 10,  5],
    [ 0,  0,  0,  0,  0,  0,  0,  0],
];

#[rustfmt::skip]
const KNIGHT: Table = [
    [-50,-40,-30,-30,-30,-30,-40,-50],
    [-40,-20,  0,  0,  0,  0,-20,-40],
    [-30,  0, 10, 15, 15, 10,  0,-30],
    [-30,  5, 15, 20, 20, 15,  5,-30],
    [-30,  0, 15, 20, 20, 15,  0,-30],
    [-30,  5, 10, 15, 15, 10,  5,-30],
    [-40,-20,  0,  5,  5,  0,-20,-40],
    [-50,-40,-30,-30,-30,-30,-40,-50],
];

#[rustfmt::skip]
const BISHOP: Table = [
    [-20,-10,-10,-10,-10,-10,-10,-20],
    [-10,  0,  0,  0,  0,  0,  0,-10],
    [-10,  0,  5, 10, 10,  5,  0,-10],
    [-10,  5,  5, 10, 10,  5,  5,-10],
    [-10,  0, 10, 10, 10, 10,  0,-10],
    [-10, 10, 10, 10, 10, 10, 10,-10],
    [-10,  5,  0,  0,  0,  0,  5,-10],
    [-20,-10,-10,-10,-10,-10,-10,-20],
];

#[rustfmt::skip]
const ROOK: Table = [
    [ 0,  0,  0,  0,  0,  0,  0,  0],
    [ 5, 10, 10, 10, 10, 10, 10,  5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [ 0,  0,  0,  5,  5,  0,  0,  0],
];

#[rustfmt::skip]
const QUEEN: Table = [
    [-20,-10,-10, -5, -5,-10,-10,-20],
    [-10,  0,  0,  0,  0,  0,  0,-10],
    [-10,  0,  5,  5,  5,  5,  0,-10],
    [ -5,  0,  5,  5,  5,  5,  0, -5],
    [  0,  0,  5,  5,  5,  5,  0, -5],
    [-10,  5,  5,  5,  5,  5,  0,-10],
    [-10,  0,  5,  0,  0,  0,  0,-10],
    [-20,-10,-10, -5, -5,-10,-10,-20],
];

#[rustfmt::skip]
const KING_MIDDLEGAME: Table = [
    [-30,-40,-40,-50,-50,-40,-40,-30],
    [-30,-40,-40,-50,-50,-40,-40,-30],
    [-30,-40,-40,-50,-50,-40,-40,-30],
    [-30,-40,-40,-50,-50,-40,-40,-30],
    [-20,-30,-30,-40,-40,-30,-30,-20],
    [-10,-20,-20,-20,-20,-20,-20,-10],
    [ 20, 20,  0,  0,  0,  0, 20, 20],
    [ 20, 30, 10,  0,  0, 10, 30, 20],
];

#[rustfmt::skip]
const KING_ENDGAME: Table = [
    [-50,-40,-30,-20,-20,-30,-40,-50],
    [-30,-20,-10,  0,  0,-10,-20,-30],
    [-30,-10, 20, 30, 30, 20,-10,-30],
    [-30,-10, 30, 40, 40, 30,-10,-30],
    [-30,-10, 30, 40, 40, 30,-10,-30],
    [-30,-10, 20, 30, 30, 20,-10,-30],
    [-30,-30,  0,  0,  0,  0,-30,-30],
    [-50,-30,-30,-30,-30,-30,-30,-50],
];

#[inline]
fn table_for(piece: Piece, endgame: bool) -> &'static Table {
    match piece {
        Piece::Pawn => &PAWN,
        Piece::Knight => &KNIGHT,
        Piece::Bishop => &BISHOP,
        Piece::Rook => &ROOK,
        Piece::Queen => &QUEEN,
        Piece::King if endgame => &KING_ENDGAME,
        Piece::King => &KING_MIDDLEGAME,
    }
}

/// Unsigned table entry for `piece` of `color` standing on `square`.
#[inline]
pub fn positional_weight(piece: Piece, color: Color, square: Square, endgame: bool) -> i32 {
    let rank = square.get_rank().to_index();
    let row = match color {
        Color::White => rank,
        Color::Black => 7 - rank,
    };
    table_for(piece, endgame)[row][square.get_file().to_index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pawn_rows_mirror_for_black() {
        assert_eq!(positional_weight(Piece::Pawn, Color::White, Square::E2, false), 50);
        assert_eq!(positional_weight(Piece::Pawn, Color::Black, Square::E7, false), 50);
        assert_eq!(positional_weight(Piece::Pawn, Color::White, Square::D3, false), 30);
        assert_eq!(positional_weight(Piece::Pawn, Color::Black, Square::D6, false), 30);
    }

    #[test]
    fn test_king_table_switches_in_endgame() {
        assert_eq!(positional_weight(Piece::King, Color::White, Square::E4, false), -50);
        assert_eq!(positional_weight(Piece::King, Color::White, Square::E4, true), 40);
        assert_eq!(positional_weight(Piece::King, Color::White, Square::A1, false), -30);
        assert_eq!(positional_weight(Piece::King, Color::White, Square::A1, true), -50);
    }

    #[test]
    fn test_columns_follow_files() {
        assert_eq!(positional_weight(Piece::Queen, Color::White, Square::A5, false), 0);
        assert_eq!(positional_weight(Piece::Queen, Color::White, Square::H5, false), -5);
        assert_eq!(positional_weight(Piece::Rook, Color::White, Square::D8, false), 5);
    }
}
