//! Core types shared by the rules, evaluation and session layers.
//!
//! # Design Principles
//! - Re-export `chess` crate types as the canonical board/piece/square types
//! - Define engine-specific types (Score, piece values) on top of them

mod score;

pub use score::{Score, SCORE_DRAW, SCORE_MATE};

pub use chess::{
    BitBoard,
    Board,
    BoardStatus,
    ChessMove,
    Color,
    File,
    MoveGen,
    Piece,
    Rank,
    Square,
    ALL_SQUARES,
    EMPTY,
};

/// Centipawn value type (for piece values, etc.)
pub type Value = i32;

// Piece values in centipawns
pub const PAWN_VALUE: Value = 100;
pub const KNIGHT_VALUE: Value = 320;
pub const BISHOP_VALUE: Value = 330;
pub const ROOK_VALUE: Value = 500;
pub const QUEEN_VALUE: Value = 900;
pub const KING_VALUE: Value = 20000;

/// Pieces a pawn may promote to, in the order offered to the player.
pub const PROMOTION_PIECES: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

/// Get the material value of a piece in centipawns
#[inline]
pub const fn piece_value(piece: Piece) -> Value {
    match piece {
        Piece::Pawn => PAWN_VALUE,
        Piece::Knight => KNIGHT_VALUE,
        Piece::Bishop => BISHOP_VALUE,
        Piece::Rook => ROOK_VALUE,
        Piece::Queen => QUEEN_VALUE,
        Piece::King => KING_VALUE,
    }
}

/// A piece together with its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColoredPiece {
    pub kind: Piece,
    pub color: Color,
}

impl ColoredPiece {
    pub const fn new(kind: Piece, color: Color) -> Self {
        Self { kind, color }
    }
}

/// Human readable name of a piece kind ("pawn", "knight", ...).
pub const fn piece_name(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "pawn",
        Piece::Knight => "knight",
        Piece::Bishop => "bishop",
        Piece::Rook => "rook",
        Piece::Queen => "queen",
        Piece::King => "king",
    }
}

/// "White" / "Black"
pub const fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// Lowercase letter used for a piece kind in records and commands.
pub const fn piece_code(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    }
}

/// Inverse of [`piece_code`], case-insensitive.
pub fn piece_from_code(code: char) -> Option<Piece> {
    match code.to_ascii_lowercase() {
        'p' => Some(Piece::Pawn),
        'n' => Some(Piece::Knight),
        'b' => Some(Piece::Bishop),
        'r' => Some(Piece::Rook),
        'q' => Some(Piece::Queen),
        'k' => Some(Piece::King),
        _ => None,
    }
}

/// Rank a pawn of `color` promotes on.
#[inline]
pub fn last_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    }
}
