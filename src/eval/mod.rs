//! Board evaluation.
//!
//! A static, white-positive score made of:
//! - material (fixed piece values)
//! - positional table bonus, scaled by [`POSITIONAL_WEIGHT`]
//! - a penalty for pieces standing on a square the side to move can reach
//! - mobility of the side to move
//!
//! Terminal positions short-circuit: checkmate is `±SCORE_MATE`, any draw is 0.

pub mod tables;

pub use tables::positional_weight;

use crate::rules::Oracle;
use crate::types::{piece_value, BitBoard, Color, ColoredPiece, Piece, Score, Square, EMPTY};

/// Scale applied to position table entries
pub const POSITIONAL_WEIGHT: f64 = 0.1;

/// Fraction of a piece's value lost when the side to move can land on it
pub const ATTACK_WEIGHT: f64 = 0.1;

/// Score per legal move of the side to move
pub const MOBILITY_WEIGHT: f64 = 0.2;

#[inline]
fn sign(color: Color) -> f64 {
    match color {
        Color::White => 1.0,
        Color::Black => -1.0,
    }
}

/// Evaluate a position from white's perspective.
///
/// Only the side to move's destinations are used for the attack term: when
/// white is to move, black pieces on reachable squares lose a tenth of their
/// value, and vice versa. The side that just moved is never penalized.
pub fn evaluate<O: Oracle>(position: &O) -> Score {
    let to_move = position.side_to_move();

    if position.is_checkmate() {
        return Score::mated(to_move);
    }
    if position.is_draw() {
        return Score::draw();
    }

    let pieces = position.pieces();
    let endgame = classify_endgame(&pieces);

    let targets = position.legal_targets();
    let reachable = targets
        .iter()
        .fold(EMPTY, |acc, sq| acc | BitBoard::from_square(*sq));

    let mut score = Score::default();

    for &(square, piece) in &pieces {
        let side = sign(piece.color);
        let value = f64::from(piece_value(piece.kind));
        let weight = f64::from(positional_weight(piece.kind, piece.color, square, endgame));

        score += side * value + side * weight * POSITIONAL_WEIGHT;

        if piece.color != to_move && is_reachable(reachable, square) {
            score += -side * value * ATTACK_WEIGHT;
        }
    }

    score += sign(to_move) * targets.len() as f64 * MOBILITY_WEIGHT;
    score
}

#[inline]
fn is_reachable(reachable: BitBoard, square: Square) -> bool {
    reachable & BitBoard::from_square(square) != EMPTY
}

/// Is the position an endgame for king-table purposes?
///
/// True when neither side has a queen, or when only one side has a queen
/// and at most one other non-king piece (pawns count).
pub fn is_endgame<O: Oracle>(position: &O) -> bool {
    classify_endgame(&position.pieces())
}

fn classify_endgame(pieces: &[(Square, ColoredPiece)]) -> bool {
    let mut queens = [false; 2];
    let mut others = [0u32; 2];

    for (_, piece) in pieces {
        let idx = piece.color.to_index();
        match piece.kind {
            Piece::Queen => queens[idx] = true,
            Piece::King => {}
            _ => others[idx] += 1,
        }
    }

    let white = Color::White.to_index();
    let black = Color::Black.to_index();

    (!queens[white] && !queens[black])
        || (queens[white] && others[white] <= 1 && !queens[black])
        || (queens[black] && others[black] <= 1 && !queens[white])
}
