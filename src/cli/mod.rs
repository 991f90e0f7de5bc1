//! Line-oriented text front end.
//!
//! Reads one command per line, drives a [`GameSession`](crate::session::GameSession)
//! and prints what happened. Type `help` for the command list.

mod handler;
mod parser;

pub use handler::CliHandler;
pub use parser::{parse_command, CliCommand};

use std::str::FromStr;

use crate::rules::{MoveRequest, Oracle};
use crate::session::{PieceStyle, Selection};
use crate::types::{piece_code, piece_from_code, ColoredPiece, Color, File, Piece, Rank, Square};

/// Parse a move string (e.g. "e2e4", "e7e8q") into a request.
/// Legality is left to the session.
pub fn parse_move(move_str: &str) -> Option<MoveRequest> {
    let move_str = move_str.trim().to_ascii_lowercase();
    if move_str.len() < 4 || move_str.len() > 5 || !move_str.is_ascii() {
        return None;
    }

    let from = Square::from_str(&move_str[0..2]).ok()?;
    let to = Square::from_str(&move_str[2..4]).ok()?;
    let request = MoveRequest::new(from, to);

    match move_str.chars().nth(4) {
        None => Some(request),
        Some(c) => match piece_from_code(c)? {
            Piece::Pawn | Piece::King => None,
            piece => Some(request.with_promotion(piece)),
        },
    }
}

/// Format a request in coordinate notation (e.g. "e2e4", "e7e8q")
pub fn format_move(request: MoveRequest) -> String {
    let mut s = format!("{}{}", request.from, request.to);
    if let Some(promo) = request.promotion {
        s.push(piece_code(promo));
    }
    s
}

/// Glyph for a piece in the given style.
fn glyph(piece: ColoredPiece, style: PieceStyle) -> char {
    match style {
        PieceStyle::Alpha => match (piece.color, piece.kind) {
            (Color::White, Piece::King) => '♔',
            (Color::White, Piece::Queen) => '♕',
            (Color::White, Piece::Rook) => '♖',
            (Color::White, Piece::Bishop) => '♗',
            (Color::White, Piece::Knight) => '♘',
            (Color::White, Piece::Pawn) => '♙',
            (Color::Black, Piece::King) => '♚',
            (Color::Black, Piece::Queen) => '♛',
            (Color::Black, Piece::Rook) => '♜',
            (Color::Black, Piece::Bishop) => '♝',
            (Color::Black, Piece::Knight) => '♞',
            (Color::Black, Piece::Pawn) => '♟',
        },
        PieceStyle::Default | PieceStyle::Neo => {
            let c = piece_code(piece.kind);
            match piece.color {
                Color::White => c.to_ascii_uppercase(),
                Color::Black => c,
            }
        }
    }
}

/// Text diagram of the board, white at the bottom. With a selection, the
/// selected square is bracketed, empty targets show `*` and captures `x`.
pub fn render_board<O: Oracle>(position: &O, selection: Option<&Selection>, style: PieceStyle) -> String {
    let mut out = String::new();
    for rank in (0..8).rev() {
        out.push_str(&format!("{} ", rank + 1));
        for file in 0..8 {
            let sq = Square::make_square(Rank::from_index(rank), File::from_index(file));
            let piece = position.piece_at(sq);
            let mark = match (piece, selection) {
                (_, Some(sel)) if sel.captures.contains(&sq) => 'x',
                (None, Some(sel)) if sel.targets.contains(&sq) => '*',
                (Some(p), _) => glyph(p, style),
                (None, _) => '.',
            };
            let selected = selection.is_some_and(|s| s.square == sq);
            if selected {
                out.push('[');
                out.push(mark);
                out.push(']');
            } else {
                out.push(' ');
                out.push(mark);
                out.push(' ');
            }
        }
        out.push('\n');
    }
    out.push_str("   a  b  c  d  e  f  g  h\n");
    out
}
