//! Move-legality oracle.
//!
//! Everything rules-related the rest of the crate needs goes through the
//! [`Oracle`] trait: legal moves annotated for display, move application,
//! terminal-state predicates and position (de)serialization. [`Position`]
//! implements it on top of the `chess` crate.

mod position;
mod san;

pub use position::{Position, START_FEN};
pub use san::to_san;

use crate::error::OracleError;
use crate::types::{last_rank, ColoredPiece, Color, Piece, Square, ALL_SQUARES};

/// A fully specified move request (origin, destination, promotion choice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
}

impl MoveRequest {
    pub const fn new(from: Square, to: Square) -> Self {
        Self { from, to, promotion: None }
    }

    pub const fn with_promotion(mut self, piece: Piece) -> Self {
        self.promotion = Some(piece);
        self
    }
}

/// A legal move as reported by the oracle, annotated for display and scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
    /// Kind of the piece removed from the board (en passant included)
    pub captured: Option<Piece>,
    pub piece: Piece,
    pub color: Color,
    /// Standard algebraic notation, with check/mate suffix
    pub san: String,
}

impl CandidateMove {
    /// The request that reproduces this move.
    pub fn request(&self) -> MoveRequest {
        MoveRequest {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    /// Does this move land a pawn on its last rank?
    #[inline]
    pub fn requires_promotion(&self) -> bool {
        self.piece == Piece::Pawn && self.to.get_rank() == last_rank(self.color)
    }
}

/// Authoritative chess-rules computation.
///
/// Positions are values: cloning one and applying a move to the clone never
/// affects the position it was cloned from.
pub trait Oracle: Clone {
    fn side_to_move(&self) -> Color;

    /// Every legal move, in generation order.
    fn legal_moves(&self) -> Vec<CandidateMove>;

    /// Legal moves starting on `from`.
    fn legal_moves_from(&self, from: Square) -> Vec<CandidateMove> {
        self.legal_moves()
            .into_iter()
            .filter(|m| m.from == from)
            .collect()
    }

    /// Destination of every legal move, one entry per move (so promotions
    /// count once per promotion piece). Implementations may override this
    /// with something cheaper than building full candidates.
    fn legal_targets(&self) -> Vec<Square> {
        self.legal_moves().into_iter().map(|m| m.to).collect()
    }

    /// Apply a move, returning its annotated record.
    fn apply(&mut self, request: MoveRequest) -> Result<CandidateMove, OracleError>;

    fn piece_at(&self, square: Square) -> Option<ColoredPiece>;

    /// Every occupied square, a1 through h8.
    fn pieces(&self) -> Vec<(Square, ColoredPiece)> {
        ALL_SQUARES
            .iter()
            .filter_map(|&sq| self.piece_at(sq).map(|p| (sq, p)))
            .collect()
    }

    fn is_check(&self) -> bool;
    fn is_checkmate(&self) -> bool;
    fn is_stalemate(&self) -> bool;

    /// Any drawn state, stalemate included.
    fn is_draw(&self) -> bool;

    fn is_game_over(&self) -> bool {
        self.is_checkmate() || self.is_draw()
    }

    fn fullmove_number(&self) -> u32;

    fn to_fen(&self) -> String;
    fn load_fen(&mut self, fen: &str) -> Result<(), OracleError>;

    /// Back to the standard starting position.
    fn reset(&mut self);
}
