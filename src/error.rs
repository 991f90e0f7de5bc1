//! Error types.
//!
//! Every error here is local and recoverable: callers get a typed outcome,
//! and the session state is left as it was before the failed operation.

use chess::{Piece, Square};
use thiserror::Error;

/// Errors reported by the move-legality oracle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The requested move is not legal in the current position
    #[error("illegal move {from}{to}{}", promotion_suffix(.promotion))]
    IllegalMove {
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    },

    /// A position encoding could not be parsed
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
}

fn promotion_suffix(promotion: &Option<Piece>) -> String {
    promotion
        .map(|p| crate::types::piece_code(p).to_string())
        .unwrap_or_default()
}

/// Errors surfaced by the game session's event API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The operation is not valid in the session's current phase
    #[error("cannot {operation} while {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: &'static str,
    },

    /// The computer is to move; human input is ignored until it replies
    #[error("the computer is thinking")]
    OpponentToMove,

    /// Pawns may only promote to a queen, rook, bishop or knight
    #[error("cannot promote to a {0:?}")]
    InvalidPromotion(Piece),

    /// The oracle rejected a move (usually stale selection state)
    #[error(transparent)]
    IllegalMove(#[from] OracleError),
}

/// Errors from snapshot stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;
