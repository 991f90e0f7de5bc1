//! Move selection for the computer opponent.
//!
//! A depth-1 greedy search: every legal move is applied to a copy of the
//! position, the child is scored with [`evaluate`], and captures are
//! amplified by a multiplier. The best score for the side to move wins,
//! and ties keep the earliest move in generation order.
//!
//! # Architecture
//! - `MoveSelector`: stateless controller with per-call statistics
//! - `capture_multiplier`: capture bonus for a (mover, victim) pair
//! - `capturable_squares`: capture targets of the side to move, for display

use std::time::Instant;

use tracing::{debug, trace};

use crate::eval::evaluate;
use crate::rules::{CandidateMove, Oracle};
use crate::types::{piece_value, Piece, Score, Square};

/// Multiplier for any capturing move
pub const CAPTURE_BONUS: f64 = 1.2;

/// Extra factor on top of [`CAPTURE_BONUS`] when the victim outvalues the mover
pub const FAVORABLE_TRADE_BONUS: f64 = 1.5;

/// Statistics collected during one selection
#[derive(Debug, Clone, Default)]
pub struct SelectionStats {
    /// Child positions evaluated
    pub nodes: u64,
    pub time_ms: u64,
}

/// A legal move with its adjusted score
#[derive(Debug, Clone)]
pub struct ScoredMove {
    pub candidate: CandidateMove,
    pub score: Score,
}

/// Result of a selection
#[derive(Debug, Clone, Default)]
pub struct SelectionResult {
    /// `None` only when the side to move has no legal move
    pub best: Option<ScoredMove>,
    pub stats: SelectionStats,
}

/// Score multiplier for a move by `mover` that removes `captured`.
#[inline]
pub fn capture_multiplier(mover: Piece, captured: Option<Piece>) -> f64 {
    match captured {
        Some(victim) if piece_value(victim) > piece_value(mover) => {
            CAPTURE_BONUS * FAVORABLE_TRADE_BONUS
        }
        Some(_) => CAPTURE_BONUS,
        None => 1.0,
    }
}

/// Greedy one-ply move selector.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveSelector;

impl MoveSelector {
    pub fn new() -> Self {
        Self
    }

    /// Score a single legal move: evaluate the child position, then apply
    /// the capture multiplier to the raw signed score. Returns `None` if the
    /// oracle rejects the move.
    pub fn score_move<O: Oracle>(&self, position: &O, candidate: &CandidateMove) -> Option<Score> {
        let mut child = position.clone();
        child.apply(candidate.request()).ok()?;
        Some(evaluate(&child) * capture_multiplier(candidate.piece, candidate.captured))
    }

    /// Pick the best move for the side to move.
    pub fn pick_move<O: Oracle>(&self, position: &O) -> SelectionResult {
        let start = Instant::now();
        let side = position.side_to_move();
        let mut stats = SelectionStats::default();
        let mut best: Option<ScoredMove> = None;

        for candidate in position.legal_moves() {
            let Some(score) = self.score_move(position, &candidate) else {
                continue;
            };
            stats.nodes += 1;
            trace!(mv = %candidate.san, score = score.raw(), "scored");

            let improves = match &best {
                Some(incumbent) => score.better_for(incumbent.score, side),
                None => true,
            };
            if improves {
                best = Some(ScoredMove { candidate, score });
            }
        }

        stats.time_ms = start.elapsed().as_millis() as u64;

        if let Some(chosen) = &best {
            debug!(
                mv = %chosen.candidate.san,
                score = chosen.score.raw(),
                nodes = stats.nodes,
                "move selected"
            );
        }

        SelectionResult { best, stats }
    }
}

/// Distinct destinations of the side to move's capturing moves, first
/// occurrence order.
pub fn capturable_squares<O: Oracle>(position: &O) -> Vec<Square> {
    let mut squares: Vec<Square> = Vec::new();
    for candidate in position.legal_moves() {
        if candidate.is_capture() && !squares.contains(&candidate.to) {
            squares.push(candidate.to);
        }
    }
    squares
}
