//! Score type for position evaluation.
//!
//! Scores are signed reals from white's perspective: positive favors white,
//! negative favors black. Material dominates the magnitude, forced mate is
//! pinned at `±SCORE_MATE`, and proven draws score exactly `SCORE_DRAW`.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{AddAssign, Mul};

use chess::Color;

/// Terminal score for a checkmated side
pub const SCORE_MATE: f64 = 100_000.0;
pub const SCORE_DRAW: f64 = 0.0;

/// A position score (white's perspective).
#[derive(Clone, Copy, PartialEq, Default)]
#[repr(transparent)]
pub struct Score(pub f64);

impl Score {
    #[inline]
    pub const fn new(value: f64) -> Self {
        Score(value)
    }

    /// Score of a position where `loser` has been checkmated.
    #[inline]
    pub fn mated(loser: Color) -> Self {
        match loser {
            Color::White => Score(-SCORE_MATE),
            Color::Black => Score(SCORE_MATE),
        }
    }

    #[inline]
    pub const fn draw() -> Self {
        Score(SCORE_DRAW)
    }

    #[inline]
    pub const fn raw(self) -> f64 {
        self.0
    }

    /// Is this a forced-mate terminal score?
    #[inline]
    pub fn is_mate(self) -> bool {
        self.0.abs() >= SCORE_MATE
    }

    /// Is `self` preferable to `other` for `side`? Strict, so ties keep the
    /// incumbent.
    #[inline]
    pub fn better_for(self, other: Score, side: Color) -> bool {
        match side {
            Color::White => self.0 > other.0,
            Color::Black => self.0 < other.0,
        }
    }
}

impl PartialOrd for Score {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl AddAssign<f64> for Score {
    #[inline]
    fn add_assign(&mut self, rhs: f64) {
        self.0 += rhs;
    }
}

impl Mul<f64> for Score {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Score(self.0 * rhs)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_mate() {
            let winner = if self.0 > 0.0 { "white" } else { "black" };
            write!(f, "mate ({} wins)", winner)
        } else {
            write!(f, "{:+.1}", self.0)
        }
    }
}

impl fmt::Debug for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Score({})", self.0)
    }
}
