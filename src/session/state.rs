//! Session phases and game results.

use std::fmt;

use crate::rules::Oracle;
use crate::types::{color_name, Color};

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Created or reset, not yet started
    #[default]
    Idle,
    /// A game is in progress
    Active,
    /// A pawn move to the last rank waits for its promotion piece
    AwaitingPromotion,
    GameOver,
}

impl Phase {
    pub const fn name(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Active => "active",
            Phase::AwaitingPromotion => "awaiting promotion",
            Phase::GameOver => "game over",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result classification from white's (the human's) point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Win,
    Lose,
    Draw,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Win => f.write_str("win"),
            Verdict::Lose => f.write_str("lose"),
            Verdict::Draw => f.write_str("draw"),
        }
    }
}

/// How a finished game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Checkmate { winner: Color },
    Timeout { winner: Color },
    /// Stalemate, repetition, fifty-move rule or insufficient material
    Draw,
}

impl GameOutcome {
    /// Terminal state reported by the oracle, if any.
    pub fn from_position<O: Oracle>(position: &O) -> Option<Self> {
        if position.is_checkmate() {
            Some(GameOutcome::Checkmate {
                winner: !position.side_to_move(),
            })
        } else if position.is_draw() {
            Some(GameOutcome::Draw)
        } else {
            None
        }
    }

    pub fn winner(self) -> Option<Color> {
        match self {
            GameOutcome::Checkmate { winner } | GameOutcome::Timeout { winner } => Some(winner),
            GameOutcome::Draw => None,
        }
    }

    pub fn verdict(self) -> Verdict {
        match self.winner() {
            Some(Color::White) => Verdict::Win,
            Some(Color::Black) => Verdict::Lose,
            None => Verdict::Draw,
        }
    }

    /// Banner shown over the finished board.
    pub fn headline(self) -> &'static str {
        match self.verdict() {
            Verdict::Win => "Congratulations!",
            Verdict::Lose => "Game Over",
            Verdict::Draw => "Game Ended in a Draw!",
        }
    }

    /// One-line status message.
    pub fn message(self) -> String {
        match self {
            GameOutcome::Checkmate { winner } => format!("Checkmate! {} wins!", color_name(winner)),
            GameOutcome::Timeout { winner } => format!("{} wins on time!", color_name(winner)),
            GameOutcome::Draw => "Game Over - Draw!".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Position;

    #[test]
    fn test_outcome_from_position() {
        let mated = Position::from_fen("k7/1Q6/1K6/8/8/8/8/8 b - - 0 1").unwrap();
        let outcome = GameOutcome::from_position(&mated).unwrap();
        assert_eq!(outcome, GameOutcome::Checkmate { winner: Color::White });
        assert_eq!(outcome.verdict(), Verdict::Win);
        assert_eq!(outcome.message(), "Checkmate! White wins!");
        assert_eq!(outcome.headline(), "Congratulations!");

        let stalemate = Position::from_fen("k7/8/1Q6/8/8/8/8/7K b - - 0 1").unwrap();
        assert_eq!(GameOutcome::from_position(&stalemate), Some(GameOutcome::Draw));
        assert!(GameOutcome::from_position(&Position::default()).is_none());
    }

    #[test]
    fn test_timeout_messages() {
        let lost = GameOutcome::Timeout { winner: Color::Black };
        assert_eq!(lost.message(), "Black wins on time!");
        assert_eq!(lost.verdict(), Verdict::Lose);
        assert_eq!(lost.headline(), "Game Over");

        assert_eq!(GameOutcome::Draw.message(), "Game Over - Draw!");
        assert_eq!(GameOutcome::Draw.headline(), "Game Ended in a Draw!");
        assert_eq!(GameOutcome::Draw.winner(), None);
    }
}
