//! Move commentary.
//!
//! A [`Commentator`] turns a just-played move into one line of text. The
//! session owns it as a replaceable policy, so tests can plug in a fixed one.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::types::{color_name, piece_name, Color, Piece};

/// Facts about a move the commentator may talk about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveContext {
    pub piece: Piece,
    pub color: Color,
    pub captured: Option<Piece>,
    /// Does the move give check?
    pub is_check: bool,
    pub is_checkmate: bool,
    /// Fullmove number after the move
    pub move_number: u32,
    /// Pieces left on the board, kings included
    pub piece_count: usize,
}

/// Describes moves in prose.
pub trait Commentator {
    /// Always returns a non-empty line.
    fn describe(&mut self, ctx: &MoveContext) -> String;
}

/// Up to and including this move number the game counts as the opening
const OPENING_MOVES: u32 = 4;

/// Below this many pieces the game counts as an endgame
const ENDGAME_PIECES: usize = 10;

const CHECKMATE_LINES: &[&str] = &[
    "Checkmate! A brilliant conclusion to the game.",
    "Game over - a masterful checkmate!",
    "The king is trapped! A decisive victory.",
    "A beautiful checkmate to end the game.",
    "The final move - checkmate!",
];

const CHECK_LINES: &[&str] = &[
    "Check! The king is under attack.",
    "A dangerous check - the king must move!",
    "Putting pressure on the king with this check.",
    "The king is threatened! What's the escape plan?",
    "A tactical check that demands attention.",
];

const CAPTURE_LINES: &[&str] = &[
    "What a capture! The balance of power shifts.",
    "A decisive capture that could change the game.",
    "Trading pieces - every capture counts!",
    "A strategic elimination of the opponent's piece.",
    "The battle intensifies with this capture!",
];

const OPENING_LINES: &[&str] = &[
    "A classic opening move! Let's see how this game develops.",
    "Setting up for an interesting position.",
    "A solid start to the game.",
    "Taking control of the center early.",
    "Building a strong foundation.",
];

const ENDGAME_LINES: &[&str] = &[
    "The endgame approaches - every move is crucial.",
    "A tense endgame position is forming.",
    "The final phase of the game begins.",
    "Both sides must play precisely in this endgame.",
    "The endgame will test both players' technique.",
];

const GENERAL_LINES: &[&str] = &[
    "A thoughtful move that improves the position.",
    "Developing pieces and creating opportunities.",
    "Building pressure on the opponent's position.",
    "A strategic move with long-term implications.",
    "Carefully maneuvering for better control.",
];

/// Picks a random line from fixed lists, by priority: checkmate, check,
/// capture, opening, endgame, anything else.
#[derive(Debug, Clone)]
pub struct RandomCommentator {
    rng: SmallRng,
}

impl RandomCommentator {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Reproducible commentary
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn pick(&mut self, lines: &[&'static str]) -> &'static str {
        lines.choose(&mut self.rng).copied().unwrap_or("Play continues.")
    }
}

impl Default for RandomCommentator {
    fn default() -> Self {
        Self::new()
    }
}

impl Commentator for RandomCommentator {
    fn describe(&mut self, ctx: &MoveContext) -> String {
        let side = color_name(ctx.color);
        let piece = piece_name(ctx.piece);

        if ctx.is_checkmate {
            return self.pick(CHECKMATE_LINES).to_string();
        }
        if ctx.is_check {
            return self.pick(CHECK_LINES).to_string();
        }
        if let Some(victim) = ctx.captured {
            let line = self.pick(CAPTURE_LINES);
            return format!("{}'s {} captures the {}! {}", side, piece, piece_name(victim), line);
        }
        if ctx.move_number <= OPENING_MOVES {
            return self.pick(OPENING_LINES).to_string();
        }
        if ctx.piece_count < ENDGAME_PIECES {
            return self.pick(ENDGAME_LINES).to_string();
        }
        format!("{}'s {} moves. {}", side, piece, self.pick(GENERAL_LINES))
    }
}
