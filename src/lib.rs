//! Greedy Chess: a human-versus-computer chess session.
//!
//! The human plays white against a one-ply greedy opponent. Each candidate
//! reply is scored by a static evaluation of the resulting position, with
//! a bonus for captures, and the best one is played after a short
//! thinking delay.
//!
//! - [`rules`]: legality oracle on top of the `chess` crate
//! - [`eval`]: static evaluation and piece-square tables
//! - [`search`]: the greedy move selector
//! - [`session`]: game state machine, clocks, scheduling and persistence
//! - [`cli`]: line-oriented text front end

pub mod cli;
pub mod commentary;
pub mod config;
pub mod error;
pub mod eval;
pub mod rules;
pub mod search;
pub mod session;
pub mod types;

pub use commentary::{Commentator, RandomCommentator};
pub use config::{SessionSettings, Settings};
pub use error::{ConfigError, OracleError, SessionError, StoreError};
pub use eval::evaluate;
pub use rules::{CandidateMove, MoveRequest, Oracle, Position};
pub use search::MoveSelector;
pub use session::{GameSession, Phase, SessionEvent};
pub use types::Score;
