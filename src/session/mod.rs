//! Game session state machine.
//!
//! A [`GameSession`] owns one game between a human (white) and the computer
//! (black): the position, move history, selection highlights, pending
//! promotion, clocks, tallies and stats.
//!
//! # Flow
//! - `start()` moves `Idle` to `Active`
//! - `select_square()` selects a white piece, then a destination
//! - a pawn reaching the last rank parks the move in `AwaitingPromotion`
//!   until `choose_promotion()`
//! - every applied move runs the same bookkeeping; after a white move the
//!   [`TurnCoordinator`] schedules black's reply
//! - the host calls `poll()` to deliver due replies and clock ticks
//!
//! Deferred work carries the coordinator's epoch, so `reset()` and the end
//! of a game make every pending reply and tick inert.

mod clock;
mod coordinator;
mod persist;
mod scheduler;
mod state;
mod stats;

pub use clock::{format_clock, Clocks, ManualClock, MonotonicClock, TimeSource, TimerMode};
pub use coordinator::{PendingReply, Task, TurnCoordinator};
pub use persist::{
    FileStore, GameStateRecord, MemoryStore, PieceStyle, SessionSnapshot, SnapshotStore,
    FEN_KEY, GAME_STATE_KEY, MOVES_KEY, PLAYER_STATS_KEY, RECORD_KEYS, TIMER_KEY,
};
pub use scheduler::Scheduler;
pub use state::{GameOutcome, Phase, Verdict};
pub use stats::{CapturedCount, CapturedTally, GameStats, PlayerStats, PlayerStatsPair};

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::commentary::{Commentator, MoveContext};
use crate::config::SessionSettings;
use crate::error::{SessionError, SessionResult};
use crate::eval::evaluate;
use crate::rules::{CandidateMove, MoveRequest, Oracle, Position};
use crate::types::{color_name, last_rank, Color, Piece, Score, Square, PROMOTION_PIECES};

const WELCOME_COMMENT: &str = "Welcome to the game! White to move.";
const STARTED_COMMENT: &str = "Game started! White to move.";
const RESET_COMMENT: &str = "Press Start to begin the game!";

/// Side played by the human
pub const HUMAN: Color = Color::White;

/// A selected piece and where it can go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub square: Square,
    /// Legal destinations
    pub targets: Vec<Square>,
    /// Destinations that capture
    pub captures: Vec<Square>,
}

/// A pawn move waiting for its promotion piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPromotion {
    pub from: Square,
    pub to: Square,
}

/// An applied move and its bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRecord {
    pub mv: CandidateMove,
    /// Does the move give check?
    pub gives_check: bool,
    /// Seconds since the previous move (or the start)
    pub move_time: f64,
}

/// What a square selection did
#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome {
    Selected(Selection),
    Cleared,
    /// Nothing selectable on that square
    Ignored,
    /// The move needs a promotion piece; see [`GameSession::choose_promotion`]
    PromotionRequired(PendingPromotion),
    Moved(MoveRecord),
}

/// Something that happened during [`GameSession::poll`]
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ComputerMoved {
        record: MoveRecord,
        /// Time between scheduling the reply and playing it
        thinking: Duration,
    },
    ClockTick {
        color: Color,
        remaining: f64,
    },
    GameOver(GameOutcome),
}

/// One human-versus-computer game.
pub struct GameSession<O: Oracle = Position> {
    position: O,
    phase: Phase,
    outcome: Option<GameOutcome>,
    history: Vec<String>,
    selection: Option<Selection>,
    pending_promotion: Option<PendingPromotion>,
    captured: CapturedTally,
    player_stats: PlayerStatsPair,
    game_stats: GameStats,
    clocks: Clocks,
    timer_mode: TimerMode,
    piece_style: PieceStyle,
    comment: String,
    /// When the previous move was played (or the game started)
    last_move_at: Duration,
    settings: SessionSettings,
    coordinator: TurnCoordinator,
    time: Arc<dyn TimeSource>,
    commentator: Box<dyn Commentator + Send>,
    store: Option<Box<dyn SnapshotStore>>,
}

impl GameSession<Position> {
    /// Fresh session from the standard starting position.
    pub fn new(
        settings: SessionSettings,
        time: Arc<dyn TimeSource>,
        commentator: Box<dyn Commentator + Send>,
    ) -> Self {
        Self::with_position(Position::default(), settings, time, commentator)
    }
}

impl<O: Oracle> GameSession<O> {
    /// Fresh, idle session playing from `position`.
    pub fn with_position(
        position: O,
        settings: SessionSettings,
        time: Arc<dyn TimeSource>,
        commentator: Box<dyn Commentator + Send>,
    ) -> Self {
        let now = time.now();
        Self {
            position,
            phase: Phase::Idle,
            outcome: None,
            history: Vec::new(),
            selection: None,
            pending_promotion: None,
            captured: CapturedTally::default(),
            player_stats: PlayerStatsPair::default(),
            game_stats: GameStats::default(),
            clocks: Clocks::for_mode(TimerMode::Untimed, settings.timed_budget_secs),
            timer_mode: TimerMode::Untimed,
            piece_style: PieceStyle::Default,
            comment: WELCOME_COMMENT.to_string(),
            last_move_at: now,
            coordinator: TurnCoordinator::from_settings(&settings),
            settings,
            time,
            commentator,
            store: None,
        }
    }

    /// Save to `store` after every change, without loading from it.
    pub fn with_store(mut self, store: Box<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Resume from whatever `store` holds, then keep saving to it.
    pub fn restore(mut self, store: Box<dyn SnapshotStore>) -> Self {
        let snapshot = SessionSnapshot::load(store.as_ref());
        self.apply_snapshot(snapshot);
        self.store = Some(store);
        self
    }

    // ========================================================================
    // EVENT API
    // ========================================================================

    /// Begin play. Only valid from `Idle`.
    pub fn start(&mut self) -> SessionResult<()> {
        self.require(Phase::Idle, "start")?;

        let now = self.time.now();
        self.phase = Phase::Active;
        self.last_move_at = now;
        self.comment = STARTED_COMMENT.to_string();
        info!(timer = %self.timer_mode, "game started");

        if let Some(outcome) = GameOutcome::from_position(&self.position) {
            self.finish(outcome);
        } else {
            self.resume_scheduling(now);
        }
        self.save();
        Ok(())
    }

    /// Handle a click on `square` by the human.
    pub fn select_square(&mut self, square: Square) -> SessionResult<SelectOutcome> {
        self.require(Phase::Active, "select a square")?;
        if self.position.side_to_move() != HUMAN {
            return Err(SessionError::OpponentToMove);
        }

        let outcome = match self.selection.take() {
            None => match self.selectable(square) {
                Some(selection) if !selection.targets.is_empty() => {
                    self.selection = Some(selection.clone());
                    SelectOutcome::Selected(selection)
                }
                _ => SelectOutcome::Ignored,
            },
            Some(current) if current.targets.contains(&square) => {
                return self.move_selected(current, square);
            }
            Some(_) => match self.selectable(square) {
                // Another own piece takes over the selection, movable or not.
                Some(selection) => {
                    self.selection = Some(selection.clone());
                    SelectOutcome::Selected(selection)
                }
                None => SelectOutcome::Cleared,
            },
        };
        self.save();
        Ok(outcome)
    }

    /// Drop the current selection. Does nothing while a promotion is pending.
    pub fn clear_selection(&mut self) {
        if self.phase == Phase::Active && self.selection.take().is_some() {
            self.save();
        }
    }

    /// Complete a parked promotion with `piece`.
    pub fn choose_promotion(&mut self, piece: Piece) -> SessionResult<MoveRecord> {
        self.require(Phase::AwaitingPromotion, "choose a promotion")?;
        if !PROMOTION_PIECES.contains(&piece) {
            return Err(SessionError::InvalidPromotion(piece));
        }
        let Some(pending) = self.pending_promotion.take() else {
            self.phase = Phase::Active;
            return Err(SessionError::InvalidTransition {
                operation: "choose a promotion",
                phase: Phase::Active.name(),
            });
        };

        self.phase = Phase::Active;
        let request = MoveRequest::new(pending.from, pending.to).with_promotion(piece);
        self.apply_human(request)
    }

    /// Back to a fresh `Idle` session. Timer mode and piece style are kept;
    /// persisted records are removed.
    pub fn reset(&mut self) {
        self.coordinator.cancel_all();
        self.position.reset();
        self.phase = Phase::Idle;
        self.outcome = None;
        self.history.clear();
        self.selection = None;
        self.pending_promotion = None;
        self.captured = CapturedTally::default();
        self.player_stats = PlayerStatsPair::default();
        self.game_stats = GameStats::default();
        self.clocks = Clocks::for_mode(self.timer_mode, self.settings.timed_budget_secs);
        self.comment = RESET_COMMENT.to_string();
        self.last_move_at = self.time.now();

        if let Some(store) = &self.store {
            if let Err(e) = SessionSnapshot::clear(store.as_ref()) {
                warn!(error = %e, "failed to clear saved session");
            }
        }
        info!("session reset");
    }

    /// Choose timed or untimed play. Only valid before the game starts.
    pub fn set_timer_mode(&mut self, mode: TimerMode) -> SessionResult<()> {
        self.require(Phase::Idle, "change the timer")?;
        self.timer_mode = mode;
        self.clocks = Clocks::for_mode(mode, self.settings.timed_budget_secs);
        self.save();
        Ok(())
    }

    pub fn set_piece_style(&mut self, style: PieceStyle) {
        self.piece_style = style;
        self.save();
    }

    /// Run every deferred task that is due now.
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        let now = self.time.now();
        let mut events = Vec::new();
        while let Some((due, task)) = self.coordinator.pop_due(now) {
            match task {
                Task::Reply(reply) => self.deliver_reply(reply, due, &mut events),
                Task::Tick => self.tick(due, &mut events),
            }
        }
        events
    }

    /// When `poll` next has something to do.
    pub fn next_wakeup(&mut self) -> Option<Duration> {
        self.coordinator.next_wakeup()
    }

    // ========================================================================
    // OBSERVERS
    // ========================================================================

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn position(&self) -> &O {
        &self.position
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    pub fn is_started(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// SAN of every move played, in order
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn pending_promotion(&self) -> Option<PendingPromotion> {
        self.pending_promotion
    }

    pub fn captured(&self) -> &CapturedTally {
        &self.captured
    }

    pub fn player_stats(&self) -> &PlayerStatsPair {
        &self.player_stats
    }

    pub fn game_stats(&self) -> &GameStats {
        &self.game_stats
    }

    pub fn clocks(&self) -> Clocks {
        self.clocks
    }

    pub fn timer_mode(&self) -> TimerMode {
        self.timer_mode
    }

    pub fn piece_style(&self) -> PieceStyle {
        self.piece_style
    }

    /// Latest commentary line
    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Is the computer's reply still pending?
    pub fn is_thinking(&self) -> bool {
        self.coordinator.reply_pending()
    }

    /// Static evaluation of the current position
    pub fn evaluation(&self) -> Score {
        evaluate(&self.position)
    }

    pub fn status_text(&self) -> String {
        match (self.phase, self.outcome) {
            (Phase::GameOver, Some(outcome)) => outcome.message(),
            (Phase::GameOver, None) => "Game Over!".to_string(),
            (Phase::AwaitingPromotion, _) => "Choose a piece to promote to".to_string(),
            _ => format!("{} to move", color_name(self.position.side_to_move())),
        }
    }

    /// Current state as persistable records.
    pub fn snapshot(&self) -> SessionSnapshot {
        let squares = |list: &[Square]| -> Vec<String> { list.iter().map(|sq| sq.to_string()).collect() };
        let game_state = GameStateRecord {
            selected_square: self.selection.as_ref().map(|s| s.square.to_string()),
            possible_moves: self.selection.as_ref().map_or_else(Vec::new, |s| squares(&s.targets)),
            capturable_squares: self.selection.as_ref().map_or_else(Vec::new, |s| squares(&s.captures)),
            captured_pieces: self.captured.clone(),
            is_game_started: self.is_started(),
            timer_mode: self.timer_mode,
            piece_style: self.piece_style,
        };
        SessionSnapshot {
            fen: Some(self.position.to_fen()),
            moves: self.history.clone(),
            game_state,
            player_stats: self.player_stats.clone(),
            timer: Some(self.clocks),
        }
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn require(&self, phase: Phase, operation: &'static str) -> SessionResult<()> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                operation,
                phase: self.phase.name(),
            })
        }
    }

    /// Selection for a human piece on `square`, even without legal moves.
    fn selectable(&self, square: Square) -> Option<Selection> {
        let piece = self.position.piece_at(square)?;
        if piece.color != HUMAN {
            return None;
        }
        let moves = self.position.legal_moves_from(square);
        let mut targets = Vec::with_capacity(moves.len());
        let mut captures = Vec::new();
        for m in &moves {
            if !targets.contains(&m.to) {
                targets.push(m.to);
            }
            if m.is_capture() && !captures.contains(&m.to) {
                captures.push(m.to);
            }
        }
        Some(Selection { square, targets, captures })
    }

    fn move_selected(&mut self, selection: Selection, to: Square) -> SessionResult<SelectOutcome> {
        let from = selection.square;
        let promotes = self
            .position
            .piece_at(from)
            .is_some_and(|p| p.kind == Piece::Pawn && to.get_rank() == last_rank(p.color));

        if promotes {
            let pending = PendingPromotion { from, to };
            self.pending_promotion = Some(pending);
            self.selection = Some(selection);
            self.phase = Phase::AwaitingPromotion;
            debug!(%from, %to, "awaiting promotion choice");
            self.save();
            return Ok(SelectOutcome::PromotionRequired(pending));
        }

        self.apply_human(MoveRequest::new(from, to)).map(SelectOutcome::Moved)
    }

    fn apply_human(&mut self, request: MoveRequest) -> SessionResult<MoveRecord> {
        match self.position.apply(request) {
            Ok(mv) => {
                let now = self.time.now();
                Ok(self.after_move(mv, now))
            }
            Err(e) => {
                warn!(error = %e, "rejected move");
                self.selection = None;
                self.save();
                Err(e.into())
            }
        }
    }

    /// Bookkeeping shared by every applied move, played at time `at`.
    fn after_move(&mut self, mv: CandidateMove, at: Duration) -> MoveRecord {
        let move_time = at.saturating_sub(self.last_move_at).as_secs_f64();
        self.last_move_at = at;

        let gives_check = self.position.is_check();
        let checkmate = self.position.is_checkmate();

        self.game_stats.record(mv.piece, mv.is_capture(), gives_check, move_time);
        let stats = self.player_stats.get_mut(mv.color);
        stats.captures += u32::from(mv.is_capture());
        stats.checks += u32::from(gives_check);
        stats.move_time += move_time;

        if let Some(victim) = mv.captured {
            self.captured.record(!mv.color, victim);
        }

        self.history.push(mv.san.clone());
        self.comment = self.commentator.describe(&MoveContext {
            piece: mv.piece,
            color: mv.color,
            captured: mv.captured,
            is_check: gives_check,
            is_checkmate: checkmate,
            move_number: self.position.fullmove_number(),
            piece_count: self.position.pieces().len(),
        });
        self.selection = None;

        info!(
            side = color_name(mv.color),
            san = %mv.san,
            move_time,
            "move played"
        );

        if let Some(outcome) = GameOutcome::from_position(&self.position) {
            self.finish(outcome);
        } else if mv.color == HUMAN {
            self.coordinator.schedule_reply(&self.position, at);
        }

        self.save();
        MoveRecord {
            mv,
            gives_check,
            move_time,
        }
    }

    /// Play the computer's reply as of its due time, however late the poll.
    fn deliver_reply(&mut self, reply: PendingReply, due: Duration, events: &mut Vec<SessionEvent>) {
        if self.phase != Phase::Active || self.position.side_to_move() == HUMAN {
            debug!("dropping reply for a session that moved on");
            return;
        }

        let thinking = due.saturating_sub(reply.scheduled_at);
        debug!(
            mv = %reply.candidate.san,
            score = %reply.score,
            nodes = reply.stats.nodes,
            thinking_ms = thinking.as_millis() as u64,
            "delivering reply"
        );
        let computer = !HUMAN;
        if self.clocks.charge(computer, thinking.as_secs_f64()) {
            let outcome = GameOutcome::Timeout { winner: HUMAN };
            self.finish(outcome);
            self.save();
            events.push(SessionEvent::GameOver(outcome));
            return;
        }

        match self.position.apply(reply.candidate.request()) {
            Ok(mv) => {
                let record = self.after_move(mv, due);
                events.push(SessionEvent::ComputerMoved { record, thinking });
                if let Some(outcome) = self.outcome {
                    events.push(SessionEvent::GameOver(outcome));
                }
            }
            Err(e) => warn!(error = %e, "scheduled reply no longer legal"),
        }
    }

    fn tick(&mut self, due: Duration, events: &mut Vec<SessionEvent>) {
        let running = matches!(self.phase, Phase::Active | Phase::AwaitingPromotion);
        if !running || !self.timer_mode.is_timed() {
            return;
        }

        let color = self.position.side_to_move();
        let seconds = self.coordinator.tick_interval().as_secs_f64();
        let expired = self.clocks.charge(color, seconds);
        events.push(SessionEvent::ClockTick {
            color,
            remaining: self.clocks.remaining(color).unwrap_or_default(),
        });

        if expired {
            let outcome = GameOutcome::Timeout { winner: !color };
            self.finish(outcome);
            events.push(SessionEvent::GameOver(outcome));
        } else {
            self.coordinator.schedule_tick(due);
        }
        self.save();
    }

    fn finish(&mut self, outcome: GameOutcome) {
        self.coordinator.cancel_all();
        self.phase = Phase::GameOver;
        self.outcome = Some(outcome);
        self.selection = None;
        self.pending_promotion = None;
        info!(result = %outcome.verdict(), message = %outcome.message(), "game over");
    }

    /// Restart ticking and, if the computer is to move, its reply.
    fn resume_scheduling(&mut self, now: Duration) {
        if self.timer_mode.is_timed() {
            self.coordinator.schedule_tick(now);
        }
        if self.position.side_to_move() != HUMAN {
            self.coordinator.schedule_reply(&self.position, now);
        }
    }

    fn apply_snapshot(&mut self, snapshot: SessionSnapshot) {
        if let Some(fen) = &snapshot.fen {
            if let Err(e) = self.position.load_fen(fen) {
                warn!(error = %e, "saved position unusable, starting fresh");
                self.position.reset();
            }
        }

        let state = snapshot.game_state;
        self.history = snapshot.moves;
        self.captured = state.captured_pieces;
        self.player_stats = snapshot.player_stats;
        self.timer_mode = state.timer_mode;
        self.piece_style = state.piece_style;
        self.clocks = snapshot
            .timer
            .unwrap_or_else(|| Clocks::for_mode(state.timer_mode, self.settings.timed_budget_secs));
        self.selection = restore_selection(
            state.selected_square.as_deref(),
            &state.possible_moves,
            &state.capturable_squares,
        );

        let now = self.time.now();
        self.last_move_at = now;

        if !state.is_game_started {
            self.phase = Phase::Idle;
            return;
        }

        let flagged = [Color::White, Color::Black]
            .into_iter()
            .find(|&c| self.timer_mode.is_timed() && self.clocks.is_expired(c));
        let outcome = flagged
            .map(|loser| GameOutcome::Timeout { winner: !loser })
            .or_else(|| GameOutcome::from_position(&self.position));

        match outcome {
            Some(outcome) => {
                self.phase = Phase::GameOver;
                self.outcome = Some(outcome);
                self.selection = None;
            }
            None => {
                self.phase = Phase::Active;
                self.resume_scheduling(now);
            }
        }
        info!(phase = %self.phase, moves = self.history.len(), "session restored");
    }

    fn save(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = self.snapshot().save(store.as_ref()) {
            warn!(error = %e, "failed to save session");
        }
    }
}

fn restore_selection(square: Option<&str>, targets: &[String], captures: &[String]) -> Option<Selection> {
    let parse = |list: &[String]| -> Option<Vec<Square>> {
        list.iter().map(|s| Square::from_str(s).ok()).collect()
    };
    Some(Selection {
        square: Square::from_str(square?).ok()?,
        targets: parse(targets)?,
        captures: parse(captures)?,
    })
}
