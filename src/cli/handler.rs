//! Command handler and main loop.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use super::parser::{parse_command, CliCommand};
use super::{format_move, render_board};
use crate::eval::is_endgame;
use crate::rules::MoveRequest;
use crate::search::MoveSelector;
use crate::session::{
    format_clock, GameSession, MoveRecord, Phase, PieceStyle, SelectOutcome, SessionEvent,
    TimeSource, TimerMode,
};
use crate::types::{color_name, piece_name, Color, Piece, Square};

const HELP: &[&str] = &[
    "commands:",
    "  start                     begin the game",
    "  select <sq>               click a square (select, move or clear)",
    "  move <from><to>[q|r|b|n]  play a move, e.g. move e2e4",
    "  promote <q|r|b|n>         finish a pending promotion",
    "  reset                     start over",
    "  timer <none|5min>         choose the clock (before start)",
    "  style <default|alpha|neo> piece glyphs",
    "  wait [seconds]            let the computer reply, or let time pass",
    "  board | status | history | captures | stats | clock | eval",
    "  help | quit",
];

/// Text protocol handler
pub struct CliHandler<W: Write> {
    session: GameSession,
    time: Arc<dyn TimeSource>,
    out: W,
    /// Should the loop stop
    quit: bool,
}

impl<W: Write> CliHandler<W> {
    /// `time` must be the source the session was built with.
    pub fn new(session: GameSession, time: Arc<dyn TimeSource>, out: W) -> Self {
        Self {
            session,
            time,
            out,
            quit: false,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn is_quit(&self) -> bool {
        self.quit
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run<R: BufRead>(&mut self, input: R) -> io::Result<()> {
        let banner = self.session.comment().to_string();
        self.send(&banner);
        self.send("type 'help' for commands");

        for line in input.lines() {
            let line = line?;
            trace!(input = %line, "command");
            self.handle_input(&line);
            if self.quit {
                break;
            }
        }
        Ok(())
    }

    /// Handle a single command line, then deliver anything that fell due.
    pub fn handle_input(&mut self, input: &str) {
        if input.trim().is_empty() {
            self.flush_events();
            return;
        }
        let cmd = parse_command(input);
        self.handle_command(cmd);
        self.flush_events();
    }

    fn handle_command(&mut self, cmd: CliCommand) {
        match cmd {
            CliCommand::Start => self.cmd_start(),
            CliCommand::Select(square) => self.cmd_select(square),
            CliCommand::Move(request) => self.cmd_move(request),
            CliCommand::Promote(piece) => self.cmd_promote(piece),
            CliCommand::Reset => self.cmd_reset(),
            CliCommand::Timer(mode) => self.cmd_timer(mode),
            CliCommand::Style(style) => self.cmd_style(style),
            CliCommand::Wait(secs) => self.cmd_wait(secs),
            CliCommand::Board => self.cmd_board(),
            CliCommand::Status => self.cmd_status(),
            CliCommand::History => self.cmd_history(),
            CliCommand::Captures => self.cmd_captures(),
            CliCommand::Stats => self.cmd_stats(),
            CliCommand::Clock => self.cmd_clock(),
            CliCommand::Eval => self.cmd_eval(),
            CliCommand::Help => {
                for line in HELP {
                    self.send(line);
                }
            }
            CliCommand::Quit => self.quit = true,
            CliCommand::Invalid(usage) => self.send(&usage),
            CliCommand::Unknown(s) => {
                debug!(input = %s, "unknown command");
                self.send(&format!("unknown command '{}', try 'help'", s));
            }
        }
    }

    /// Send a line of output
    fn send(&mut self, msg: &str) {
        writeln!(self.out, "{}", msg).ok();
        self.out.flush().ok();
    }

    fn flush_events(&mut self) {
        for event in self.session.poll() {
            self.report_event(event);
        }
    }

    fn report_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ComputerMoved { record, thinking } => {
                self.send(&format!(
                    "computer plays {} ({}) after {:.1}s",
                    record.mv.san,
                    format_move(record.mv.request()),
                    thinking.as_secs_f64()
                ));
                let comment = self.session.comment().to_string();
                self.send(&comment);
            }
            SessionEvent::ClockTick { color, remaining } => {
                trace!(side = color_name(color), remaining, "clock tick");
            }
            SessionEvent::GameOver(outcome) => {
                self.send(&format!("{} {}", outcome.headline(), outcome.message()));
            }
        }
    }

    fn report_human_move(&mut self, record: &MoveRecord) {
        self.send(&format!(
            "you play {} ({})",
            record.mv.san,
            format_move(record.mv.request())
        ));
        let comment = self.session.comment().to_string();
        self.send(&comment);
        if let Some(outcome) = self.session.outcome() {
            self.send(&format!("{} {}", outcome.headline(), outcome.message()));
        } else if self.session.is_thinking() {
            self.send("computer is thinking...");
        }
    }

    // === Commands ===

    fn cmd_start(&mut self) {
        match self.session.start() {
            Ok(()) => {
                let comment = self.session.comment().to_string();
                self.send(&comment);
                if let Some(outcome) = self.session.outcome() {
                    self.send(&format!("{} {}", outcome.headline(), outcome.message()));
                }
            }
            Err(e) => self.send(&format!("error: {}", e)),
        }
    }

    fn cmd_select(&mut self, square: Square) {
        match self.session.select_square(square) {
            Ok(outcome) => self.report_select(outcome),
            Err(e) => self.send(&format!("error: {}", e)),
        }
    }

    fn report_select(&mut self, outcome: SelectOutcome) {
        match outcome {
            SelectOutcome::Selected(sel) => {
                let targets: Vec<String> = sel.targets.iter().map(|sq| sq.to_string()).collect();
                if targets.is_empty() {
                    self.send(&format!("selected {}, no moves", sel.square));
                } else {
                    self.send(&format!("selected {}: {}", sel.square, targets.join(" ")));
                }
            }
            SelectOutcome::Cleared => self.send("selection cleared"),
            SelectOutcome::Ignored => self.send("nothing to select there"),
            SelectOutcome::PromotionRequired(p) => {
                self.send(&format!("promote {}{}: choose q, r, b or n", p.from, p.to));
            }
            SelectOutcome::Moved(record) => self.report_human_move(&record),
        }
    }

    /// A move is two clicks, plus a promotion choice when needed.
    fn cmd_move(&mut self, request: MoveRequest) {
        self.session.clear_selection();

        match self.session.select_square(request.from) {
            Ok(SelectOutcome::Selected(_)) => {}
            Ok(_) => {
                self.send(&format!("no movable piece on {}", request.from));
                return;
            }
            Err(e) => {
                self.send(&format!("error: {}", e));
                return;
            }
        }

        match self.session.select_square(request.to) {
            Ok(SelectOutcome::Moved(record)) => self.report_human_move(&record),
            Ok(SelectOutcome::PromotionRequired(p)) => match request.promotion {
                Some(piece) => self.cmd_promote(piece),
                None => self.send(&format!("promote {}{}: choose q, r, b or n", p.from, p.to)),
            },
            Ok(_) => {
                self.session.clear_selection();
                self.send(&format!("illegal move {}", format_move(request)));
            }
            Err(e) => self.send(&format!("error: {}", e)),
        }
    }

    fn cmd_promote(&mut self, piece: Piece) {
        match self.session.choose_promotion(piece) {
            Ok(record) => self.report_human_move(&record),
            Err(e) => self.send(&format!("error: {}", e)),
        }
    }

    fn cmd_reset(&mut self) {
        self.session.reset();
        let comment = self.session.comment().to_string();
        self.send(&comment);
    }

    fn cmd_timer(&mut self, mode: TimerMode) {
        match self.session.set_timer_mode(mode) {
            Ok(()) => self.send(&format!("timer set to {}", mode)),
            Err(e) => self.send(&format!("error: {}", e)),
        }
    }

    fn cmd_style(&mut self, style: PieceStyle) {
        self.session.set_piece_style(style);
        self.send(&format!("piece style set to {}", style));
    }

    /// Without an argument, wait for the computer's reply. With one, let
    /// that many seconds pass, delivering whatever falls due on the way.
    fn cmd_wait(&mut self, secs: Option<f64>) {
        match secs {
            None => {
                if !self.session.is_thinking() {
                    self.send("nothing to wait for");
                    return;
                }
                while self.session.is_thinking() {
                    let Some(wakeup) = self.session.next_wakeup() else {
                        break;
                    };
                    self.time.sleep_until(wakeup);
                    self.flush_events();
                }
            }
            Some(secs) => {
                let deadline = self.time.now() + Duration::from_secs_f64(secs);
                while let Some(wakeup) = self.session.next_wakeup() {
                    if wakeup > deadline {
                        break;
                    }
                    self.time.sleep_until(wakeup);
                    self.flush_events();
                }
                self.time.sleep_until(deadline);
            }
        }
    }

    fn cmd_board(&mut self) {
        let board = render_board(
            self.session.position(),
            self.session.selection(),
            self.session.piece_style(),
        );
        for line in board.lines() {
            self.send(line);
        }
    }

    fn cmd_status(&mut self) {
        let status = self.session.status_text();
        self.send(&status);
        let phase = self.session.phase();
        let thinking = if self.session.is_thinking() { ", computer thinking" } else { "" };
        self.send(&format!(
            "phase: {}, timer: {}, style: {}{}",
            phase,
            self.session.timer_mode(),
            self.session.piece_style(),
            thinking
        ));
        if phase != Phase::Idle {
            let comment = self.session.comment().to_string();
            self.send(&comment);
        }
    }

    fn cmd_history(&mut self) {
        let history = self.session.history();
        if history.is_empty() {
            self.send("no moves yet");
            return;
        }
        let lines: Vec<String> = history
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| format!("{}. {}", i + 1, pair.join(" ")))
            .collect();
        for line in lines {
            self.send(&line);
        }
    }

    fn cmd_captures(&mut self) {
        for color in [Color::White, Color::Black] {
            let entries: Vec<String> = self
                .session
                .captured()
                .entries(color)
                .iter()
                .map(|e| format!("{} x{}", piece_name(e.kind), e.count))
                .collect();
            let listed = if entries.is_empty() { "none".to_string() } else { entries.join(", ") };
            self.send(&format!("{} pieces lost: {}", color_name(color), listed));
        }
    }

    fn cmd_stats(&mut self) {
        for color in [Color::White, Color::Black] {
            let stats = self.session.player_stats().get(color).clone();
            self.send(&format!(
                "{}: {} captures, {} checks, {:.1}s thinking",
                color_name(color),
                stats.captures,
                stats.checks,
                stats.move_time
            ));
        }
        let game = self.session.game_stats().clone();
        let shortest = game
            .shortest_move_time
            .map_or_else(|| "-".to_string(), |t| format!("{:.1}s", t));
        self.send(&format!(
            "moves: {}, captures: {}, checks: {}, average {:.1}s, longest {:.1}s, shortest {}",
            game.total_moves,
            game.captures,
            game.checks,
            game.average_move_time,
            game.longest_move_time,
            shortest
        ));
        let activity: Vec<String> = game
            .activity_summary()
            .into_iter()
            .map(|(code, n)| format!("{}:{}", code, n))
            .collect();
        self.send(&format!("activity: {}", activity.join(" ")));
    }

    fn cmd_clock(&mut self) {
        let clocks = self.session.clocks();
        self.send(&format!(
            "White {}  Black {}",
            format_clock(clocks.white),
            format_clock(clocks.black)
        ));
    }

    fn cmd_eval(&mut self) {
        let position = self.session.position();
        let score = self.session.evaluation();
        let phase = if is_endgame(position) { "endgame" } else { "middlegame" };
        let result = MoveSelector::new().pick_move(position);
        let best = result
            .best
            .map(|b| format!("{} ({})", b.candidate.san, b.score))
            .unwrap_or_else(|| "none".to_string());
        self.send(&format!(
            "eval {} ({}), greedy pick: {}, {} nodes",
            score, phase, best, result.stats.nodes
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commentary::RandomCommentator;
    use crate::config::SessionSettings;
    use crate::rules::Position;
    use crate::session::ManualClock;

    fn handler_at(fen: &str) -> (CliHandler<Vec<u8>>, ManualClock) {
        let clock = ManualClock::new();
        let time: Arc<dyn TimeSource> = Arc::new(clock.clone());
        let session = GameSession::with_position(
            Position::from_fen(fen).unwrap(),
            SessionSettings::default(),
            time.clone(),
            Box::new(RandomCommentator::with_seed(3)),
        );
        (CliHandler::new(session, time, Vec::new()), clock)
    }

    fn handler() -> (CliHandler<Vec<u8>>, ManualClock) {
        handler_at(crate::rules::START_FEN)
    }

    fn output(handler: &CliHandler<Vec<u8>>) -> String {
        String::from_utf8_lossy(handler.output()).into_owned()
    }

    #[test]
    fn test_move_before_start_is_rejected() {
        let (mut h, _) = handler();
        h.handle_input("move e2e4");
        assert!(output(&h).contains("error: cannot select a square"));
        assert!(h.session().history().is_empty());
    }

    #[test]
    fn test_move_and_wait_for_reply() {
        let (mut h, clock) = handler();
        h.handle_input("start");
        h.handle_input("move e2e4");
        assert!(output(&h).contains("you play e4 (e2e4)"));
        assert!(h.session().is_thinking());

        h.handle_input("wait");
        assert!(!h.session().is_thinking());
        assert_eq!(h.session().history().len(), 2);
        assert_eq!(clock.now(), Duration::from_secs(2));
        assert!(output(&h).contains("computer plays"));
    }

    #[test]
    fn test_illegal_move_clears_selection() {
        let (mut h, _) = handler();
        h.handle_input("start");
        h.handle_input("move e2e5");
        assert!(output(&h).contains("illegal move e2e5"));
        assert!(h.session().selection().is_none());
        h.handle_input("move e7e5");
        assert!(output(&h).contains("no movable piece on e7"));
    }

    #[test]
    fn test_move_with_promotion_suffix() {
        let (mut h, _) = handler_at("8/4P3/8/8/8/8/k7/4K3 w - - 0 1");
        h.handle_input("start");
        h.handle_input("move e7e8n");
        assert_eq!(h.session().history(), ["e8=N"]);
    }

    #[test]
    fn test_promotion_prompt_then_choice() {
        let (mut h, _) = handler_at("8/4P3/8/8/8/8/k7/4K3 w - - 0 1");
        h.handle_input("start");
        h.handle_input("move e7e8");
        assert!(output(&h).contains("choose q, r, b or n"));
        assert_eq!(h.session().phase(), Phase::AwaitingPromotion);
        h.handle_input("promote q");
        assert_eq!(h.session().history(), ["e8=Q"]);
    }

    #[test]
    fn test_wait_seconds_advances_time() {
        let (mut h, clock) = handler();
        h.handle_input("wait 1.5");
        assert_eq!(clock.now(), Duration::from_millis(1500));
        h.handle_input("wait");
        assert!(output(&h).contains("nothing to wait for"));
    }

    #[test]
    fn test_timed_game_clock_runs_while_waiting() {
        let (mut h, _) = handler();
        h.handle_input("timer 5min");
        h.handle_input("start");
        h.handle_input("wait 3");
        assert_eq!(h.session().clocks().white, Some(297.0));
        h.handle_input("clock");
        assert!(output(&h).contains("White 4:57.00  Black 5:00.00"));
    }

    #[test]
    fn test_info_commands() {
        let (mut h, _) = handler();
        h.handle_input("board");
        h.handle_input("history");
        h.handle_input("captures");
        h.handle_input("eval");
        h.handle_input("bogus");
        let out = output(&h);
        assert!(out.contains("1  R  N  B  Q  K  B  N  R"));
        assert!(out.contains("no moves yet"));
        assert!(out.contains("White pieces lost: none"));
        assert!(out.contains("eval +4.0 (middlegame)"));
        assert!(out.contains("unknown command 'bogus'"));
    }

    #[test]
    fn test_run_stops_on_quit() {
        let (mut h, _) = handler();
        let input = io::Cursor::new("start\nquit\nreset\n");
        h.run(input).unwrap();
        assert!(h.is_quit());
        assert_eq!(h.session().phase(), Phase::Active);
    }
}
