use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use greedychess::cli::CliHandler;
use greedychess::commentary::RandomCommentator;
use greedychess::config::Settings;
use greedychess::rules::{Position, START_FEN};
use greedychess::session::{FileStore, GameSession, MonotonicClock, TimeSource, TimerMode};

/// Play white against a greedy one-move-deep opponent.
#[derive(Debug, Parser)]
#[command(name = "greedychess", version, about)]
struct Args {
    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to save and resume the session from (overrides settings)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Starting position for a new game
    #[arg(long, default_value = START_FEN)]
    fen: String,

    /// Clock for a new game: none or 5min
    #[arg(long)]
    timer: Option<TimerMode>,

    /// Seed for reproducible commentary
    #[arg(long)]
    seed: Option<u64>,

    /// Log filter used when RUST_LOG is unset (overrides settings)
    #[arg(long)]
    log: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let loaded = args.config.as_deref().map(Settings::load);
    let settings = match &loaded {
        Some(Ok(settings)) => settings.clone(),
        _ => Settings::default(),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(args.log.as_deref().unwrap_or(&settings.log_filter))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let (Some(path), Some(Err(e))) = (&args.config, &loaded) {
        warn!(path = %path.display(), error = %e, "failed to load settings, using defaults");
    }

    let position = match Position::from_fen(&args.fen) {
        Ok(position) => position,
        Err(e) => {
            error!(error = %e, "bad starting position");
            return ExitCode::FAILURE;
        }
    };

    let time: Arc<dyn TimeSource> = Arc::new(MonotonicClock::new());
    let commentator = match args.seed {
        Some(seed) => RandomCommentator::with_seed(seed),
        None => RandomCommentator::new(),
    };
    let mut session = GameSession::with_position(
        position,
        settings.session.clone(),
        time.clone(),
        Box::new(commentator),
    );

    if let Some(dir) = args.store.or(settings.store_dir) {
        match FileStore::open(&dir) {
            Ok(store) => {
                info!(dir = %dir.display(), "resuming from store");
                session = session.restore(Box::new(store));
            }
            Err(e) => warn!(dir = %dir.display(), error = %e, "store unavailable, not saving"),
        }
    }

    if let Some(mode) = args.timer {
        if let Err(e) = session.set_timer_mode(mode) {
            warn!(error = %e, "timer option ignored");
        }
    }

    let stdin = io::stdin();
    let mut handler = CliHandler::new(session, time, io::stdout());
    match handler.run(stdin.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "input error");
            ExitCode::FAILURE
        }
    }
}
