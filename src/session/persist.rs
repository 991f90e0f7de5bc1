//! Session snapshots and the stores that hold them.
//!
//! A snapshot is written as a handful of named records, each a string:
//!
//! | key            | content                                        |
//! |----------------|------------------------------------------------|
//! | `fen`          | raw FEN of the current position                |
//! | `moves`        | JSON list of SAN moves                         |
//! | `game_state`   | JSON selection, captures and session flags     |
//! | `player_stats` | JSON per-colour stats                          |
//! | `timer`        | JSON per-colour seconds, `null` when untimed   |
//!
//! Records load independently. A missing or unreadable record falls back to
//! its default without affecting the others.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::clock::{Clocks, TimerMode};
use super::stats::{CapturedTally, PlayerStatsPair};
use crate::error::StoreError;

pub const FEN_KEY: &str = "fen";
pub const MOVES_KEY: &str = "moves";
pub const GAME_STATE_KEY: &str = "game_state";
pub const PLAYER_STATS_KEY: &str = "player_stats";
pub const TIMER_KEY: &str = "timer";

pub const RECORD_KEYS: [&str; 5] = [FEN_KEY, MOVES_KEY, GAME_STATE_KEY, PLAYER_STATS_KEY, TIMER_KEY];

/// Piece artwork set chosen by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceStyle {
    #[default]
    Default,
    Alpha,
    Neo,
}

impl fmt::Display for PieceStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceStyle::Default => f.write_str("default"),
            PieceStyle::Alpha => f.write_str("alpha"),
            PieceStyle::Neo => f.write_str("neo"),
        }
    }
}

impl FromStr for PieceStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(PieceStyle::Default),
            "alpha" => Ok(PieceStyle::Alpha),
            "neo" => Ok(PieceStyle::Neo),
            other => Err(format!("unknown piece style '{}'", other)),
        }
    }
}

/// Selection highlights, captures and session flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameStateRecord {
    pub selected_square: Option<String>,
    pub possible_moves: Vec<String>,
    pub capturable_squares: Vec<String>,
    pub captured_pieces: CapturedTally,
    pub is_game_started: bool,
    pub timer_mode: TimerMode,
    pub piece_style: PieceStyle,
}

/// Everything needed to resume a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    /// `None` means the standard starting position
    pub fen: Option<String>,
    pub moves: Vec<String>,
    pub game_state: GameStateRecord,
    pub player_stats: PlayerStatsPair,
    /// `None` means fresh clocks for the stored timer mode
    pub timer: Option<Clocks>,
}

impl SessionSnapshot {
    /// Write every record.
    pub fn save(&self, store: &dyn SnapshotStore) -> Result<(), StoreError> {
        if let Some(fen) = &self.fen {
            store.write(FEN_KEY, fen)?;
        }
        store.write(MOVES_KEY, &serde_json::to_string(&self.moves)?)?;
        store.write(GAME_STATE_KEY, &serde_json::to_string(&self.game_state)?)?;
        store.write(PLAYER_STATS_KEY, &serde_json::to_string(&self.player_stats)?)?;
        if let Some(timer) = &self.timer {
            store.write(TIMER_KEY, &serde_json::to_string(timer)?)?;
        }
        Ok(())
    }

    /// Read whatever records are usable; never fails.
    pub fn load(store: &dyn SnapshotStore) -> Self {
        let fen = match store.read(FEN_KEY) {
            Ok(fen) => fen.filter(|f| !f.trim().is_empty()),
            Err(e) => {
                warn!(key = FEN_KEY, error = %e, "unreadable record, using default");
                None
            }
        };

        Self {
            fen,
            moves: read_json(store, MOVES_KEY).unwrap_or_default(),
            game_state: read_json(store, GAME_STATE_KEY).unwrap_or_default(),
            player_stats: read_json(store, PLAYER_STATS_KEY).unwrap_or_default(),
            timer: read_json(store, TIMER_KEY),
        }
    }

    /// Remove every record.
    pub fn clear(store: &dyn SnapshotStore) -> Result<(), StoreError> {
        for key in RECORD_KEYS {
            store.remove(key)?;
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(store: &dyn SnapshotStore, key: &str) -> Option<T> {
    let raw = match store.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "unreadable record, using default");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "corrupt record, using default");
            None
        }
    }
}

/// Keyed string storage for session records.
pub trait SnapshotStore: Send {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Removing a missing record is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.lock().contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.records.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.records.lock().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per record inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "opened snapshot store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SnapshotStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, Piece};

    fn sample() -> SessionSnapshot {
        let mut snapshot = SessionSnapshot {
            fen: Some("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1".to_string()),
            moves: vec!["e4".to_string()],
            timer: Some(Clocks { white: Some(297.5), black: Some(300.0) }),
            ..SessionSnapshot::default()
        };
        snapshot.game_state.is_game_started = true;
        snapshot.game_state.timer_mode = TimerMode::FiveMinutes;
        snapshot.game_state.piece_style = PieceStyle::Neo;
        snapshot.game_state.captured_pieces.record(Color::Black, Piece::Pawn);
        snapshot.player_stats.white.move_time = 2.5;
        snapshot
    }

    #[test]
    fn test_round_trip_through_memory_store() {
        let store = MemoryStore::new();
        let snapshot = sample();
        snapshot.save(&store).unwrap();
        for key in RECORD_KEYS {
            assert!(store.contains(key), "missing {}", key);
        }
        assert_eq!(SessionSnapshot::load(&store), snapshot);
    }

    #[test]
    fn test_empty_store_loads_defaults() {
        let snapshot = SessionSnapshot::load(&MemoryStore::new());
        assert_eq!(snapshot, SessionSnapshot::default());
    }

    #[test]
    fn test_corrupt_record_falls_back_alone() {
        let store = MemoryStore::new();
        sample().save(&store).unwrap();
        store.write(PLAYER_STATS_KEY, "{{{").unwrap();
        store.write(TIMER_KEY, "\"soon\"").unwrap();

        let loaded = SessionSnapshot::load(&store);
        assert_eq!(loaded.player_stats, PlayerStatsPair::default());
        assert_eq!(loaded.timer, None);
        assert_eq!(loaded.moves, vec!["e4".to_string()]);
        assert!(loaded.game_state.is_game_started);
    }

    #[test]
    fn test_partial_game_state_keeps_defaults() {
        let store = MemoryStore::new();
        store.write(GAME_STATE_KEY, r#"{"piece_style":"alpha"}"#).unwrap();
        let loaded = SessionSnapshot::load(&store);
        assert_eq!(loaded.game_state.piece_style, PieceStyle::Alpha);
        assert_eq!(loaded.game_state.timer_mode, TimerMode::Untimed);
        assert!(!loaded.game_state.is_game_started);
    }

    #[test]
    fn test_clear_removes_records() {
        let store = MemoryStore::new();
        sample().save(&store).unwrap();
        SessionSnapshot::clear(&store).unwrap();
        assert!(store.is_empty());
        // Clearing twice is fine.
        SessionSnapshot::clear(&store).unwrap();
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("greedychess-store-{}", std::process::id()));
        let store = FileStore::open(&dir).unwrap();
        let snapshot = sample();
        snapshot.save(&store).unwrap();
        assert!(dir.join("fen.json").exists());
        assert_eq!(SessionSnapshot::load(&store), snapshot);

        SessionSnapshot::clear(&store).unwrap();
        assert_eq!(store.read(FEN_KEY).unwrap(), None);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_piece_style_parsing() {
        assert_eq!("Alpha".parse::<PieceStyle>(), Ok(PieceStyle::Alpha));
        assert!("wooden".parse::<PieceStyle>().is_err());
        assert_eq!(serde_json::to_string(&PieceStyle::Neo).unwrap(), "\"neo\"");
    }
}
