//! Per-player statistics, captured-piece tallies and whole-game stats.

use serde::{Deserialize, Serialize};

use crate::types::{piece_code, Color, Piece};

/// Running totals for one side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub captures: u32,
    pub checks: u32,
    /// Cumulative seconds spent on this side's moves
    pub move_time: f64,
}

/// [`PlayerStats`] for both sides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStatsPair {
    pub white: PlayerStats,
    pub black: PlayerStats,
}

impl PlayerStatsPair {
    pub fn get(&self, color: Color) -> &PlayerStats {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    pub fn get_mut(&mut self, color: Color) -> &mut PlayerStats {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }
}

/// Serde as the lowercase piece letter used in records.
mod piece_letter {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::types::{piece_code, piece_from_code, Piece};

    pub fn serialize<S: Serializer>(piece: &Piece, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(piece_code(*piece))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Piece, D::Error> {
        let letter = char::deserialize(deserializer)?;
        piece_from_code(letter).ok_or_else(|| D::Error::custom(format!("unknown piece '{}'", letter)))
    }
}

/// How many pieces of one kind have been taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedCount {
    #[serde(rename = "type", with = "piece_letter")]
    pub kind: Piece,
    pub count: u32,
}

/// Captured pieces, grouped by the colour of the piece that was taken.
/// Kinds appear in the order they were first captured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapturedTally {
    pub white: Vec<CapturedCount>,
    pub black: Vec<CapturedCount>,
}

impl CapturedTally {
    pub fn entries(&self, color: Color) -> &[CapturedCount] {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    /// Record that a `kind` piece of colour `color` left the board.
    pub fn record(&mut self, color: Color, kind: Piece) {
        let list = match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        };
        match list.iter_mut().find(|entry| entry.kind == kind) {
            Some(entry) => entry.count += 1,
            None => list.push(CapturedCount { kind, count: 1 }),
        }
    }

    pub fn count(&self, color: Color, kind: Piece) -> u32 {
        self.entries(color)
            .iter()
            .find(|entry| entry.kind == kind)
            .map_or(0, |entry| entry.count)
    }

    pub fn total(&self, color: Color) -> u32 {
        self.entries(color).iter().map(|entry| entry.count).sum()
    }
}

/// Whole-game figures across both sides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameStats {
    pub total_moves: u32,
    pub captures: u32,
    pub checks: u32,
    pub average_move_time: f64,
    pub longest_move_time: f64,
    /// `None` until the first move
    pub shortest_move_time: Option<f64>,
    /// Moves made per piece kind, indexed by `Piece::to_index`
    pub piece_activity: [u32; 6],
}

impl GameStats {
    pub fn record(&mut self, piece: Piece, capture: bool, check: bool, move_time: f64) {
        let previous = f64::from(self.total_moves);
        self.average_move_time = (self.average_move_time * previous + move_time) / (previous + 1.0);
        self.total_moves += 1;
        self.captures += u32::from(capture);
        self.checks += u32::from(check);
        self.longest_move_time = self.longest_move_time.max(move_time);
        self.shortest_move_time = Some(
            self.shortest_move_time
                .map_or(move_time, |shortest| shortest.min(move_time)),
        );
        self.piece_activity[piece.to_index()] += 1;
    }

    #[inline]
    pub fn activity(&self, piece: Piece) -> u32 {
        self.piece_activity[piece.to_index()]
    }

    /// Activity as `(letter, count)` pairs, pawn first.
    pub fn activity_summary(&self) -> Vec<(char, u32)> {
        [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen, Piece::King]
            .iter()
            .map(|&p| (piece_code(p), self.activity(p)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_keeps_first_capture_order() {
        let mut tally = CapturedTally::default();
        tally.record(Color::Black, Piece::Knight);
        tally.record(Color::Black, Piece::Pawn);
        tally.record(Color::Black, Piece::Knight);

        let kinds: Vec<Piece> = tally.entries(Color::Black).iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![Piece::Knight, Piece::Pawn]);
        assert_eq!(tally.count(Color::Black, Piece::Knight), 2);
        assert_eq!(tally.total(Color::Black), 3);
        assert_eq!(tally.total(Color::White), 0);
    }

    #[test]
    fn test_tally_record_format() {
        let mut tally = CapturedTally::default();
        tally.record(Color::White, Piece::Queen);
        let json = serde_json::to_string(&tally).unwrap();
        assert_eq!(json, r#"{"white":[{"type":"q","count":1}],"black":[]}"#);
        let back: CapturedTally = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tally);
        assert!(serde_json::from_str::<CapturedTally>(r#"{"white":[{"type":"x","count":1}]}"#).is_err());
    }

    #[test]
    fn test_game_stats_move_times() {
        let mut stats = GameStats::default();
        assert_eq!(stats.shortest_move_time, None);

        stats.record(Piece::Pawn, false, false, 2.0);
        stats.record(Piece::Knight, true, true, 4.0);
        stats.record(Piece::Pawn, false, false, 3.0);

        assert_eq!(stats.total_moves, 3);
        assert_eq!(stats.captures, 1);
        assert_eq!(stats.checks, 1);
        assert_eq!(stats.average_move_time, 3.0);
        assert_eq!(stats.longest_move_time, 4.0);
        assert_eq!(stats.shortest_move_time, Some(2.0));
        assert_eq!(stats.activity(Piece::Pawn), 2);
        assert_eq!(stats.activity_summary()[1], ('n', 1));
    }

    #[test]
    fn test_player_stats_accessors() {
        let mut pair = PlayerStatsPair::default();
        pair.get_mut(Color::Black).captures += 2;
        assert_eq!(pair.get(Color::Black).captures, 2);
        assert_eq!(pair.get(Color::White).captures, 0);
    }
}
