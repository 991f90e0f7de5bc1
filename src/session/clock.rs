//! Time sources and chess clocks.
//!
//! All session timing goes through [`TimeSource`], so a test can drive
//! "simulated seconds" with [`ManualClock`] while the binary uses
//! [`MonotonicClock`].

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::types::Color;

/// Monotonic "now", measured from an arbitrary origin.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Duration;

    /// Block until `deadline` has passed.
    fn sleep_until(&self, deadline: Duration) {
        let now = self.now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
    }
}

/// Wall-clock time source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    #[inline]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced time source. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, at: Duration) {
        self.millis.store(at.as_millis() as u64, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    #[inline]
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }

    /// Jumps straight to `deadline` instead of blocking.
    fn sleep_until(&self, deadline: Duration) {
        self.millis
            .fetch_max(deadline.as_millis() as u64, Ordering::SeqCst);
    }
}

/// Whether the game is played against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimerMode {
    #[default]
    #[serde(rename = "none")]
    Untimed,
    #[serde(rename = "5min")]
    FiveMinutes,
}

impl TimerMode {
    #[inline]
    pub fn is_timed(self) -> bool {
        self == TimerMode::FiveMinutes
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerMode::Untimed => write!(f, "none"),
            TimerMode::FiveMinutes => write!(f, "5min"),
        }
    }
}

impl FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "off" | "untimed" => Ok(TimerMode::Untimed),
            "5min" | "5" | "timed" => Ok(TimerMode::FiveMinutes),
            other => Err(format!("unknown timer mode '{}'", other)),
        }
    }
}

/// Remaining seconds per colour; `None` is an untimed clock that never runs
/// out. Serializes untimed clocks as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Clocks {
    pub white: Option<f64>,
    pub black: Option<f64>,
}

impl Clocks {
    /// Fresh clocks for `mode`, `budget` seconds each when timed.
    pub fn for_mode(mode: TimerMode, budget: f64) -> Self {
        let start = mode.is_timed().then_some(budget);
        Self { white: start, black: start }
    }

    #[inline]
    pub fn remaining(&self, color: Color) -> Option<f64> {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    /// Has `color`'s flag fallen?
    #[inline]
    pub fn is_expired(&self, color: Color) -> bool {
        self.remaining(color).is_some_and(|t| t <= 0.0)
    }

    /// Take `seconds` off `color`'s clock, never going below zero.
    /// Returns true when the clock is now empty.
    pub fn charge(&mut self, color: Color, seconds: f64) -> bool {
        let slot = match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        };
        match slot {
            Some(t) => {
                *t = (*t - seconds).max(0.0);
                *t <= 0.0
            }
            None => false,
        }
    }
}

/// Render remaining time as `m:ss.cc`, or `--:--` for an untimed clock.
pub fn format_clock(remaining: Option<f64>) -> String {
    let Some(seconds) = remaining else {
        return "--:--".to_string();
    };
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor() as u64;
    let whole = (seconds % 60.0).floor() as u64;
    // A fraction that rounds up to a full second shows as .00
    let cents = ((seconds % 1.0) * 100.0).round() as u64 % 100;
    format!("{}:{:02}.{:02}", minutes, whole, cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(Duration::from_millis(1500));
        assert_eq!(clock.now(), Duration::from_millis(1500));
        clock.set(Duration::from_secs(10));
        assert_eq!(handle.now(), Duration::from_secs(10));

        clock.sleep_until(Duration::from_secs(12));
        assert_eq!(handle.now(), Duration::from_secs(12));
        // Never goes backwards.
        clock.sleep_until(Duration::from_secs(1));
        assert_eq!(handle.now(), Duration::from_secs(12));
    }

    #[test]
    fn test_clocks_for_mode() {
        assert_eq!(Clocks::for_mode(TimerMode::Untimed, 300.0), Clocks::default());
        let timed = Clocks::for_mode(TimerMode::FiveMinutes, 300.0);
        assert_eq!(timed.remaining(Color::White), Some(300.0));
        assert_eq!(timed.remaining(Color::Black), Some(300.0));
    }

    #[test]
    fn test_charge_clamps_at_zero() {
        let mut clocks = Clocks { white: Some(1.0), black: Some(0.5) };
        assert!(!clocks.charge(Color::White, 0.25));
        assert_eq!(clocks.white, Some(0.75));
        assert!(clocks.charge(Color::Black, 1.0));
        assert_eq!(clocks.black, Some(0.0));
        assert!(clocks.is_expired(Color::Black));
    }

    #[test]
    fn test_untimed_never_expires() {
        let mut clocks = Clocks::default();
        assert!(!clocks.charge(Color::White, 10_000.0));
        assert!(!clocks.is_expired(Color::White));
        assert_eq!(clocks.white, None);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(Some(300.0)), "5:00.00");
        assert_eq!(format_clock(Some(299.5)), "4:59.50");
        assert_eq!(format_clock(Some(7.25)), "0:07.25");
        assert_eq!(format_clock(Some(0.0)), "0:00.00");
        assert_eq!(format_clock(None), "--:--");
    }

    #[test]
    fn test_timer_mode_parsing_and_serde() {
        assert_eq!("5min".parse::<TimerMode>(), Ok(TimerMode::FiveMinutes));
        assert_eq!("none".parse::<TimerMode>(), Ok(TimerMode::Untimed));
        assert!("blitz".parse::<TimerMode>().is_err());
        assert_eq!(serde_json::to_string(&TimerMode::FiveMinutes).unwrap(), "\"5min\"");
        let clocks: Clocks = serde_json::from_str(r#"{"white":null,"black":12.5}"#).unwrap();
        assert_eq!(clocks.white, None);
        assert_eq!(clocks.black, Some(12.5));
    }
}
