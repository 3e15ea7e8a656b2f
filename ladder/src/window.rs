//! Time windows and award selection.

use crate::types::AwardedEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub const HOUR_MS: i64 = 60 * 60 * 1000;
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Recency filter applied to award inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Window {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[default]
    #[serde(rename = "all")]
    AllTime,
}

impl Window {
    pub const ALL: [Window; 4] = [Window::Day, Window::Week, Window::Month, Window::AllTime];

    /// Strict, case-insensitive parse.
    pub fn parse(s: &str) -> Option<Window> {
        match s.to_ascii_lowercase().as_str() {
            "24h" => Some(Window::Day),
            "7d" => Some(Window::Week),
            "30d" => Some(Window::Month),
            "all" => Some(Window::AllTime),
            _ => None,
        }
    }

    /// Request-boundary parse: anything absent or unrecognized means all-time.
    pub fn normalize(raw: Option<&str>) -> Window {
        raw.and_then(Window::parse).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Window::Day => "24h",
            Window::Week => "7d",
            Window::Month => "30d",
            Window::AllTime => "all",
        }
    }

    /// Window length in milliseconds, `None` when unbounded.
    pub fn duration_ms(&self) -> Option<i64> {
        match self {
            Window::Day => Some(DAY_MS),
            Window::Week => Some(7 * DAY_MS),
            Window::Month => Some(30 * DAY_MS),
            Window::AllTime => None,
        }
    }

    /// Inclusive lower bound for award start times.
    pub fn since(&self, now: i64) -> Option<i64> {
        self.duration_ms().map(|d| now.saturating_sub(d))
    }

    /// Whether an award that first occurred at `started_at` counts.
    pub fn includes(&self, started_at: i64, now: i64) -> bool {
        match self.since(now) {
            Some(since) => started_at >= since,
            None => true,
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keep the awards that count toward `window`.
///
/// `awards` must already be deduplicated over the entire history. Filtering
/// raw events first would let an in-window replay stand in for a first play
/// that predates the window.
pub fn select_window(awards: &[AwardedEvent], window: Window, now: i64) -> Vec<&AwardedEvent> {
    awards
        .iter()
        .filter(|award| window.includes(award.started_at(), now))
        .collect()
}

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
