//! Leaderboard query and request-parameter normalization.
//!
//! Malformed parameters are never errors: each one falls back to its
//! default. Integers parse like a lenient `parseInt` (optional sign, then
//! the leading run of digits; `"12abc"` is 12, `"abc"` is invalid).

use crate::rank::{PageRequest, DEFAULT_LIMIT, MAX_LIMIT};
use crate::window::Window;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LeaderboardQuery {
    pub window: Window,
    pub page: PageRequest,
    /// Whose self rank to resolve, if anyone's.
    pub user_id: Option<String>,
}

impl LeaderboardQuery {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            ..Default::default()
        }
    }

    pub fn with_page(mut self, limit: usize, offset: usize) -> Self {
        self.page = PageRequest::new(limit, offset);
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Build a query from raw request parameters.
    pub fn from_params(
        window: Option<&str>,
        limit: Option<&str>,
        offset: Option<&str>,
        user_id: Option<&str>,
    ) -> Self {
        Self {
            window: Window::normalize(window),
            page: PageRequest::new(parse_limit(limit), parse_offset(offset)),
            user_id: user_id.filter(|id| !id.is_empty()).map(str::to_string),
        }
    }
}

/// Positive integers are clamped to `MAX_LIMIT`; anything else is the default.
pub fn parse_limit(raw: Option<&str>) -> usize {
    match raw.and_then(parse_int_prefix) {
        Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX).min(MAX_LIMIT),
        _ => DEFAULT_LIMIT,
    }
}

/// Non-negative integers are kept; anything else is 0.
pub fn parse_offset(raw: Option<&str>) -> usize {
    match raw.and_then(parse_int_prefix) {
        Some(n) if n >= 0 => usize::try_from(n).unwrap_or(usize::MAX),
        _ => 0,
    }
}

/// Leading integer of `s`, saturating at the `i64` bounds.
fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    let mut seen = false;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        seen = true;
        let d = i64::from(b - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(d)
        } else {
            value.saturating_mul(10).saturating_add(d)
        };
    }

    seen.then_some(value)
}
