use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

/// Placeholder returned by [`format_display`] for input that is not a valid ISO date.
pub const UNKNOWN_DATE: &str = "unknown";

/// A calendar date with no time-of-day or zone component.
///
/// Always holds a real Gregorian date, so every key accepted into the store
/// round-trips exactly through its ISO form (`YYYY-MM-DD`). Ordering is
/// calendar order, which is also the lexicographic order of the ISO strings.
///
/// Two text shapes exist at the boundary:
/// - ISO `YYYY-MM-DD` — canonical key, used for persistence
/// - display `DD-MM-YYYY` — used for human input and CSV output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Build a key from a `(year, month, day)` triple, rejecting impossible dates
    /// such as 31 April or 29 February in a non-leap year.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, CoreError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| CoreError::InvalidFormat(format!("{year:04}-{month:02}-{day:02}")))
    }

    /// Today's date on the UTC calendar.
    pub fn today() -> Self {
        Self(chrono::Utc::now().date_naive())
    }

    /// Parse a `DD-MM-YYYY` string.
    pub fn parse_display(s: &str) -> Result<Self, CoreError> {
        let (day, month, year) = numeric_fields(s, [2, 2, 4])
            .ok_or_else(|| CoreError::InvalidFormat(s.to_string()))?;
        Self::checked(year, month, day, s)
    }

    /// Parse a `YYYY-MM-DD` string.
    pub fn parse_iso(s: &str) -> Result<Self, CoreError> {
        let (year, month, day) = numeric_fields(s, [4, 2, 2])
            .ok_or_else(|| CoreError::InvalidFormat(s.to_string()))?;
        Self::checked(year, month, day, s)
    }

    /// Parse either shape: display first, then ISO. Surrounding whitespace is ignored.
    pub fn parse_flexible(s: &str) -> Result<Self, CoreError> {
        let trimmed = s.trim();
        Self::parse_display(trimmed)
            .or_else(|_| Self::parse_iso(trimmed))
            .map_err(|_| CoreError::InvalidFormat(s.to_string()))
    }

    fn checked(year: u32, month: u32, day: u32, raw: &str) -> Result<Self, CoreError> {
        let year = i32::try_from(year).map_err(|_| CoreError::InvalidFormat(raw.to_string()))?;
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| CoreError::InvalidFormat(raw.to_string()))
    }

    /// ISO `YYYY-MM-DD` form.
    pub fn to_iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// Display `DD-MM-YYYY` form.
    pub fn to_display(&self) -> String {
        self.0.format("%d-%m-%Y").to_string()
    }

    /// Calendar month bucket, `YYYY-MM`.
    pub fn month_key(&self) -> String {
        self.0.format("%Y-%m").to_string()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn as_naive_date(&self) -> NaiveDate {
        self.0
    }

    /// Move `n` calendar days forward (negative `n` moves backward).
    /// Saturates at the edges of the representable calendar.
    pub fn add_days(&self, n: i64) -> Self {
        let days = Days::new(n.unsigned_abs());
        let moved = if n >= 0 {
            self.0.checked_add_days(days).unwrap_or(NaiveDate::MAX)
        } else {
            self.0.checked_sub_days(days).unwrap_or(NaiveDate::MIN)
        };
        Self(moved)
    }

    /// Move `n` calendar days backward (negative `n` moves forward).
    pub fn sub_days(&self, n: i64) -> Self {
        self.add_days(n.saturating_neg())
    }

    /// Number of calendar days from `other` to `self`.
    pub fn days_since(&self, other: DateKey) -> i64 {
        (self.0 - other.0).num_days()
    }

    /// Same month and day one year earlier.
    ///
    /// This is a plain year substitution, not a 365/366-day offset: 29 February
    /// has no counterpart in a non-leap prior year and yields `None`.
    pub fn same_calendar_day_prior_year(&self) -> Option<Self> {
        NaiveDate::from_ymd_opt(self.0.year() - 1, self.0.month(), self.0.day()).map(Self)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_flexible(s)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl TryFrom<String> for DateKey {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse_iso(&s)
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.to_iso()
    }
}

/// Convert an ISO date string to `DD-MM-YYYY`.
///
/// Never fails: malformed input yields [`UNKNOWN_DATE`].
pub fn format_display(iso: &str) -> String {
    DateKey::parse_iso(iso)
        .map(|key| key.to_display())
        .unwrap_or_else(|_| UNKNOWN_DATE.to_string())
}

/// Split `s` on `-` into exactly three all-digit fields of the given widths.
fn numeric_fields(s: &str, widths: [usize; 3]) -> Option<(u32, u32, u32)> {
    let mut parts = s.split('-');
    let mut values = [0u32; 3];
    for (slot, width) in values.iter_mut().zip(widths) {
        let part = parts.next()?;
        if part.len() != width || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = part.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some((values[0], values[1], values[2]))
}
