use serde::{Deserialize, Serialize};

use super::chart::Frequency;
use super::date_key::DateKey;

/// Shortest default window the engine will resolve, in days.
pub const MIN_RANGE_DAYS: u32 = 7;

/// Longest default window the engine will resolve, in days (10 years).
pub const MAX_RANGE_DAYS: u32 = 3650;

/// Default window length when none is configured.
pub const DEFAULT_RANGE_DAYS: u32 = 365;

/// Clamp a window length into `[MIN_RANGE_DAYS, MAX_RANGE_DAYS]`.
pub fn clamp_range_days(days: u32) -> u32 {
    days.clamp(MIN_RANGE_DAYS, MAX_RANGE_DAYS)
}

/// User-configurable query defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Window length used when a query gives no `from` date.
    pub default_range_days: u32,

    /// Series emitted when a query gives no frequency.
    pub default_frequency: Frequency,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_range_days: DEFAULT_RANGE_DAYS,
            default_frequency: Frequency::Daily,
        }
    }
}

/// Parameters of one aggregation request.
///
/// `from` and `to` are optional: `to` falls back to the latest observed date and
/// `from` to `to - range_days`. Reversed bounds are swapped, never rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationQuery {
    pub from: Option<DateKey>,
    pub to: Option<DateKey>,
    pub range_days: u32,
    pub frequency: Frequency,
}

impl AggregationQuery {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            from: None,
            to: None,
            range_days: DEFAULT_RANGE_DAYS,
            frequency,
        }
    }

    pub fn daily() -> Self {
        Self::new(Frequency::Daily)
    }

    pub fn rolling30() -> Self {
        Self::new(Frequency::Rolling30)
    }

    /// Query carrying the window length and series from `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            range_days: settings.default_range_days,
            ..Self::new(settings.default_frequency)
        }
    }

    #[must_use]
    pub fn from(mut self, from: DateKey) -> Self {
        self.from = Some(from);
        self
    }

    #[must_use]
    pub fn to(mut self, to: DateKey) -> Self {
        self.to = Some(to);
        self
    }

    #[must_use]
    pub fn range_days(mut self, days: u32) -> Self {
        self.range_days = days;
        self
    }

    /// Window length after clamping.
    pub fn effective_range_days(&self) -> u32 {
        clamp_range_days(self.range_days)
    }
}

impl Default for AggregationQuery {
    fn default() -> Self {
        Self::daily()
    }
}
