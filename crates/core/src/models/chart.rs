use serde::{Deserialize, Serialize};
use std::fmt;

use super::date_key::DateKey;

/// Which series the aggregation engine emits for a date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// One point per observed date
    #[default]
    Daily,
    /// One point per calendar day, each a trailing 30-day sum
    Rolling30,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Rolling30 => write!(f, "rolling30"),
        }
    }
}

/// A single display-ready data point for the daily and rolling series.
///
/// The core computes all the numbers — the rendering layer just draws them.
/// `None` means "not enough data to compute", never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPoint {
    /// The calendar date this point belongs to
    pub date: DateKey,

    /// `DD-MM-YYYY` label for the axis or table row
    pub label: String,

    /// Generation (daily) or trailing 30-day sum (rolling), in GWh
    pub units: Option<f64>,

    /// The comparable figure one year earlier
    pub prev_year_units: Option<f64>,

    /// Year-over-year growth, percent
    pub yoy_pct: Option<f64>,

    /// Month-over-month growth, percent. Only meaningful for monthly rollups,
    /// so always `None` in the daily and rolling series.
    pub mom_pct: Option<f64>,
}

/// One calendar month of generation with month-to-date-comparable growth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    /// `YYYY-MM`
    pub month: String,

    /// Sum of all observations in the month, GWh
    pub total_gwh: f64,

    /// Highest day-of-month with an observation; growth compares against days `1..=max_day`
    pub max_day: u32,

    pub yoy_pct: Option<f64>,

    pub mom_pct: Option<f64>,
}
