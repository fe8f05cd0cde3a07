use crate::error::CounterError;
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Temporal bucket size of the requested counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Day,
        Frequency::Week,
        Frequency::Month,
        Frequency::Year,
    ];

    /// Short code used on the command line.
    pub fn code(self) -> &'static str {
        match self {
            Frequency::Day => "D",
            Frequency::Week => "W",
            Frequency::Month => "M",
            Frequency::Year => "Y",
        }
    }

    /// ISO 8601 duration the counter site expects as `granularity`.
    pub fn granularity(self) -> &'static str {
        match self {
            Frequency::Day => "P1D",
            Frequency::Week => "P1W",
            Frequency::Month => "P1M",
            Frequency::Year => "P1Y",
        }
    }

    /// `end` moved back by one period. Months and years are calendar based.
    pub fn one_period_before(self, end: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Frequency::Day => end.checked_sub_signed(Duration::days(1)),
            Frequency::Week => end.checked_sub_signed(Duration::weeks(1)),
            Frequency::Month => end.checked_sub_months(Months::new(1)),
            Frequency::Year => end.checked_sub_months(Months::new(12)),
        }
    }
}

impl FromStr for Frequency {
    type Err = CounterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "d" | "day" | "daily" | "p1d" => Ok(Frequency::Day),
            "w" | "week" | "weekly" | "p1w" => Ok(Frequency::Week),
            "m" | "month" | "monthly" | "p1m" => Ok(Frequency::Month),
            "y" | "year" | "yearly" | "p1y" => Ok(Frequency::Year),
            _ => Err(CounterError::UnsupportedFrequency(s.to_string())),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
