//! Contract-month model: monthly and weekly expiry cycles.
//!
//! Keys are parsed exactly once at the boundary into the tagged variant;
//! nothing downstream string-matches. `Display` and `FromStr` are exact
//! inverses of each other.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::holidays::{drift_trading_date, CalendarError, HolidaySet};
use crate::types::FormatError;

// ---------------------------------------------------------------------------
// Contract month
// ---------------------------------------------------------------------------

/// A derivatives expiry cycle: a plain monthly contract (`"YYYY-MM"`) or a
/// week-indexed mini contract (`"YYYY-MM-W<n>"`, week ≥ 1, Friday-anchored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractMonth {
    Monthly { year: i32, month: u32 },
    Weekly { year: i32, month: u32, week: u32 },
}

impl ContractMonth {
    pub fn year(&self) -> i32 {
        match self {
            ContractMonth::Monthly { year, .. } | ContractMonth::Weekly { year, .. } => *year,
        }
    }

    pub fn month(&self) -> u32 {
        match self {
            ContractMonth::Monthly { month, .. } | ContractMonth::Weekly { month, .. } => *month,
        }
    }

    /// Week index for weekly contracts, `None` for monthly.
    pub fn week(&self) -> Option<u32> {
        match self {
            ContractMonth::Monthly { .. } => None,
            ContractMonth::Weekly { week, .. } => Some(*week),
        }
    }

    pub fn is_weekly(&self) -> bool {
        matches!(self, ContractMonth::Weekly { .. })
    }

    /// Special Quotation Day for this cycle, holiday-adjusted.
    ///
    /// Monthly: the second Friday of the month. Weekly: first Friday of the
    /// month plus `7 * (week - 1)` days, literally the first-Friday anchor
    /// shifted by whole weeks, not "the n-th Friday by counting Fridays".
    /// The raw candidate then drifts backward off any holiday.
    pub fn sq_day(&self, holidays: &HolidaySet) -> Result<NaiveDate, CalendarError> {
        let out_of_range = || CalendarError::DateOutOfRange {
            year: self.year(),
            month: self.month(),
        };
        let anchor = first_friday(self.year(), self.month()).ok_or_else(out_of_range)?;
        let offset_weeks = match self {
            ContractMonth::Monthly { .. } => 1,
            ContractMonth::Weekly { week, .. } => week.saturating_sub(1),
        };
        let candidate = anchor
            .checked_add_days(Days::new(u64::from(offset_weeks) * 7))
            .ok_or_else(out_of_range)?;
        drift_trading_date(candidate, holidays)
    }
}

/// First Friday on or after the first day of the month.
fn first_friday(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset =
        (Weekday::Fri.num_days_from_monday() + 7 - first.weekday().num_days_from_monday()) % 7;
    first.checked_add_days(Days::new(u64::from(offset)))
}

/// Last Trading Day for a contract whose SQ day is known: one calendar day
/// earlier, holiday-adjusted the same way.
pub fn last_trading_day(sq_day: NaiveDate, holidays: &HolidaySet) -> Result<NaiveDate, CalendarError> {
    let candidate = sq_day.pred_opt().ok_or(CalendarError::DateOutOfRange {
        year: sq_day.year(),
        month: sq_day.month(),
    })?;
    drift_trading_date(candidate, holidays)
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

impl Ord for ContractMonth {
    /// Year, then month, then Monthly before any Weekly of the same month,
    /// then Weekly by week ascending. Coincides with lexicographic order of
    /// the canonical keys.
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year(), self.month())
            .cmp(&(other.year(), other.month()))
            .then_with(|| match (self, other) {
                (ContractMonth::Monthly { .. }, ContractMonth::Monthly { .. }) => Ordering::Equal,
                (ContractMonth::Monthly { .. }, ContractMonth::Weekly { .. }) => Ordering::Less,
                (ContractMonth::Weekly { .. }, ContractMonth::Monthly { .. }) => Ordering::Greater,
                (
                    ContractMonth::Weekly { week: a, .. },
                    ContractMonth::Weekly { week: b, .. },
                ) => a.cmp(b),
            })
    }
}

impl PartialOrd for ContractMonth {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// Key formatting / parsing
// ---------------------------------------------------------------------------

impl fmt::Display for ContractMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractMonth::Monthly { year, month } => write!(f, "{year:04}-{month:02}"),
            ContractMonth::Weekly { year, month, week } => {
                write!(f, "{year:04}-{month:02}-W{week}")
            }
        }
    }
}

impl FromStr for ContractMonth {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || FormatError::MalformedKey { raw: s.to_string() };

        let mut parts = s.split('-');
        let year_part = parts.next().ok_or_else(malformed)?;
        let month_part = parts.next().ok_or_else(malformed)?;
        let week_part = parts.next();
        if parts.next().is_some() {
            return Err(malformed());
        }

        let all_digits = |p: &str| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit());
        if year_part.len() != 4 || !all_digits(year_part) {
            return Err(malformed());
        }
        if month_part.len() != 2 || !all_digits(month_part) {
            return Err(malformed());
        }
        let year: i32 = year_part.parse().map_err(|_| malformed())?;
        let month: u32 = month_part.parse().map_err(|_| malformed())?;
        if !(1..=12).contains(&month) {
            return Err(FormatError::MonthOutOfRange { raw: s.to_string() });
        }

        match week_part {
            None => Ok(ContractMonth::Monthly { year, month }),
            Some(w) => {
                let digits = w
                    .strip_prefix('W')
                    .ok_or_else(malformed)?;
                // No leading zeros: the key must round-trip byte-identically.
                if !all_digits(digits) || (digits.len() > 1 && digits.starts_with('0')) {
                    return Err(FormatError::BadWeekIndex { raw: s.to_string() });
                }
                let week: u32 = digits
                    .parse()
                    .map_err(|_| FormatError::BadWeekIndex { raw: s.to_string() })?;
                if week == 0 {
                    return Err(FormatError::BadWeekIndex { raw: s.to_string() });
                }
                Ok(ContractMonth::Weekly { year, month, week })
            }
        }
    }
}

impl Serialize for ContractMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContractMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
