//! Exchange holiday set and business-day drift.
//!
//! The holiday set is plain data handed in by the caller (public holidays
//! plus exchange-specific non-trading days such as year-end/year-start).
//! It is built once and read-only afterwards; refreshing it is the job of
//! whatever ingested it.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upper bound on the backward walk in [`drift_trading_date`].
///
/// Roughly one calendar week of consecutive holidays is the most the
/// exchange calendar ever produces; a longer run means the holiday data is
/// malformed and the search must fail instead of walking into the past.
pub const MAX_DRIFT_STEPS: u32 = 7;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Calendar arithmetic failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// The drift search stepped [`MAX_DRIFT_STEPS`] days back from `start`
    /// without leaving the holiday set.
    HolidayRunTooLong { start: NaiveDate, max_steps: u32 },
    /// Date arithmetic left the representable calendar range.
    DateOutOfRange { year: i32, month: u32 },
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarError::HolidayRunTooLong { start, max_steps } => write!(
                f,
                "no trading day within {max_steps} days before {start}: holiday data is malformed"
            ),
            CalendarError::DateOutOfRange { year, month } => {
                write!(f, "date arithmetic out of range for {year:04}-{month:02}")
            }
        }
    }
}

impl std::error::Error for CalendarError {}

// ---------------------------------------------------------------------------
// Holiday set
// ---------------------------------------------------------------------------

/// Ordered, de-duplicated set of non-trading dates.
///
/// Membership is O(log n). Calendar dates only, never timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidaySet {
    dates: BTreeSet<NaiveDate>,
}

impl HolidaySet {
    /// Build from any sequence of dates; duplicates collapse, order is
    /// irrelevant.
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Dates in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }
}

impl FromIterator<NaiveDate> for HolidaySet {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self::new(iter)
    }
}

// ---------------------------------------------------------------------------
// Business-day drift
// ---------------------------------------------------------------------------

/// Shift `date` backward to the nearest date outside the holiday set.
///
/// A non-holiday comes back unchanged. A holiday walks back one calendar
/// day at a time, at most [`MAX_DRIFT_STEPS`] steps; exceeding the bound is
/// [`CalendarError::HolidayRunTooLong`], never an infinite loop and never a
/// silently returned holiday.
pub fn drift_trading_date(date: NaiveDate, holidays: &HolidaySet) -> Result<NaiveDate, CalendarError> {
    if !holidays.contains(date) {
        return Ok(date);
    }

    let mut cursor = date;
    for _ in 0..MAX_DRIFT_STEPS {
        cursor = match cursor.pred_opt() {
            Some(d) => d,
            None => break,
        };
        if !holidays.contains(cursor) {
            return Ok(cursor);
        }
    }

    Err(CalendarError::HolidayRunTooLong {
        start: date,
        max_steps: MAX_DRIFT_STEPS,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
