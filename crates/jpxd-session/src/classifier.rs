//! Phase classification and closing-auction deadlines.
//!
//! Classification is a pure function of the wall-clock time of day; the
//! date only matters when a deadline has to land on a concrete timestamp.
//! The night session straddles midnight, so its deadline cannot use the
//! naive "today, else tomorrow" rule: late-evening times already belong
//! to a cycle whose closing auction ends on the following date.

use std::fmt;

use chrono::{NaiveDateTime, NaiveTime};

use crate::schedule::SessionSchedule;

// ---------------------------------------------------------------------------
// Trading phase
// ---------------------------------------------------------------------------

/// Market state at a given wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradingPhase {
    Day,
    DayClosing,
    Night,
    NightClosing,
    OffHours,
}

impl TradingPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradingPhase::Day => "DAY",
            TradingPhase::DayClosing => "DAY_CLOSING",
            TradingPhase::Night => "NIGHT",
            TradingPhase::NightClosing => "NIGHT_CLOSING",
            TradingPhase::OffHours => "OFF_HOURS",
        }
    }

    /// True while continuous trading or a closing auction is running.
    pub fn is_trading(&self) -> bool {
        !matches!(self, TradingPhase::OffHours)
    }
}

impl fmt::Display for TradingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify a wall-clock time of day. Windows are tested in cycle order:
/// day, day closing, night (midnight-crossing), night closing; anything
/// left is off-hours.
pub fn classify(schedule: &SessionSchedule, time_of_day: NaiveTime) -> TradingPhase {
    if schedule.day.contains(time_of_day) {
        TradingPhase::Day
    } else if schedule.day_closing.contains(time_of_day) {
        TradingPhase::DayClosing
    } else if schedule.night.contains(time_of_day) {
        TradingPhase::Night
    } else if schedule.night_closing.contains(time_of_day) {
        TradingPhase::NightClosing
    } else {
        TradingPhase::OffHours
    }
}

// ---------------------------------------------------------------------------
// Closing deadline
// ---------------------------------------------------------------------------

/// End of the closing auction that terminates the session `now` belongs to,
/// or `None` outside trading hours. Never a timestamp in the past.
pub fn closing_deadline(schedule: &SessionSchedule, now: NaiveDateTime) -> Option<NaiveDateTime> {
    match classify(schedule, now.time()) {
        TradingPhase::Day | TradingPhase::DayClosing => {
            end_today_or_next(now, schedule.day_closing.end)
        }
        TradingPhase::Night => {
            if now.time() >= schedule.night_closing.start {
                // Evening side of the overnight window: the auction that
                // closes this session runs on the following date.
                Some(now.date().succ_opt()?.and_time(schedule.night_closing.end))
            } else {
                end_today_or_next(now, schedule.night_closing.end)
            }
        }
        TradingPhase::NightClosing => end_today_or_next(now, schedule.night_closing.end),
        TradingPhase::OffHours => None,
    }
}

/// `end` on `now`'s date, pushed one day forward when that instant has
/// already passed (guards a `now` exactly at the auction end).
fn end_today_or_next(now: NaiveDateTime, end: NaiveTime) -> Option<NaiveDateTime> {
    let candidate = now.date().and_time(end);
    if candidate <= now {
        Some(now.date().succ_opt()?.and_time(end))
    } else {
        Some(candidate)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
