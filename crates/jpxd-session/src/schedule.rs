//! Session schedule: four named time-of-day windows over one trading cycle.
//!
//! Windows are validated once when the schedule is built; classification
//! afterwards has no error path. A window whose start is later than its end
//! is active across midnight (the night session); the three auction/day
//! windows must stay inside a single calendar day.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Malformed schedule configuration, raised at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A time-of-day string was not `HH:MM`.
    BadTimeOfDay { raw: String },
    /// A window that must stay within one day starts at or after its end.
    ReversedWindow { window: &'static str },
    /// The night window must cross midnight (start later than end).
    NightWindowMustCrossMidnight,
    /// Two windows overlap on the 24-hour cycle, leaving classification
    /// ambiguous.
    OverlappingWindows {
        first: &'static str,
        second: &'static str,
    },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::BadTimeOfDay { raw } => {
                write!(f, "time of day not 'HH:MM': '{raw}'")
            }
            FormatError::ReversedWindow { window } => {
                write!(f, "window '{window}' must start before it ends")
            }
            FormatError::NightWindowMustCrossMidnight => {
                write!(f, "window 'night' must cross midnight (start after end)")
            }
            FormatError::OverlappingWindows { first, second } => {
                write!(f, "windows '{first}' and '{second}' overlap")
            }
        }
    }
}

impl std::error::Error for FormatError {}

// ---------------------------------------------------------------------------
// Time-of-day parsing
// ---------------------------------------------------------------------------

/// Parse a wall-clock `HH:MM` string (`"8:45"` and `"08:45"` both accepted).
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, FormatError> {
    let bad = || FormatError::BadTimeOfDay {
        raw: raw.to_string(),
    };
    let (hour_part, minute_part) = raw.trim().split_once(':').ok_or_else(bad)?;
    let digits = |p: &str| !p.is_empty() && p.len() <= 2 && p.chars().all(|c| c.is_ascii_digit());
    if !digits(hour_part) || minute_part.len() != 2 || !minute_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad());
    }
    let hour: u32 = hour_part.parse().map_err(|_| bad())?;
    let minute: u32 = minute_part.parse().map_err(|_| bad())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(bad)
}

// ---------------------------------------------------------------------------
// Session window
// ---------------------------------------------------------------------------

/// One named phase: `[start, end)` on the wall clock. `start > end` means
/// the window wraps the day boundary and is active from `start` until `end`
/// on the following day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SessionWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn from_hhmm(start: &str, end: &str) -> Result<Self, FormatError> {
        Ok(Self::new(parse_time_of_day(start)?, parse_time_of_day(end)?))
    }

    pub fn crosses_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Half-open membership; wrapping windows test `t >= start || t < end`.
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.crosses_midnight() {
            t >= self.start || t < self.end
        } else {
            self.start <= t && t < self.end
        }
    }

    /// Active spans as second-of-day intervals, split at midnight for
    /// wrapping windows.
    fn spans(&self) -> [(u32, u32); 2] {
        let s = self.start.num_seconds_from_midnight();
        let e = self.end.num_seconds_from_midnight();
        if self.crosses_midnight() {
            [(s, SECONDS_PER_DAY), (0, e)]
        } else {
            [(s, e), (0, 0)]
        }
    }
}

fn windows_overlap(a: &SessionWindow, b: &SessionWindow) -> bool {
    a.spans().iter().any(|&(a0, a1)| {
        b.spans()
            .iter()
            .any(|&(b0, b1)| a0 < b1 && b0 < a1)
    })
}

// ---------------------------------------------------------------------------
// Session schedule
// ---------------------------------------------------------------------------

/// One trading cycle: day session, day closing auction, overnight session,
/// night closing auction. Any time the four windows leave uncovered is
/// off-hours.
#[derive(Debug, Clone)]
pub struct SessionSchedule {
    pub timezone: Tz,
    pub day: SessionWindow,
    pub day_closing: SessionWindow,
    pub night: SessionWindow,
    pub night_closing: SessionWindow,
}

impl SessionSchedule {
    /// Build and validate a schedule. `day`, `day_closing` and
    /// `night_closing` must start before they end; `night` must cross
    /// midnight; no two windows may overlap on the 24-hour cycle.
    pub fn new(
        timezone: Tz,
        day: SessionWindow,
        day_closing: SessionWindow,
        night: SessionWindow,
        night_closing: SessionWindow,
    ) -> Result<Self, FormatError> {
        for (name, window) in [
            ("day", &day),
            ("day_closing", &day_closing),
            ("night_closing", &night_closing),
        ] {
            if window.start >= window.end {
                return Err(FormatError::ReversedWindow { window: name });
            }
        }
        if !night.crosses_midnight() {
            return Err(FormatError::NightWindowMustCrossMidnight);
        }

        let named = [
            ("day", &day),
            ("day_closing", &day_closing),
            ("night", &night),
            ("night_closing", &night_closing),
        ];
        for (i, (first, a)) in named.iter().copied().enumerate() {
            for (second, b) in named.iter().copied().skip(i + 1) {
                if windows_overlap(a, b) {
                    return Err(FormatError::OverlappingWindows { first, second });
                }
            }
        }

        Ok(Self {
            timezone,
            day,
            day_closing,
            night,
            night_closing,
        })
    }

    /// Exchange-local wall clock for an instant.
    pub fn local_datetime(&self, at: DateTime<Utc>) -> NaiveDateTime {
        at.with_timezone(&self.timezone).naive_local()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        parse_time_of_day(s).unwrap()
    }

    fn jpx_schedule() -> SessionSchedule {
        SessionSchedule::new(
            chrono_tz::Asia::Tokyo,
            SessionWindow::from_hhmm("8:45", "15:40").unwrap(),
            SessionWindow::from_hhmm("15:40", "15:45").unwrap(),
            SessionWindow::from_hhmm("17:00", "5:55").unwrap(),
            SessionWindow::from_hhmm("5:55", "6:00").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn parses_hhmm_with_and_without_leading_zero() {
        assert_eq!(t("8:45"), NaiveTime::from_hms_opt(8, 45, 0).unwrap());
        assert_eq!(t("08:45"), NaiveTime::from_hms_opt(8, 45, 0).unwrap());
        assert_eq!(t("23:59"), NaiveTime::from_hms_opt(23, 59, 0).unwrap());
    }

    #[test]
    fn rejects_malformed_time_strings() {
        for raw in ["", "845", "8:5", "8:456", "24:00", "12:60", "a:30", ":30", "12:", "12:3a"] {
            assert!(parse_time_of_day(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn window_membership_is_half_open() {
        let day = SessionWindow::from_hhmm("8:45", "15:40").unwrap();
        assert!(day.contains(t("8:45")));
        assert!(day.contains(t("15:39")));
        assert!(!day.contains(t("15:40")));
        assert!(!day.contains(t("8:44")));
    }

    #[test]
    fn wrapping_window_is_active_on_both_sides_of_midnight() {
        let night = SessionWindow::from_hhmm("17:00", "5:55").unwrap();
        assert!(night.crosses_midnight());
        assert!(night.contains(t("17:00")));
        assert!(night.contains(t("23:59")));
        assert!(night.contains(t("0:00")));
        assert!(night.contains(t("3:00")));
        assert!(!night.contains(t("5:55")));
        assert!(!night.contains(t("12:00")));
    }

    #[test]
    fn jpx_shaped_schedule_validates() {
        jpx_schedule();
    }

    #[test]
    fn reversed_day_window_is_rejected() {
        let err = SessionSchedule::new(
            chrono_tz::Asia::Tokyo,
            SessionWindow::from_hhmm("15:40", "8:45").unwrap(),
            SessionWindow::from_hhmm("15:40", "15:45").unwrap(),
            SessionWindow::from_hhmm("17:00", "5:55").unwrap(),
            SessionWindow::from_hhmm("5:55", "6:00").unwrap(),
        )
        .unwrap_err();
        assert_eq!(err, FormatError::ReversedWindow { window: "day" });
    }

    #[test]
    fn night_window_must_cross_midnight() {
        let err = SessionSchedule::new(
            chrono_tz::Asia::Tokyo,
            SessionWindow::from_hhmm("8:45", "15:40").unwrap(),
            SessionWindow::from_hhmm("15:40", "15:45").unwrap(),
            SessionWindow::from_hhmm("17:00", "23:00").unwrap(),
            SessionWindow::from_hhmm("23:00", "23:30").unwrap(),
        )
        .unwrap_err();
        assert_eq!(err, FormatError::NightWindowMustCrossMidnight);
    }

    #[test]
    fn overlapping_windows_are_rejected() {
        // Night runs until 6:30 while night closing starts at 5:55.
        let err = SessionSchedule::new(
            chrono_tz::Asia::Tokyo,
            SessionWindow::from_hhmm("8:45", "15:40").unwrap(),
            SessionWindow::from_hhmm("15:40", "15:45").unwrap(),
            SessionWindow::from_hhmm("17:00", "6:30").unwrap(),
            SessionWindow::from_hhmm("5:55", "6:00").unwrap(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            FormatError::OverlappingWindows {
                first: "night",
                second: "night_closing"
            }
        );
    }

    #[test]
    fn local_datetime_converts_to_exchange_wall_clock() {
        let schedule = jpx_schedule();
        // 23:00 UTC is 08:00 the next day in Tokyo.
        let at = DateTime::parse_from_rfc3339("2024-01-09T23:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let local = schedule.local_datetime(at);
        assert_eq!(local.to_string(), "2024-01-10 08:00:00");
    }
}
