//! jpxd-session
//!
//! Trading-session state machine for the two-phase (day/night) trading day:
//! - named time-of-day windows, one of which straddles midnight
//! - five-phase classification of a wall-clock time
//! - next closing-auction deadline, including the overnight rollover
//!
//! Pure functions of the schedule and a caller-supplied "now". No clock
//! reads inside the crate; the embedder decides what "now" means.

mod classifier;
mod schedule;

pub use classifier::{classify, closing_deadline, TradingPhase};
pub use schedule::{parse_time_of_day, FormatError, SessionSchedule, SessionWindow};
