//! jpxd-calendar
//!
//! Trading-calendar core for JPX index derivatives:
//! - exchange holiday set + business-day drift
//! - contract-month model (monthly / weekly) with SQ-day derivation
//! - reconciliation of partial source records into one canonical calendar
//!
//! Deterministic, pure logic. No IO. No network calls. Callers supply the
//! holiday set and "now"; ingestion of holiday lists and published tables
//! lives outside this crate.

mod contract_month;
mod engine;
mod holidays;
mod types;

pub use contract_month::{last_trading_day, ContractMonth};
pub use engine::{reconcile, ReconcileError};
pub use holidays::{drift_trading_date, CalendarError, HolidaySet, MAX_DRIFT_STEPS};
pub use types::{
    micros_to_price, price_to_micros, Calendar, FormatError, PartialRecord, SQRecord, MICROS_SCALE,
};
