//! Shared calendar record shapes and the settlement-price micros codec.
//!
//! Prices cross this boundary as decimal strings and live internally as
//! integer micros so no floating-point rounding is ever introduced; the
//! reconciler's conflict detection relies on exact equality.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::contract_month::ContractMonth;

/// Micros scale (1e-6) used for settlement prices.
pub const MICROS_SCALE: i64 = 1_000_000;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Malformed caller data detected at a parse boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Contract-month key does not match `YYYY-MM` or `YYYY-MM-W<n>`.
    MalformedKey { raw: String },
    /// Month component outside 1..=12.
    MonthOutOfRange { raw: String },
    /// Week index missing, zero, or not a plain positive integer.
    BadWeekIndex { raw: String },
    /// Settlement price string is empty.
    EmptyPrice,
    /// Settlement price string could not be parsed as a decimal number.
    InvalidPrice { raw: String },
    /// Settlement price has more than 6 decimal places (ambiguous micro
    /// conversion).
    TooManyDecimalPlaces { raw: String },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::MalformedKey { raw } => {
                write!(f, "contract month key not 'YYYY-MM' or 'YYYY-MM-W<n>': '{raw}'")
            }
            FormatError::MonthOutOfRange { raw } => {
                write!(f, "month must be 01..=12 in contract month key '{raw}'")
            }
            FormatError::BadWeekIndex { raw } => {
                write!(f, "week index must be a positive integer in contract month key '{raw}'")
            }
            FormatError::EmptyPrice => write!(f, "settlement price is empty"),
            FormatError::InvalidPrice { raw } => {
                write!(f, "settlement price could not be parsed: '{raw}'")
            }
            FormatError::TooManyDecimalPlaces { raw } => {
                write!(
                    f,
                    "settlement price has more than 6 decimal places \
                     (ambiguous micro conversion): '{raw}'"
                )
            }
        }
    }
}

impl std::error::Error for FormatError {}

// ---------------------------------------------------------------------------
// Price conversion
// ---------------------------------------------------------------------------

/// Convert a decimal settlement-price string to integer micros.
///
/// Rules:
/// - Accepts an optional leading `+` or `-`.
/// - Accepts an optional fractional part separated by `.`.
/// - Rejects more than 6 decimal places (would require rounding).
/// - Rejects empty strings, non-numeric characters, multiple `.` separators.
/// - No floating-point at any stage.
pub fn price_to_micros(s: &str) -> Result<i64, FormatError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(FormatError::EmptyPrice);
    }

    let (negative, digits) = if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    };

    let invalid = || FormatError::InvalidPrice { raw: s.to_string() };

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };

    let all_digits = |p: &str| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.is_empty() && !all_digits(int_part) {
        return Err(invalid());
    }
    if !frac_part.is_empty() && !all_digits(frac_part) {
        return Err(invalid());
    }
    if frac_part.len() > 6 {
        return Err(FormatError::TooManyDecimalPlaces { raw: s.to_string() });
    }

    let int_val: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse::<i64>().map_err(|_| invalid())?
    };

    let mut frac_padded = frac_part.to_string();
    while frac_padded.len() < 6 {
        frac_padded.push('0');
    }
    let frac_val: i64 = frac_padded.parse::<i64>().map_err(|_| invalid())?;

    let micros = int_val
        .checked_mul(MICROS_SCALE)
        .and_then(|v| v.checked_add(frac_val))
        .ok_or_else(invalid)?;

    Ok(if negative { -micros } else { micros })
}

/// Format integer micros back to the shortest decimal string that
/// [`price_to_micros`] maps to the same value.
pub fn micros_to_price(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let abs = micros.unsigned_abs();
    let int = abs / MICROS_SCALE as u64;
    let frac = abs % MICROS_SCALE as u64;
    if frac == 0 {
        return format!("{sign}{int}");
    }
    let mut frac_s = format!("{frac:06}");
    while frac_s.ends_with('0') {
        frac_s.pop();
    }
    format!("{sign}{int}.{frac_s}")
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One row of the canonical calendar.
///
/// Both days are always present and never fall on a holiday; the settlement
/// price is absent for contracts that have not settled yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SQRecord {
    pub contract_month: ContractMonth,
    pub special_quotation_day: NaiveDate,
    pub last_trading_day: NaiveDate,
    pub final_settlement_micros: Option<i64>,
}

impl SQRecord {
    /// Canonical textual key (`"YYYY-MM"` / `"YYYY-MM-W<n>"`).
    pub fn key(&self) -> String {
        self.contract_month.to_string()
    }

    /// Settlement price as a decimal string, if settled.
    pub fn final_settlement_price(&self) -> Option<String> {
        self.final_settlement_micros.map(micros_to_price)
    }
}

/// One row from one partial source, keyed by the raw contract-month string.
///
/// Historical settlement tables carry price (sometimes with the SQ day);
/// published trading-day tables carry SQ day + last trading day. The
/// reconciler owns turning any mix of these into [`SQRecord`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialRecord {
    pub contract_month: String,
    pub special_quotation_day: Option<NaiveDate>,
    pub last_trading_day: Option<NaiveDate>,
    pub final_settlement_micros: Option<i64>,
}

impl PartialRecord {
    pub fn new(contract_month: impl Into<String>) -> Self {
        Self {
            contract_month: contract_month.into(),
            special_quotation_day: None,
            last_trading_day: None,
            final_settlement_micros: None,
        }
    }

    /// Row shape of a historical settlement-price table.
    pub fn settlement(contract_month: impl Into<String>, micros: i64) -> Self {
        Self {
            final_settlement_micros: Some(micros),
            ..Self::new(contract_month)
        }
    }

    /// Row shape of a published trading-day table.
    pub fn trading_days(
        contract_month: impl Into<String>,
        special_quotation_day: NaiveDate,
        last_trading_day: NaiveDate,
    ) -> Self {
        Self {
            special_quotation_day: Some(special_quotation_day),
            last_trading_day: Some(last_trading_day),
            ..Self::new(contract_month)
        }
    }

    pub fn with_special_quotation_day(mut self, day: NaiveDate) -> Self {
        self.special_quotation_day = Some(day);
        self
    }
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// The canonical calendar: sorted by contract month, one record per key.
///
/// Only the reconciler constructs these; readers hold immutable snapshots
/// and a rebuild replaces the whole value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    records: Vec<SQRecord>,
}

impl Calendar {
    /// `records` must already be sorted by contract month with unique keys;
    /// the reconciler guarantees this.
    pub(crate) fn from_sorted(records: Vec<SQRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SQRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, contract_month: &ContractMonth) -> Option<&SQRecord> {
        self.records
            .binary_search_by(|r| r.contract_month.cmp(contract_month))
            .ok()
            .map(|i| &self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SQRecord> {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn micros_whole_number() {
        assert_eq!(price_to_micros("38500").unwrap(), 38_500_000_000);
    }

    #[test]
    fn micros_two_decimal_places() {
        assert_eq!(price_to_micros("38721.77").unwrap(), 38_721_770_000);
    }

    #[test]
    fn micros_six_decimal_places() {
        assert_eq!(price_to_micros("1.123456").unwrap(), 1_123_456);
    }

    #[test]
    fn micros_leading_dot_and_sign() {
        assert_eq!(price_to_micros(".5").unwrap(), 500_000);
        assert_eq!(price_to_micros("-1.5").unwrap(), -1_500_000);
        assert_eq!(price_to_micros("+2").unwrap(), 2_000_000);
    }

    #[test]
    fn micros_rejects_seven_decimal_places() {
        let err = price_to_micros("1.1234567").unwrap_err();
        assert!(matches!(err, FormatError::TooManyDecimalPlaces { .. }));
    }

    #[test]
    fn micros_rejects_garbage() {
        for raw in ["", "   ", "abc", "1.2.3", "12,500", "-", "."] {
            assert!(price_to_micros(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn price_round_trips_through_micros() {
        for raw in ["38721.77", "0.5", "40000", "1.123456", "-250.25"] {
            let micros = price_to_micros(raw).unwrap();
            assert_eq!(price_to_micros(&micros_to_price(micros)).unwrap(), micros);
        }
    }

    #[test]
    fn micros_to_price_trims_trailing_zeros() {
        assert_eq!(micros_to_price(38_721_770_000), "38721.77");
        assert_eq!(micros_to_price(38_500_000_000), "38500");
        assert_eq!(micros_to_price(0), "0");
        assert_eq!(micros_to_price(-1_500_000), "-1.5");
    }

    #[test]
    fn record_serializes_contract_month_as_key_string() {
        let record = SQRecord {
            contract_month: "2024-03".parse().unwrap(),
            special_quotation_day: NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
            last_trading_day: NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
            final_settlement_micros: Some(39_863_040_000),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["contract_month"], "2024-03");
        assert_eq!(json["special_quotation_day"], "2024-03-08");

        let back: SQRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.final_settlement_price().unwrap(), "39863.04");
    }

    #[test]
    fn partial_record_constructors_fill_expected_fields() {
        let settle = PartialRecord::settlement("2024-03", 39_863_040_000);
        assert_eq!(settle.final_settlement_micros, Some(39_863_040_000));
        assert!(settle.special_quotation_day.is_none());

        let sq = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let ltd = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let days = PartialRecord::trading_days("2024-03", sq, ltd);
        assert_eq!(days.special_quotation_day, Some(sq));
        assert_eq!(days.last_trading_day, Some(ltd));
        assert!(days.final_settlement_micros.is_none());
    }
}
