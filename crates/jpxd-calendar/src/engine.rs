//! Calendar reconciliation.
//!
//! Takes any number of partial record streams (historical settlement tables,
//! published trading-day tables), merges them field-by-field per contract
//! month, derives whatever the sources left blank, and produces one sorted
//! calendar. Deterministic: the same inputs always yield a byte-identical
//! calendar. Any conflict or derivation failure aborts the whole rebuild;
//! a partially reconciled calendar is never published.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use tracing::info;

use crate::contract_month::{last_trading_day, ContractMonth};
use crate::holidays::{CalendarError, HolidaySet};
use crate::types::{Calendar, FormatError, PartialRecord, SQRecord};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Why a rebuild was aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Two sources supplied different non-null values for the same field on
    /// the same contract month. Ambiguous data is surfaced, never silently
    /// overwritten.
    FieldConflict {
        contract_month: String,
        field: &'static str,
        left: String,
        right: String,
    },
    /// A completed record violates the calendar's own guarantees (a day on
    /// a holiday, or last trading day not before the SQ day). Indicates bad
    /// source data.
    InvariantViolation {
        contract_month: String,
        detail: String,
    },
    /// A contract-month key could not be parsed.
    Format(FormatError),
    /// Holiday drift failed while deriving a missing day.
    Calendar(CalendarError),
}

impl From<FormatError> for ReconcileError {
    fn from(e: FormatError) -> Self {
        ReconcileError::Format(e)
    }
}

impl From<CalendarError> for ReconcileError {
    fn from(e: CalendarError) -> Self {
        ReconcileError::Calendar(e)
    }
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::FieldConflict {
                contract_month,
                field,
                left,
                right,
            } => write!(
                f,
                "conflicting values for {field} on {contract_month}: {left} vs {right}"
            ),
            ReconcileError::InvariantViolation {
                contract_month,
                detail,
            } => write!(f, "invalid record for {contract_month}: {detail}"),
            ReconcileError::Format(e) => write!(f, "{e}"),
            ReconcileError::Calendar(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReconcileError::Format(e) => Some(e),
            ReconcileError::Calendar(e) => Some(e),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MergedFields {
    special_quotation_day: Option<NaiveDate>,
    last_trading_day: Option<NaiveDate>,
    final_settlement_micros: Option<i64>,
}

/// A field present in any stream is kept if not already set; equal duplicates
/// are fine; two different non-null values are a conflict.
fn merge_field<T: PartialEq + ToString>(
    slot: &mut Option<T>,
    incoming: Option<T>,
    contract_month: &ContractMonth,
    field: &'static str,
) -> Result<(), ReconcileError> {
    let Some(incoming) = incoming else {
        return Ok(());
    };
    match slot {
        None => {
            *slot = Some(incoming);
            Ok(())
        }
        Some(existing) if *existing == incoming => Ok(()),
        Some(existing) => Err(ReconcileError::FieldConflict {
            contract_month: contract_month.to_string(),
            field,
            left: existing.to_string(),
            right: incoming.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Reconcile
// ---------------------------------------------------------------------------

/// Rebuild the canonical calendar from partial source streams.
///
/// 1. Union all streams keyed by parsed contract month, merging fields
///    (conflict = error, not last-writer-wins).
/// 2. Derive any missing SQ day from the contract month.
/// 3. Derive any missing last trading day from the SQ day.
/// 4. Drop weekly records with week index 2 (the exchange lists no
///    second-week mini contract in this product line).
/// 5. Records come out sorted by contract month, one per key.
pub fn reconcile<I, S>(streams: I, holidays: &HolidaySet) -> Result<Calendar, ReconcileError>
where
    I: IntoIterator<Item = S>,
    S: IntoIterator<Item = PartialRecord>,
{
    let mut merged: BTreeMap<ContractMonth, MergedFields> = BTreeMap::new();

    for stream in streams {
        for partial in stream {
            let contract_month: ContractMonth = partial.contract_month.parse()?;
            let fields = merged.entry(contract_month).or_default();
            merge_field(
                &mut fields.special_quotation_day,
                partial.special_quotation_day,
                &contract_month,
                "special_quotation_day",
            )?;
            merge_field(
                &mut fields.last_trading_day,
                partial.last_trading_day,
                &contract_month,
                "last_trading_day",
            )?;
            merge_field(
                &mut fields.final_settlement_micros,
                partial.final_settlement_micros,
                &contract_month,
                "final_settlement_micros",
            )?;
        }
    }

    let mut records: Vec<SQRecord> = Vec::with_capacity(merged.len());
    let mut derived_sq = 0usize;
    let mut derived_last = 0usize;
    let mut dropped_week2 = 0usize;

    for (contract_month, fields) in merged {
        let special_quotation_day = match fields.special_quotation_day {
            Some(day) => day,
            None => {
                derived_sq += 1;
                contract_month.sq_day(holidays)?
            }
        };
        let last = match fields.last_trading_day {
            Some(day) => day,
            None => {
                derived_last += 1;
                last_trading_day(special_quotation_day, holidays)?
            }
        };

        if contract_month.week() == Some(2) {
            dropped_week2 += 1;
            continue;
        }

        let record = SQRecord {
            contract_month,
            special_quotation_day,
            last_trading_day: last,
            final_settlement_micros: fields.final_settlement_micros,
        };
        validate_record(&record, holidays)?;
        records.push(record);
    }

    info!(
        records = records.len(),
        derived_sq, derived_last, dropped_week2, "calendar reconciled"
    );

    Ok(Calendar::from_sorted(records))
}

fn validate_record(record: &SQRecord, holidays: &HolidaySet) -> Result<(), ReconcileError> {
    let bad = |detail: String| ReconcileError::InvariantViolation {
        contract_month: record.contract_month.to_string(),
        detail,
    };
    if holidays.contains(record.special_quotation_day) {
        return Err(bad(format!(
            "special quotation day {} falls on a holiday",
            record.special_quotation_day
        )));
    }
    if holidays.contains(record.last_trading_day) {
        return Err(bad(format!(
            "last trading day {} falls on a holiday",
            record.last_trading_day
        )));
    }
    if record.last_trading_day >= record.special_quotation_day {
        return Err(bad(format!(
            "last trading day {} is not before special quotation day {}",
            record.last_trading_day, record.special_quotation_day
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
