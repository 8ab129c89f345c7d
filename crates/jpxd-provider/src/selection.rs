//! Upcoming-contract selection and the shared calendar snapshot cell.

use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::NaiveDate;
use tracing::debug;

use jpxd_calendar::{Calendar, ContractMonth, SQRecord};

use crate::provider::ProviderError;

// ---------------------------------------------------------------------------
// Contract frequency
// ---------------------------------------------------------------------------

/// Which expiry cycle a caller trades: plain monthly contracts or the
/// week-indexed minis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractFrequency {
    Monthly,
    Weekly,
}

impl ContractFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractFrequency::Monthly => "monthly",
            ContractFrequency::Weekly => "weekly",
        }
    }

    pub fn matches(&self, contract_month: &ContractMonth) -> bool {
        match self {
            ContractFrequency::Monthly => !contract_month.is_weekly(),
            ContractFrequency::Weekly => contract_month.is_weekly(),
        }
    }
}

impl FromStr for ContractFrequency {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(ContractFrequency::Monthly),
            "weekly" => Ok(ContractFrequency::Weekly),
            other => Err(ProviderError::UnknownFrequency {
                raw: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// What a caller wants out of the calendar: the next `product_count`
/// contracts of one frequency whose SQ day is strictly after `as_of`.
/// `as_of` is always supplied by the caller, never read from a clock here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionCriteria {
    pub as_of: NaiveDate,
    pub frequency: ContractFrequency,
    pub product_count: usize,
}

/// Pick the upcoming contracts out of a calendar snapshot, ordered by SQ
/// day (contract month breaks ties deterministically).
pub fn select_upcoming<'a>(
    calendar: &'a Calendar,
    criteria: &SelectionCriteria,
) -> Vec<&'a SQRecord> {
    let mut picked: Vec<&SQRecord> = calendar
        .iter()
        .filter(|r| r.special_quotation_day > criteria.as_of)
        .filter(|r| criteria.frequency.matches(&r.contract_month))
        .collect();
    picked.sort_by(|a, b| {
        a.special_quotation_day
            .cmp(&b.special_quotation_day)
            .then_with(|| a.contract_month.cmp(&b.contract_month))
    });
    picked.truncate(criteria.product_count);

    debug!(
        as_of = %criteria.as_of,
        frequency = criteria.frequency.as_str(),
        selected = picked.len(),
        "selected upcoming contracts"
    );
    picked
}

// ---------------------------------------------------------------------------
// Snapshot cell
// ---------------------------------------------------------------------------

/// Shared, hot-swappable calendar snapshot.
///
/// Readers take a cheap `Arc` clone and keep a consistent view for as long
/// as they hold it; a rebuild replaces the whole snapshot in one store.
/// Nobody ever observes a half-written calendar.
#[derive(Debug)]
pub struct CalendarCell {
    inner: RwLock<Arc<Calendar>>,
}

impl CalendarCell {
    pub fn new(calendar: Calendar) -> Self {
        Self {
            inner: RwLock::new(Arc::new(calendar)),
        }
    }

    /// Current snapshot.
    pub fn load(&self) -> Arc<Calendar> {
        // The lock only ever guards an Arc assignment; a poisoned lock still
        // holds a whole snapshot, so recover instead of propagating.
        Arc::clone(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the snapshot wholesale. Existing readers keep the snapshot
    /// they already loaded.
    pub fn store(&self, calendar: Calendar) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(calendar);
    }
}

impl Default for CalendarCell {
    fn default() -> Self {
        Self::new(Calendar::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use jpxd_calendar::{reconcile, HolidaySet, PartialRecord};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_calendar() -> Calendar {
        let holidays = HolidaySet::empty();
        reconcile(
            [vec![
                PartialRecord::new("2024-01"),
                PartialRecord::new("2024-02"),
                PartialRecord::new("2024-03"),
                PartialRecord::new("2024-02-W1"),
                PartialRecord::new("2024-02-W4"),
            ]],
            &holidays,
        )
        .unwrap()
    }

    #[test]
    fn frequency_parses_and_round_trips() {
        assert_eq!("monthly".parse::<ContractFrequency>().unwrap(), ContractFrequency::Monthly);
        assert_eq!("Weekly".parse::<ContractFrequency>().unwrap(), ContractFrequency::Weekly);
        assert!("biweekly".parse::<ContractFrequency>().is_err());
    }

    #[test]
    fn selects_only_future_sq_days() {
        let calendar = sample_calendar();
        // 2024-01-12 is January's SQ day; as of that day it no longer counts.
        let criteria = SelectionCriteria {
            as_of: d("2024-01-12"),
            frequency: ContractFrequency::Monthly,
            product_count: 10,
        };
        let keys: Vec<String> = select_upcoming(&calendar, &criteria)
            .iter()
            .map(|r| r.key())
            .collect();
        assert_eq!(keys, vec!["2024-02", "2024-03"]);
    }

    #[test]
    fn weekly_frequency_selects_weekly_contracts() {
        let calendar = sample_calendar();
        let criteria = SelectionCriteria {
            as_of: d("2024-01-01"),
            frequency: ContractFrequency::Weekly,
            product_count: 10,
        };
        let keys: Vec<String> = select_upcoming(&calendar, &criteria)
            .iter()
            .map(|r| r.key())
            .collect();
        assert_eq!(keys, vec!["2024-02-W1", "2024-02-W4"]);
    }

    #[test]
    fn product_count_truncates_in_sq_day_order() {
        let calendar = sample_calendar();
        let criteria = SelectionCriteria {
            as_of: d("2023-12-31"),
            frequency: ContractFrequency::Monthly,
            product_count: 2,
        };
        let keys: Vec<String> = select_upcoming(&calendar, &criteria)
            .iter()
            .map(|r| r.key())
            .collect();
        assert_eq!(keys, vec!["2024-01", "2024-02"]);
    }

    #[test]
    fn cell_swap_replaces_snapshot_for_new_readers_only() {
        let cell = CalendarCell::default();
        let before = cell.load();
        assert!(before.is_empty());

        cell.store(sample_calendar());
        let after = cell.load();
        assert_eq!(after.len(), 5);
        // The earlier reader still sees the snapshot it loaded.
        assert!(before.is_empty());
    }
}
