//! A calendar rebuild swaps the shared snapshot atomically: providers built
//! before the swap keep answering from their original snapshot, new ones
//! see the rebuilt calendar.

use chrono::NaiveDate;
use jpxd_calendar::{reconcile, HolidaySet, PartialRecord};
use jpxd_provider::{
    build_provider, CalendarCell, ContractFrequency, ProviderKind, SelectionCriteria,
};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn scenario_hot_swap_preserves_reader_snapshots() {
    let holidays = HolidaySet::empty();
    let criteria = SelectionCriteria {
        as_of: d("2023-12-31"),
        frequency: ContractFrequency::Monthly,
        product_count: 8,
    };

    let first = reconcile([vec![PartialRecord::new("2024-01")]], &holidays).unwrap();
    let cell = CalendarCell::new(first);

    let reader_before = build_provider(ProviderKind::Github, cell.load(), criteria);
    assert_eq!(reader_before.contract_months(), vec!["2024-01"]);

    // Rebuild with one more month and publish it.
    let second = reconcile(
        [vec![PartialRecord::new("2024-01"), PartialRecord::new("2024-02")]],
        &holidays,
    )
    .unwrap();
    cell.store(second);

    // Old reader still answers from its snapshot; a fresh reader sees both.
    assert_eq!(reader_before.contract_months(), vec!["2024-01"]);
    let reader_after = build_provider(ProviderKind::Github, cell.load(), criteria);
    assert_eq!(reader_after.contract_months(), vec!["2024-01", "2024-02"]);
}
