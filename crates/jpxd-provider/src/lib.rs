//! jpxd-provider
//!
//! Static-data boundary over the canonical calendar: an object-safe
//! provider trait, configuration-selected provider kinds, and the thin
//! "next N contracts as of a date" selection. The calendar itself is built
//! elsewhere (jpxd-calendar); fetching and persistence live outside the
//! workspace entirely. This crate only answers questions about a snapshot
//! it was handed.

mod provider;
mod selection;

pub use provider::{build_provider, CalendarStaticData, ProviderError, ProviderKind, StaticDataProvider};
pub use selection::{select_upcoming, CalendarCell, ContractFrequency, SelectionCriteria};
