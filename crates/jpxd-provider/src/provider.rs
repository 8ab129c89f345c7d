//! Provider boundary for calendar static data.
//!
//! Callers pick a provider kind in configuration; the factory maps the kind
//! to a concrete value behind `Box<dyn StaticDataProvider>`. The concrete
//! providers differ only in where their snapshot was published from; the
//! ingest side of that is outside this workspace.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;

use jpxd_calendar::Calendar;

use crate::selection::{select_upcoming, SelectionCriteria};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors raised while resolving provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Configured provider kind is not one of the known variants.
    UnknownKind { raw: String },
    /// Configured contract frequency is not one of the known variants.
    UnknownFrequency { raw: String },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::UnknownKind { raw } => {
                write!(f, "unknown static data provider '{raw}'. expected one of: github | r2")
            }
            ProviderError::UnknownFrequency { raw } => {
                write!(
                    f,
                    "unknown contract frequency '{raw}'. expected one of: monthly | weekly"
                )
            }
        }
    }
}

impl std::error::Error for ProviderError {}

// ---------------------------------------------------------------------------
// Provider kind
// ---------------------------------------------------------------------------

/// Where the calendar snapshot is published from. Selected by configuration,
/// never by subclassing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Snapshot published to the public GitHub data repository.
    Github,
    /// Snapshot published to the public Cloudflare R2 bucket.
    CloudflareR2,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Github => "github",
            ProviderKind::CloudflareR2 => "r2",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "github" => Ok(ProviderKind::Github),
            "r2" => Ok(ProviderKind::CloudflareR2),
            other => Err(ProviderError::UnknownKind {
                raw: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Static-data contract for calendar consumers.
///
/// Object-safe so callers hold a `Box<dyn StaticDataProvider>` without
/// knowing the concrete type; `Send + Sync` so a provider can be shared
/// across threads. The three list getters answer in the same order, so
/// index i across them describes one contract.
pub trait StaticDataProvider: Send + Sync {
    /// Provider kind name (e.g. `"github"`).
    fn name(&self) -> &'static str;

    /// Canonical keys of the upcoming contracts.
    fn contract_months(&self) -> Vec<String>;

    /// SQ days of the upcoming contracts.
    fn special_quotation_days(&self) -> Vec<NaiveDate>;

    /// Last trading days of the upcoming contracts.
    fn last_trading_days(&self) -> Vec<NaiveDate>;
}

// ---------------------------------------------------------------------------
// Snapshot-backed provider
// ---------------------------------------------------------------------------

/// Provider answering from an immutable calendar snapshot.
#[derive(Debug, Clone)]
pub struct CalendarStaticData {
    kind: ProviderKind,
    snapshot: Arc<Calendar>,
    criteria: SelectionCriteria,
}

impl CalendarStaticData {
    pub fn new(kind: ProviderKind, snapshot: Arc<Calendar>, criteria: SelectionCriteria) -> Self {
        Self {
            kind,
            snapshot,
            criteria,
        }
    }
}

impl StaticDataProvider for CalendarStaticData {
    fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    fn contract_months(&self) -> Vec<String> {
        select_upcoming(&self.snapshot, &self.criteria)
            .iter()
            .map(|r| r.key())
            .collect()
    }

    fn special_quotation_days(&self) -> Vec<NaiveDate> {
        select_upcoming(&self.snapshot, &self.criteria)
            .iter()
            .map(|r| r.special_quotation_day)
            .collect()
    }

    fn last_trading_days(&self) -> Vec<NaiveDate> {
        select_upcoming(&self.snapshot, &self.criteria)
            .iter()
            .map(|r| r.last_trading_day)
            .collect()
    }
}

/// Map a configured kind to its provider. Every kind currently serves from
/// a calendar snapshot; the kind decides which published copy the ingest
/// side keeps fresh.
pub fn build_provider(
    kind: ProviderKind,
    snapshot: Arc<Calendar>,
    criteria: SelectionCriteria,
) -> Box<dyn StaticDataProvider> {
    match kind {
        ProviderKind::Github | ProviderKind::CloudflareR2 => {
            Box::new(CalendarStaticData::new(kind, snapshot, criteria))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
