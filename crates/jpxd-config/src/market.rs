//! Typed extraction of the market configuration.
//!
//! Raw config shape (YAML):
//!
//! ```yaml
//! exchange:
//!   timezone: Asia/Tokyo
//! trading_hours:
//!   day:           { start: "8:45",  end: "15:40" }
//!   day_closing:   { start: "15:40", end: "15:45" }
//!   night:         { start: "17:00", end: "5:55" }
//!   night_closing: { start: "5:55",  end: "6:00" }
//! holidays:
//!   dates: ["2024-01-01", "2024-01-08"]
//! provider:
//!   static_source: github
//!   contract_frequency: monthly
//!   product_count: 8
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::Value;

use jpxd_calendar::HolidaySet;
use jpxd_provider::{ContractFrequency, ProviderKind};
use jpxd_session::{SessionSchedule, SessionWindow};

use crate::{load_layered_yaml, LoadedConfig};

// ---------------------------------------------------------------------------
// Raw (serde) shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawConfig {
    exchange: RawExchange,
    trading_hours: RawTradingHours,
    holidays: RawHolidays,
    provider: RawProvider,
}

#[derive(Debug, Deserialize)]
struct RawExchange {
    timezone: String,
}

#[derive(Debug, Deserialize)]
struct RawTradingHours {
    day: RawWindow,
    day_closing: RawWindow,
    night: RawWindow,
    night_closing: RawWindow,
}

#[derive(Debug, Deserialize)]
struct RawWindow {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct RawHolidays {
    #[serde(default)]
    dates: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawProvider {
    static_source: String,
    contract_frequency: String,
    product_count: usize,
}

// ---------------------------------------------------------------------------
// Typed configuration
// ---------------------------------------------------------------------------

/// Provider selection as configured; the caller adds the "as of" date when
/// building selection criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub frequency: ContractFrequency,
    pub product_count: usize,
}

/// Everything the core crates need, fully validated.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub schedule: SessionSchedule,
    pub holidays: HolidaySet,
    pub provider: ProviderSettings,
}

impl MarketConfig {
    /// Extract and validate from a merged config value.
    pub fn from_value(config: &Value) -> Result<Self> {
        let raw: RawConfig =
            serde_json::from_value(config.clone()).context("market config has missing or mistyped sections")?;

        let timezone: Tz = raw
            .exchange
            .timezone
            .parse()
            .map_err(|e: chrono_tz::ParseError| anyhow::anyhow!(e))
            .with_context(|| format!("unknown exchange timezone '{}'", raw.exchange.timezone))?;

        let window = |name: &str, w: &RawWindow| -> Result<SessionWindow> {
            SessionWindow::from_hhmm(&w.start, &w.end)
                .with_context(|| format!("invalid trading_hours.{name} window"))
        };
        let schedule = SessionSchedule::new(
            timezone,
            window("day", &raw.trading_hours.day)?,
            window("day_closing", &raw.trading_hours.day_closing)?,
            window("night", &raw.trading_hours.night)?,
            window("night_closing", &raw.trading_hours.night_closing)?,
        )
        .context("invalid trading_hours schedule")?;

        let mut dates = Vec::with_capacity(raw.holidays.dates.len());
        for raw_date in &raw.holidays.dates {
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
                .with_context(|| format!("invalid holiday date '{raw_date}'"))?;
            dates.push(date);
        }
        let holidays = HolidaySet::new(dates);

        let provider = ProviderSettings {
            kind: raw.provider.static_source.parse().context("invalid provider.static_source")?,
            frequency: raw
                .provider
                .contract_frequency
                .parse()
                .context("invalid provider.contract_frequency")?,
            product_count: raw.provider.product_count,
        };

        Ok(Self {
            schedule,
            holidays,
            provider,
        })
    }
}

/// Load layered YAML from disk and extract the typed market configuration.
pub fn load_market_config(paths: &[&str]) -> Result<(LoadedConfig, MarketConfig)> {
    let loaded = load_layered_yaml(paths)?;
    let market = MarketConfig::from_value(&loaded.config_json)?;
    Ok((loaded, market))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
