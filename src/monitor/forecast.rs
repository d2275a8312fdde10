//! Linear growth forecasting: average rate of change extrapolated over fixed horizons.
//!
//! No smoothing or outlier rejection is applied. A burst near either end of the
//! window skews the projection by the full burst size.

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]

use serde::Serialize;

/// Fixed forecast horizons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    Day,
    Month30,
    Year,
}

impl Horizon {
    pub const ALL: [Self; 3] = [Self::Day, Self::Month30, Self::Year];

    #[must_use]
    pub const fn seconds(self) -> f64 {
        match self {
            Self::Day => 86_400.0,
            Self::Month30 => 2_592_000.0,
            Self::Year => 31_536_000.0,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Day => "1 Day",
            Self::Month30 => "30 Days",
            Self::Year => "1 Year",
        }
    }
}

/// `net_change / elapsed_seconds`, or `0.0` when elapsed is zero, negative, or not finite.
#[must_use]
pub fn rate_per_second(net_change: f64, elapsed_seconds: f64) -> f64 {
    if !elapsed_seconds.is_finite() || elapsed_seconds <= 0.0 || !net_change.is_finite() {
        return 0.0;
    }
    net_change / elapsed_seconds
}

/// Projected change after `horizon_seconds` at the observed average rate.
#[must_use]
pub fn forecast(net_change: f64, elapsed_seconds: f64, horizon_seconds: f64) -> f64 {
    rate_per_second(net_change, elapsed_seconds) * horizon_seconds
}

/// One projected value per horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    pub horizon: Horizon,
    pub value: f64,
}

/// Rates and projections for one measured quantity (bytes or files).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateForecast {
    pub per_second: f64,
    pub per_hour: f64,
    pub projections: Vec<Projection>,
}

impl RateForecast {
    #[must_use]
    pub fn from_change(net_change: f64, elapsed_seconds: f64) -> Self {
        let per_second = rate_per_second(net_change, elapsed_seconds);
        Self {
            per_second,
            per_hour: per_second * 3_600.0,
            projections: Horizon::ALL
                .iter()
                .map(|&horizon| Projection {
                    horizon,
                    value: per_second * horizon.seconds(),
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn projection(&self, horizon: Horizon) -> f64 {
        self.projections
            .iter()
            .find(|p| p.horizon == horizon)
            .map_or(0.0, |p| p.value)
    }
}

/// Forecast bundle for a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthForecast {
    pub elapsed_seconds: f64,
    /// Absent in membership mode, which does not measure size.
    pub bytes: Option<RateForecast>,
    pub files: RateForecast,
}

impl GrowthForecast {
    #[must_use]
    pub fn new(net_bytes: Option<i64>, net_files: i64, elapsed_seconds: f64) -> Self {
        Self {
            elapsed_seconds,
            bytes: net_bytes.map(|b| RateForecast::from_change(b as f64, elapsed_seconds)),
            files: RateForecast::from_change(net_files as f64, elapsed_seconds),
        }
    }
}

/// Added/removed files per minute for membership runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChurnRates {
    pub added_per_minute: Option<f64>,
    pub removed_per_minute: Option<f64>,
}

impl ChurnRates {
    /// Both rates are `None` when no time has elapsed.
    #[must_use]
    pub fn new(added: u64, removed: u64, elapsed_seconds: f64) -> Self {
        let minutes = elapsed_seconds / 60.0;
        if !minutes.is_finite() || minutes <= 0.0 {
            return Self {
                added_per_minute: None,
                removed_per_minute: None,
            };
        }
        Self {
            added_per_minute: Some(added as f64 / minutes),
            removed_per_minute: Some(removed as f64 / minutes),
        }
    }
}
