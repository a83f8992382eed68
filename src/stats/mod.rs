//! Windowed summary statistics over stored observations.
//!
//! The engine only reads: it pulls the station's observations for the window
//! through [`ReportStore::query`] and reduces each tracked metric over the
//! values that are actually present. Absent values are excluded from that
//! metric's statistics, never treated as zero.

pub mod error;

use crate::stats::error::StatsError;
use crate::store::ReportStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Min/mean/max triple for one metric over the window.
///
/// The mean is the plain arithmetic mean over the present values; there is
/// no weighting or outlier rejection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

/// Summary statistics for one station over one time window.
///
/// Computed on demand and never persisted. Each metric is `None` when no
/// observation in the window carried a value for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub station_code: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Air temperature, degrees Celsius.
    pub temperature: Option<MetricSummary>,
    /// Sustained wind speed, m/s.
    pub wind_speed: Option<MetricSummary>,
    /// Prevailing visibility, meters.
    pub visibility: Option<MetricSummary>,
    /// Dew point, degrees Celsius.
    pub dew_point: Option<MetricSummary>,
    /// Pressure (QNH), hectopascals.
    pub pressure: Option<MetricSummary>,
}

/// Computes summary statistics for `station_code` over `[start, end]`
/// (absent bounds mean "all time").
///
/// # Errors
///
/// [`StatsError::NoData`] when the window matches no observation;
/// [`StatsError::Storage`] when the underlying query fails; no partial
/// summary is ever returned.
pub async fn compute_stats(
    store: &ReportStore,
    station_code: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<StatsSummary, StatsError> {
    let observations = store.query(station_code, start, end).await?;
    if observations.is_empty() {
        return Err(StatsError::NoData {
            station: station_code.to_string(),
        });
    }

    Ok(StatsSummary {
        station_code: station_code.to_string(),
        start,
        end,
        temperature: summarize(observations.iter().filter_map(|o| o.temperature)),
        wind_speed: summarize(observations.iter().filter_map(|o| o.wind_speed)),
        visibility: summarize(observations.iter().filter_map(|o| o.visibility)),
        dew_point: summarize(observations.iter().filter_map(|o| o.dew_point)),
        pressure: summarize(observations.iter().filter_map(|o| o.pressure)),
    })
}

fn summarize(values: impl Iterator<Item = f64>) -> Option<MetricSummary> {
    let mut count = 0u32;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in values {
        count += 1;
        sum += value;
        min = min.min(value);
        max = max.max(value);
    }
    if count == 0 {
        return None;
    }
    Some(MetricSummary {
        min,
        mean: sum / count as f64,
        max,
    })
}
