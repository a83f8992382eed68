//! Defines the structured form of a decoded METAR report and its sky-condition
//! layers. All measurable fields are optional because source reports are
//! frequently incomplete or malformed for a given group; only the station code
//! (and, for parsed reports, the observation time) is guaranteed.
//!
//! Values are normalized to one unit system at decode time so that stored
//! observations are directly comparable: wind speeds in meters per second,
//! distances and altitudes in meters, temperatures in degrees Celsius and
//! pressure in hectopascals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cloud cover classification of a single sky-condition layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkyCover {
    /// Few clouds (1-2 oktas), `FEW`.
    #[serde(rename = "FEW")]
    Few,
    /// Scattered clouds (3-4 oktas), `SCT`.
    #[serde(rename = "SCT")]
    Scattered,
    /// Broken clouds (5-7 oktas), `BKN`.
    #[serde(rename = "BKN")]
    Broken,
    /// Overcast (8 oktas), `OVC`.
    #[serde(rename = "OVC")]
    Overcast,
    /// Sky obscured, altitude is the vertical visibility, `VV`.
    #[serde(rename = "VV")]
    VerticalVisibility,
    /// No cloud detected (`SKC`, `CLR`, `NSC`, `NCD`).
    #[serde(rename = "CLR")]
    Clear,
}

/// One sky-condition layer: a cover classification and an optional base
/// altitude in meters. Layers keep the order in which they appear in the
/// report, lowest first in well-formed input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyLayer {
    pub cover: SkyCover,
    /// Layer base (or vertical visibility) in meters, if reported.
    pub altitude: Option<f64>,
}

/// A decoded weather observation that has not been persisted yet.
///
/// This is what [`crate::parse_report`] produces and what
/// [`crate::ReportStore::insert`] accepts; the store assigns the id and
/// returns the stored [`Observation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewObservation {
    /// ICAO station code the observation belongs to (4-character code).
    pub station_code: String,
    /// Observation time in UTC; absent when the source did not carry one.
    pub observed_at: Option<DateTime<Utc>>,
    /// Sustained wind speed in m/s.
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees true; absent for variable (`VRB`) winds.
    pub wind_direction: Option<f64>,
    /// Peak gust in m/s.
    pub wind_gust: Option<f64>,
    /// Variable wind sector start, degrees true.
    pub wind_variable_from: Option<f64>,
    /// Variable wind sector end, degrees true.
    pub wind_variable_to: Option<f64>,
    /// Prevailing visibility in meters (runway visual range proxy).
    pub visibility: Option<f64>,
    /// Direction of the reported visibility in degrees true, when the report
    /// qualifies it with a compass point.
    pub visibility_direction: Option<f64>,
    /// Dew point in degrees Celsius.
    pub dew_point: Option<f64>,
    /// Air temperature in degrees Celsius.
    pub temperature: Option<f64>,
    /// Altimeter setting in hectopascals (QNH).
    pub pressure: Option<f64>,
    /// Sky condition layers in report order; empty when none were decoded.
    pub sky_layers: Vec<SkyLayer>,
}

impl NewObservation {
    /// Creates an observation for `station_code` with every measurement
    /// absent. Decoders fill in the groups they recognize.
    pub fn for_station(station_code: impl Into<String>) -> Self {
        NewObservation {
            station_code: station_code.into(),
            observed_at: None,
            wind_speed: None,
            wind_direction: None,
            wind_gust: None,
            wind_variable_from: None,
            wind_variable_to: None,
            visibility: None,
            visibility_direction: None,
            dew_point: None,
            temperature: None,
            pressure: None,
            sky_layers: Vec::new(),
        }
    }
}

/// A persisted observation. Identical to [`NewObservation`] plus the id the
/// store assigned on insertion. Observations are immutable once stored;
/// corrections arrive as new rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Store-assigned unique identifier.
    pub id: i64,
    pub station_code: String,
    pub observed_at: Option<DateTime<Utc>>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub wind_gust: Option<f64>,
    pub wind_variable_from: Option<f64>,
    pub wind_variable_to: Option<f64>,
    pub visibility: Option<f64>,
    pub visibility_direction: Option<f64>,
    pub dew_point: Option<f64>,
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
    pub sky_layers: Vec<SkyLayer>,
}
