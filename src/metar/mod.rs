//! Decoding of raw METAR text reports into structured observations.
//!
//! The decoder is a hand-rolled tokenizer over the single-line, space
//! separated METAR grammar: the mandatory station and time groups are decoded
//! first, then every remaining token is offered to a table of per-group
//! decoders ([`decode`]). A token that matches no decoder (weather phenomena,
//! runway visual range groups, trend groups we do not track) is skipped, and
//! a token that *almost* matches, say a wind group with corrupt digits,
//! leaves that field absent without affecting any other group. Remarks
//! (`RMK`) and trend forecasts (`TEMPO`/`BECMG`) end decoding.

mod decode;
pub mod error;

use crate::metar::error::MalformedReportError;
use crate::types::observation::NewObservation;
use chrono::{DateTime, Utc};
use log::{debug, warn};

/// Decodes one raw METAR report into a [`NewObservation`].
///
/// `station_hint` is the code the caller believes the report describes
/// (typically the station it was fetched for). The report body is
/// authoritative: on disagreement the body's code wins and the mismatch is
/// logged.
///
/// # Errors
///
/// Returns [`MalformedReportError`] when the report is empty or its station
/// or time group cannot be decoded. Any other malformed group only leaves
/// the corresponding field absent.
pub fn parse_report(
    raw: &str,
    station_hint: Option<&str>,
) -> Result<NewObservation, MalformedReportError> {
    parse_report_at(raw, station_hint, Utc::now())
}

/// [`parse_report`] with an explicit reference instant.
///
/// METAR time groups carry only day-of-month and time; `reference` supplies
/// the year and month they resolve against. [`parse_report`] passes the
/// current instant; tests pass a fixed one.
pub fn parse_report_at(
    raw: &str,
    station_hint: Option<&str>,
    reference: DateTime<Utc>,
) -> Result<NewObservation, MalformedReportError> {
    let mut tokens = raw.split_whitespace().peekable();

    // Report type prefix, present in some dialects.
    if matches!(tokens.peek(), Some(&"METAR") | Some(&"SPECI")) {
        tokens.next();
    }

    let station_token = tokens.next().ok_or(MalformedReportError::EmptyReport)?;
    let station = decode::decode_station(station_token).ok_or_else(|| {
        MalformedReportError::InvalidStation {
            report: raw.trim().to_string(),
        }
    })?;

    if let Some(hint) = station_hint {
        if !hint.eq_ignore_ascii_case(station) {
            warn!(
                "report station '{}' disagrees with hint '{}', keeping the report's code",
                station, hint
            );
        }
    }

    while matches!(tokens.peek(), Some(&"AUTO") | Some(&"COR")) {
        tokens.next();
    }

    let observed_at = tokens
        .next()
        .and_then(|token| decode::decode_time(token, reference))
        .ok_or_else(|| MalformedReportError::InvalidTime {
            station: station.to_string(),
        })?;

    let mut observation = NewObservation::for_station(station);
    observation.observed_at = Some(observed_at);

    while let Some(token) = tokens.next() {
        match token {
            "RMK" | "TEMPO" | "BECMG" => break,
            "AUTO" | "COR" | "NOSIG" => continue,
            _ => {}
        }

        if observation.wind_speed.is_none() {
            if let Some(wind) = decode::decode_wind(token) {
                observation.wind_speed = Some(wind.speed);
                observation.wind_direction = wind.direction;
                observation.wind_gust = wind.gust;
                continue;
            }
        }

        if observation.wind_variable_from.is_none() {
            if let Some((from, to)) = decode::decode_variable_wind(token) {
                observation.wind_variable_from = Some(from);
                observation.wind_variable_to = Some(to);
                continue;
            }
        }

        if observation.visibility.is_none() {
            if let Some(visibility) = decode::decode_visibility(token) {
                observation.visibility = Some(visibility.meters);
                observation.visibility_direction = visibility.direction;
                continue;
            }
            // "1 1/2SM": whole miles and the fraction arrive as two tokens.
            if let Ok(whole) = token.parse::<u32>() {
                if whole < 10 {
                    if let Some(fraction) =
                        tokens.peek().and_then(|next| decode::decode_fraction_sm(next))
                    {
                        tokens.next();
                        observation.visibility =
                            Some((whole as f64 + fraction) * decode::METERS_PER_STATUTE_MILE);
                        continue;
                    }
                }
            }
        }

        if let Some(layer) = decode::decode_sky(token) {
            observation.sky_layers.push(layer);
            continue;
        }

        if observation.temperature.is_none() && observation.dew_point.is_none() {
            if let Some((temperature, dew_point)) = decode::decode_temperature(token) {
                observation.temperature = temperature;
                observation.dew_point = dew_point;
                continue;
            }
        }

        if observation.pressure.is_none() {
            if let Some(pressure) = decode::decode_pressure(token) {
                observation.pressure = Some(pressure);
                continue;
            }
        }

        debug!("skipping unrecognized group '{}' for station {}", token, station);
    }

    Ok(observation)
}
