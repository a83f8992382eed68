//! Per-group decoders for the METAR grammar.
//!
//! Each decoder inspects one whitespace token and either produces a value or
//! `None` when the token does not match its sub-grammar. Decoders never fail
//! the surrounding report; the caller simply moves on to the next candidate
//! group. Unit conversions happen here so every produced value is in the
//! crate-wide unit system (m/s, meters, degrees Celsius, hectopascals).

use crate::types::observation::{SkyCover, SkyLayer};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

const MPS_PER_KNOT: f64 = 0.514444;
const MPS_PER_KMH: f64 = 1.0 / 3.6;
pub(super) const METERS_PER_STATUTE_MILE: f64 = 1609.344;
const METERS_PER_FOOT: f64 = 0.3048;
const HPA_PER_INHG: f64 = 33.8639;

/// Visibility recorded for `CAVOK` and the `9999` group (10 km or more).
const MAX_VISIBILITY_METERS: f64 = 10_000.0;

pub(super) struct DecodedWind {
    pub direction: Option<f64>,
    pub speed: f64,
    pub gust: Option<f64>,
}

pub(super) struct DecodedVisibility {
    pub meters: f64,
    pub direction: Option<f64>,
}

/// A station code is four uppercase alphanumerics containing at least one
/// letter (pure digit tokens are visibility or time groups).
pub(super) fn decode_station(token: &str) -> Option<&str> {
    let well_formed = token.len() == 4
        && token
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        && token.bytes().any(|b| b.is_ascii_uppercase());
    well_formed.then_some(token)
}

/// Decodes a `ddhhmmZ` group against `reference` (normally "now").
///
/// The report only carries day-of-month and time; the year and month come
/// from the reference instant, rolling back one month at a time whenever the
/// combination is impossible or lands more than a day in the future.
pub(super) fn decode_time(token: &str, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let digits = token.strip_suffix('Z')?;
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let day: u32 = digits[0..2].parse().ok()?;
    let hour: u32 = digits[2..4].parse().ok()?;
    let minute: u32 = digits[4..6].parse().ok()?;
    if !(1..=31).contains(&day) || hour > 23 || minute > 59 {
        return None;
    }

    let mut year = reference.year();
    let mut month = reference.month();
    for _ in 0..12 {
        if let Some(naive) = NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(hour, minute, 0)) {
            let candidate = Utc.from_utc_datetime(&naive);
            if candidate <= reference + Duration::days(1) {
                return Some(candidate);
            }
        }
        (year, month) = if month == 1 { (year - 1, 12) } else { (year, month - 1) };
    }
    None
}

/// `dddff(Gff)(KT|MPS|KMH)`; `VRB` in the direction slot means variable.
pub(super) fn decode_wind(token: &str) -> Option<DecodedWind> {
    let (body, to_mps) = if let Some(body) = token.strip_suffix("KT") {
        (body, MPS_PER_KNOT)
    } else if let Some(body) = token.strip_suffix("MPS") {
        (body, 1.0)
    } else if let Some(body) = token.strip_suffix("KMH") {
        (body, MPS_PER_KMH)
    } else {
        return None;
    };
    if body.len() < 5 {
        return None;
    }

    let (dir_part, speed_part) = body.split_at(3);
    let direction = if dir_part == "VRB" {
        None
    } else {
        let degrees = parse_digits(dir_part)?;
        if degrees > 360 {
            return None;
        }
        Some(degrees as f64)
    };

    let (speed_digits, gust_digits) = match speed_part.split_once('G') {
        Some((speed, gust)) => (speed, Some(gust)),
        None => (speed_part, None),
    };
    if speed_digits.len() < 2 || speed_digits.len() > 3 {
        return None;
    }
    let speed = parse_digits(speed_digits)? as f64 * to_mps;

    let gust = match gust_digits {
        Some(gust) => {
            if gust.len() < 2 || gust.len() > 3 {
                return None;
            }
            Some(parse_digits(gust)? as f64 * to_mps)
        }
        None => None,
    };

    Some(DecodedWind {
        direction,
        speed,
        gust,
    })
}

/// Variable wind sector `dddVddd`.
pub(super) fn decode_variable_wind(token: &str) -> Option<(f64, f64)> {
    let (from, to) = token.split_once('V')?;
    if from.len() != 3 || to.len() != 3 {
        return None;
    }
    let from = parse_digits(from)?;
    let to = parse_digits(to)?;
    if from > 360 || to > 360 {
        return None;
    }
    Some((from as f64, to as f64))
}

/// Prevailing visibility: `CAVOK`, a four-digit meter group with an optional
/// compass suffix (`4000NE`), or statute miles (`10SM`, `1/2SM`, `M1/4SM`).
///
/// Whole-plus-fraction mile groups span two tokens and are stitched together
/// by the caller with [`decode_fraction_sm`].
pub(super) fn decode_visibility(token: &str) -> Option<DecodedVisibility> {
    if token == "CAVOK" {
        return Some(DecodedVisibility {
            meters: MAX_VISIBILITY_METERS,
            direction: None,
        });
    }

    if let Some(body) = token.strip_suffix("SM") {
        let body = body.strip_prefix('M').unwrap_or(body);
        let miles = match body.split_once('/') {
            Some((numerator, denominator)) => {
                let numerator = parse_digits(numerator)? as f64;
                let denominator = parse_digits(denominator)? as f64;
                if denominator == 0.0 {
                    return None;
                }
                numerator / denominator
            }
            None => parse_digits(body)? as f64,
        };
        return Some(DecodedVisibility {
            meters: miles * METERS_PER_STATUTE_MILE,
            direction: None,
        });
    }

    let digit_len = token.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digit_len != 4 {
        return None;
    }
    let (digits, suffix) = token.split_at(4);
    let direction = match suffix {
        "" | "NDV" => None,
        compass => Some(compass_degrees(compass)?),
    };
    let meters = if digits == "9999" {
        MAX_VISIBILITY_METERS
    } else {
        parse_digits(digits)? as f64
    };
    Some(DecodedVisibility { meters, direction })
}

/// The fractional half of a split statute-mile group (`1/2SM`), in miles.
pub(super) fn decode_fraction_sm(token: &str) -> Option<f64> {
    let body = token.strip_suffix("SM")?;
    let body = body.strip_prefix('M').unwrap_or(body);
    let (numerator, denominator) = body.split_once('/')?;
    let numerator = parse_digits(numerator)? as f64;
    let denominator = parse_digits(denominator)? as f64;
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

/// Sky-condition group: cover code plus a three-digit height in hundreds of
/// feet, a convective suffix (`CB`/`TCU`) tolerated, `///` for an unknown
/// height. `VV###` reports vertical visibility, the clear-sky markers carry
/// no height at all.
pub(super) fn decode_sky(token: &str) -> Option<SkyLayer> {
    if matches!(token, "SKC" | "CLR" | "NSC" | "NCD") {
        return Some(SkyLayer {
            cover: SkyCover::Clear,
            altitude: None,
        });
    }

    if let Some(rest) = token.strip_prefix("VV") {
        return decode_layer_altitude(rest).map(|altitude| SkyLayer {
            cover: SkyCover::VerticalVisibility,
            altitude,
        });
    }

    let cover = match token.get(0..3)? {
        "FEW" => SkyCover::Few,
        "SCT" => SkyCover::Scattered,
        "BKN" => SkyCover::Broken,
        "OVC" => SkyCover::Overcast,
        _ => return None,
    };
    decode_layer_altitude(&token[3..]).map(|altitude| SkyLayer { cover, altitude })
}

fn decode_layer_altitude(rest: &str) -> Option<Option<f64>> {
    if rest.len() < 3 {
        return None;
    }
    let (height, suffix) = rest.split_at(3);
    if !matches!(suffix, "" | "CB" | "TCU") {
        return None;
    }
    if height == "///" {
        return Some(None);
    }
    let hundreds_of_feet = parse_digits(height)?;
    Some(Some(hundreds_of_feet as f64 * 100.0 * METERS_PER_FOOT))
}

/// `TT/DD` with `M` for sub-zero values; either side may be missing.
/// Returns `None` when the token is not a temperature group at all.
pub(super) fn decode_temperature(token: &str) -> Option<(Option<f64>, Option<f64>)> {
    let (temperature, dew_point) = token.split_once('/')?;
    let temperature = decode_celsius(temperature)?;
    let dew_point = decode_celsius(dew_point)?;
    if temperature.is_none() && dew_point.is_none() {
        return None;
    }
    Some((temperature, dew_point))
}

fn decode_celsius(part: &str) -> Option<Option<f64>> {
    if part.is_empty() || part == "//" || part == "XX" {
        return Some(None);
    }
    let (negative, digits) = match part.strip_prefix('M') {
        Some(digits) => (true, digits),
        None => (false, part),
    };
    if digits.is_empty() || digits.len() > 2 {
        return None;
    }
    let value = parse_digits(digits)? as f64;
    Some(Some(if negative { -value } else { value }))
}

/// Altimeter group: `Qhhhh` in hectopascals or `Axxxx` in hundredths of
/// inches of mercury, converted to hectopascals.
pub(super) fn decode_pressure(token: &str) -> Option<f64> {
    if let Some(digits) = token.strip_prefix('Q') {
        if digits.len() != 4 {
            return None;
        }
        return Some(parse_digits(digits)? as f64);
    }
    if let Some(digits) = token.strip_prefix('A') {
        if digits.len() != 4 {
            return None;
        }
        return Some(parse_digits(digits)? as f64 / 100.0 * HPA_PER_INHG);
    }
    None
}

fn compass_degrees(compass: &str) -> Option<f64> {
    Some(match compass {
        "N" => 0.0,
        "NE" => 45.0,
        "E" => 90.0,
        "SE" => 135.0,
        "S" => 180.0,
        "SW" => 225.0,
        "W" => 270.0,
        "NW" => 315.0,
        _ => return None,
    })
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
