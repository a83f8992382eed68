//! Station rows as served by the external airport directory.

use serde::{Deserialize, Serialize};

/// One station from the directory service.
///
/// The directory serves airport records as JSON; only the identification
/// fields matter here, everything else the service returns is ignored.
/// A missing or empty `code` means the station cannot be polled and the
/// collector skips it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// ICAO code of the station, when it has one.
    #[serde(rename = "icao_code", default)]
    pub code: Option<String>,
    /// Human-readable station name.
    #[serde(default)]
    pub name: String,
}

impl Station {
    /// Returns the trimmed ICAO code if it is present and non-empty.
    pub fn icao(&self) -> Option<&str> {
        match self.code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => Some(code),
            _ => None,
        }
    }
}
