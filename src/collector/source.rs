//! The external report source serving raw METAR text per station.

use crate::collector::error::FetchReportError;
use async_trait::async_trait;
use reqwest::Client;

/// NOAA's plain-text METAR mirror; one `.TXT` file per station.
pub const NOAA_BASE_URL: &str = "https://tgftp.nws.noaa.gov/data/observations/metar/stations";

/// Per-station fetch of one raw report.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Fetches the latest raw report line for `station_code`.
    async fn fetch_report(&self, station_code: &str) -> Result<String, FetchReportError>;
}

/// Report source backed by the NOAA text mirror (or any server exposing the
/// same `{base}/{CODE}.TXT` layout).
///
/// NOAA bodies carry an issuance-timestamp line before the report itself;
/// the report line is extracted here so callers only ever see METAR text.
pub struct NoaaReportSource {
    client: Client,
    base_url: String,
}

impl NoaaReportSource {
    pub fn new() -> Self {
        Self::with_base_url(NOAA_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        NoaaReportSource {
            client,
            base_url: base_url.into(),
        }
    }
}

impl Default for NoaaReportSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportSource for NoaaReportSource {
    async fn fetch_report(&self, station_code: &str) -> Result<String, FetchReportError> {
        let url = format!(
            "{}/{}.TXT",
            self.base_url.trim_end_matches('/'),
            station_code.to_uppercase()
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchReportError::NetworkRequest(url.clone(), e))?;
        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(e) => {
                return Err(if let Some(status) = e.status() {
                    FetchReportError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    FetchReportError::NetworkRequest(url, e)
                });
            }
        };
        let body = response
            .text()
            .await
            .map_err(|e| FetchReportError::Body(url, e))?;

        extract_report_line(&body).ok_or_else(|| FetchReportError::EmptyBody {
            station: station_code.to_string(),
        })
    }
}

/// Picks the report line out of a fetched body: the second non-empty line
/// when the body leads with the issuance timestamp, the sole line otherwise.
fn extract_report_line(body: &str) -> Option<String> {
    let mut lines = body.lines().map(str::trim).filter(|line| !line.is_empty());
    let first = lines.next()?;
    Some(lines.next().unwrap_or(first).to_string())
}
