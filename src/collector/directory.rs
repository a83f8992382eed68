//! The external airport directory: where the collector learns which
//! stations exist.

use crate::collector::error::DirectoryError;
use crate::types::station::Station;
use async_trait::async_trait;
use reqwest::Client;

/// Source of the station fleet for a collector run.
#[async_trait]
pub trait StationDirectory: Send + Sync {
    /// The current station list. Called once per run.
    async fn stations(&self) -> Result<Vec<Station>, DirectoryError>;
}

/// Directory client against the airport API's `/airport/all` endpoint.
pub struct HttpStationDirectory {
    client: Client,
    base_url: String,
}

impl HttpStationDirectory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Reuses an existing client so the directory shares its connection pool
    /// with other consumers.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        HttpStationDirectory {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl StationDirectory for HttpStationDirectory {
    async fn stations(&self) -> Result<Vec<Station>, DirectoryError> {
        let url = format!("{}/airport/all", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DirectoryError::NetworkRequest(url.clone(), e))?;
        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(e) => {
                return Err(if let Some(status) = e.status() {
                    DirectoryError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    DirectoryError::NetworkRequest(url, e)
                });
            }
        };
        response
            .json::<Vec<Station>>()
            .await
            .map_err(|e| DirectoryError::Decode { url, source: e })
    }
}
