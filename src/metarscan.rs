//! The main entry point for working with a METAR observation database:
//! adding reports (structured or raw text), looking them up and computing
//! windowed statistics. Collection for a whole fleet lives in
//! [`crate::Collector`], which shares the same [`ReportStore`] handle.

use crate::error::MetarScanError;
use crate::metar::parse_report;
use crate::stats::{compute_stats, StatsSummary};
use crate::store::ReportStore;
use crate::types::observation::{NewObservation, Observation};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Handle to a METAR observation database.
///
/// Open one per process and share it; clones of the underlying store all
/// point at the same database.
///
/// # Examples
///
/// ```no_run
/// # use metarscan::{MetarScan, MetarScanError};
/// # async fn run() -> Result<(), MetarScanError> {
/// let scan = MetarScan::open("observations.db").await?;
/// let report = scan
///     .add_text_report("EHAM 251655Z VRB03KT CAVOK 18/09 Q1020", None)
///     .await?;
/// let stats = scan.stats("EHAM", None, None).await?;
/// println!("{} observations since forever: {:?}", report.station_code, stats.temperature);
/// # Ok(())
/// # }
/// ```
pub struct MetarScan {
    store: ReportStore,
}

impl MetarScan {
    /// Opens (creating if necessary) the observation database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, MetarScanError> {
        Ok(MetarScan {
            store: ReportStore::open(path).await?,
        })
    }

    /// Opens a throwaway in-memory database.
    pub async fn open_in_memory() -> Result<Self, MetarScanError> {
        Ok(MetarScan {
            store: ReportStore::open_in_memory().await?,
        })
    }

    /// The underlying store handle, for callers that drive a
    /// [`crate::Collector`] or need the raw persistence interface.
    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Persists an already-structured observation.
    pub async fn add_report(
        &self,
        observation: NewObservation,
    ) -> Result<Observation, MetarScanError> {
        Ok(self.store.insert(observation).await?)
    }

    /// Decodes one raw METAR report and persists the result.
    pub async fn add_text_report(
        &self,
        raw: &str,
        station_hint: Option<&str>,
    ) -> Result<Observation, MetarScanError> {
        let observation = parse_report(raw, station_hint)?;
        Ok(self.store.insert(observation).await?)
    }

    /// One observation by id, when it exists.
    pub async fn report(&self, id: i64) -> Result<Option<Observation>, MetarScanError> {
        Ok(self.store.get(id).await?)
    }

    /// Every stored observation, ordered by id.
    pub async fn all_reports(&self) -> Result<Vec<Observation>, MetarScanError> {
        Ok(self.store.list_all().await?)
    }

    /// Observations for one station, optionally bounded by an inclusive
    /// `[start, end]` window, ordered by observation time.
    pub async fn reports_for_station(
        &self,
        station_code: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Observation>, MetarScanError> {
        Ok(self.store.query(station_code, start, end).await?)
    }

    /// Removes one observation, reporting whether it existed.
    pub async fn remove_report(&self, id: i64) -> Result<bool, MetarScanError> {
        Ok(self.store.delete(id).await?)
    }

    /// Windowed min/mean/max statistics for one station; absent bounds mean
    /// "all time".
    pub async fn stats(
        &self,
        station_code: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<StatsSummary, MetarScanError> {
        Ok(compute_stats(&self.store, station_code, start, end).await?)
    }
}
