//! Periodic collection of raw reports for the whole station fleet.
//!
//! One [`Collector::run`] call is one batch: it asks the directory for the
//! current station list, fetches every station's raw report concurrently
//! (bounded fan-out, per-station timeout), and pushes each successful fetch
//! through parse + insert. Failures are strictly per-station: recorded,
//! logged and skipped, never aborting the batch. Runs keep no state between
//! invocations; scheduling is the host's concern.

mod directory;
pub mod error;
mod source;

pub use directory::{HttpStationDirectory, StationDirectory};
pub use source::{NoaaReportSource, ReportSource, NOAA_BASE_URL};

use crate::collector::error::{CollectError, FetchReportError};
use crate::metar::parse_report;
use crate::store::ReportStore;
use bon::bon;
use futures_util::stream::{self, StreamExt};
use log::{debug, info, warn};
use std::time::Duration;

/// Outcome of one collector run. Every station settles exactly one way:
/// stored, skipped for lacking a code, or failed (fetch, parse or storage).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Stations the directory returned.
    pub stations: usize,
    /// Observations written to the store.
    pub stored: usize,
    /// Stations skipped because the directory had no code for them.
    pub skipped_no_code: usize,
    /// Stations whose fetch, parse or insert failed.
    pub failed: usize,
}

/// Fetch-parse-store orchestrator for a station fleet.
pub struct Collector<D, S> {
    store: ReportStore,
    directory: D,
    source: S,
    concurrency: usize,
    timeout: Duration,
    retries: u32,
}

#[bon]
impl<D, S> Collector<D, S>
where
    D: StationDirectory,
    S: ReportSource,
{
    /// Builder entry point; `store`, `directory` and `source` are required.
    ///
    /// `concurrency` caps the in-flight fetches (default 8), `timeout`
    /// bounds each station's fetch (default 10 s) and `retries` is the
    /// number of per-station fetch re-attempts beyond the first (default 0,
    /// off unless the host opts in).
    #[builder]
    pub fn new(
        store: ReportStore,
        directory: D,
        source: S,
        #[builder(default = 8)] concurrency: usize,
        #[builder(default = Duration::from_secs(10))] timeout: Duration,
        #[builder(default = 0)] retries: u32,
    ) -> Self {
        Collector {
            store,
            directory,
            source,
            concurrency: concurrency.max(1),
            timeout,
            retries,
        }
    }

    /// Executes one collection batch and returns once every station has
    /// settled.
    ///
    /// # Errors
    ///
    /// Only a failed directory call aborts the run; per-station failures
    /// are counted in the returned [`RunSummary`].
    pub async fn run(&self) -> Result<RunSummary, CollectError> {
        let stations = self.directory.stations().await?;
        let total = stations.len();

        let mut skipped_no_code = 0usize;
        let mut codes = Vec::with_capacity(total);
        for station in &stations {
            match station.icao() {
                Some(code) => codes.push(code.to_uppercase()),
                None => {
                    warn!("missing ICAO code for station '{}', skipping", station.name);
                    skipped_no_code += 1;
                }
            }
        }

        let results: Vec<bool> = stream::iter(codes.into_iter().map(|code| self.process_station(code)))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let stored = results.iter().filter(|stored| **stored).count();
        let summary = RunSummary {
            stations: total,
            stored,
            skipped_no_code,
            failed: results.len() - stored,
        };
        info!(
            "collector run settled: {} stations, {} stored, {} failed, {} without code",
            summary.stations, summary.stored, summary.failed, summary.skipped_no_code
        );
        Ok(summary)
    }

    /// Fetch, parse and store one station's report. Returns whether an
    /// observation was stored; every failure is recorded here and swallowed.
    async fn process_station(&self, code: String) -> bool {
        let raw = match self.fetch_with_retry(&code).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!("fetching report for station '{}' failed: {}", code, err);
                return false;
            }
        };
        let observation = match parse_report(&raw, Some(&code)) {
            Ok(observation) => observation,
            Err(err) => {
                warn!("discarding report for station '{}': {}", code, err);
                return false;
            }
        };
        match self.store.insert(observation).await {
            Ok(stored) => {
                debug!("stored observation {} for station '{}'", stored.id, code);
                true
            }
            Err(err) => {
                warn!("storing observation for station '{}' failed: {}", code, err);
                false
            }
        }
    }

    async fn fetch_with_retry(&self, code: &str) -> Result<String, FetchReportError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(code).await {
                Ok(raw) => return Ok(raw),
                Err(err) if attempt < self.retries => {
                    attempt += 1;
                    debug!(
                        "retrying fetch for station '{}' (attempt {} of {}): {}",
                        code, attempt, self.retries, err
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fetch_once(&self, code: &str) -> Result<String, FetchReportError> {
        match tokio::time::timeout(self.timeout, self.source.fetch_report(code)).await {
            Ok(result) => result,
            Err(_) => Err(FetchReportError::Timeout {
                station: code.to_string(),
                timeout: self.timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::error::DirectoryError;
    use crate::types::station::Station;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeDirectory {
        stations: Vec<Station>,
    }

    #[async_trait]
    impl StationDirectory for FakeDirectory {
        async fn stations(&self) -> Result<Vec<Station>, DirectoryError> {
            Ok(self.stations.clone())
        }
    }

    /// Serves a canned report per station; stations without an entry fail.
    struct FakeSource {
        reports: HashMap<String, String>,
        delay: Option<Duration>,
        fail_first_attempts: AtomicU32,
    }

    impl FakeSource {
        fn new(reports: &[(&str, &str)]) -> Self {
            FakeSource {
                reports: reports
                    .iter()
                    .map(|(code, report)| (code.to_string(), report.to_string()))
                    .collect(),
                delay: None,
                fail_first_attempts: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ReportSource for FakeSource {
        async fn fetch_report(&self, station_code: &str) -> Result<String, FetchReportError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_first_attempts.load(Ordering::SeqCst) > 0 {
                self.fail_first_attempts.fetch_sub(1, Ordering::SeqCst);
                return Err(FetchReportError::EmptyBody {
                    station: station_code.to_string(),
                });
            }
            self.reports
                .get(station_code)
                .cloned()
                .ok_or_else(|| FetchReportError::EmptyBody {
                    station: station_code.to_string(),
                })
        }
    }

    fn station(code: Option<&str>, name: &str) -> Station {
        Station {
            code: code.map(str::to_string),
            name: name.to_string(),
        }
    }

    fn report_for(code: &str) -> String {
        format!("{code} 251200Z 27010KT 9999 SCT040 18/09 Q1015")
    }

    async fn collector_with(
        directory: FakeDirectory,
        source: FakeSource,
    ) -> (Collector<FakeDirectory, FakeSource>, ReportStore) {
        let store = ReportStore::open_in_memory().await.unwrap();
        let collector = Collector::builder()
            .store(store.clone())
            .directory(directory)
            .source(source)
            .concurrency(4)
            .build();
        (collector, store)
    }

    #[tokio::test]
    async fn failed_stations_do_not_abort_the_batch() {
        let directory = FakeDirectory {
            stations: ["EHAM", "KJFK", "EDDF", "LFPG", "EGLL"]
                .iter()
                .map(|&code| station(Some(code), code))
                .collect(),
        };
        // Only three of the five stations have a report to serve.
        let source = FakeSource::new(&[
            ("EHAM", &report_for("EHAM")),
            ("KJFK", &report_for("KJFK")),
            ("EDDF", &report_for("EDDF")),
        ]);

        let (collector, store) = collector_with(directory, source).await;
        let summary = collector.run().await.unwrap();

        assert_eq!(summary.stations, 5);
        assert_eq!(summary.stored, 3);
        assert_eq!(summary.failed, 2);
        assert_eq!(store.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn stations_without_a_code_are_skipped() {
        let directory = FakeDirectory {
            stations: vec![
                station(Some("EHAM"), "Schiphol"),
                station(Some(""), "Nameless strip"),
                station(None, "Grass field"),
            ],
        };
        let source = FakeSource::new(&[("EHAM", &report_for("EHAM"))]);

        let (collector, store) = collector_with(directory, source).await;
        let summary = collector.run().await.unwrap();

        assert_eq!(summary.skipped_no_code, 2);
        assert_eq!(summary.stored, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unparseable_reports_count_as_failures() {
        let directory = FakeDirectory {
            stations: vec![station(Some("EHAM"), "Schiphol"), station(Some("KJFK"), "JFK")],
        };
        let source = FakeSource::new(&[
            ("EHAM", &report_for("EHAM")),
            ("KJFK", "not a metar report at all"),
        ]);

        let (collector, store) = collector_with(directory, source).await;
        let summary = collector.run().await.unwrap();

        assert_eq!(summary.stored, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn slow_fetches_time_out_and_count_as_failures() {
        let directory = FakeDirectory {
            stations: vec![station(Some("EHAM"), "Schiphol")],
        };
        let mut source = FakeSource::new(&[("EHAM", &report_for("EHAM"))]);
        source.delay = Some(Duration::from_secs(5));

        let store = ReportStore::open_in_memory().await.unwrap();
        let collector = Collector::builder()
            .store(store.clone())
            .directory(directory)
            .source(source)
            .timeout(Duration::from_millis(20))
            .build();

        let summary = collector.run().await.unwrap();
        assert_eq!(summary.stored, 0);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn bounded_retry_recovers_a_flaky_fetch() {
        let directory = FakeDirectory {
            stations: vec![station(Some("EHAM"), "Schiphol")],
        };
        let source = FakeSource::new(&[("EHAM", &report_for("EHAM"))]);
        source.fail_first_attempts.store(1, Ordering::SeqCst);

        let store = ReportStore::open_in_memory().await.unwrap();
        let collector = Collector::builder()
            .store(store.clone())
            .directory(directory)
            .source(source)
            .retries(1)
            .build();

        let summary = collector.run().await.unwrap();
        assert_eq!(summary.stored, 1);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn duplicate_runs_insert_duplicate_observations() {
        let directory = FakeDirectory {
            stations: vec![station(Some("EHAM"), "Schiphol")],
        };
        let source = FakeSource::new(&[("EHAM", &report_for("EHAM"))]);

        let (collector, store) = collector_with(directory, source).await;
        collector.run().await.unwrap();
        collector.run().await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_ne!(all[0].id, all[1].id);
    }
}
