//! One-shot METAR collection pass.
//!
//! Fetches the station list from the airport directory, collects every
//! station's latest report and stores the decoded observations. Run it from
//! cron (or any scheduler) for periodic collection.
//!
//! Configuration comes from the environment:
//! - `METARSCAN_DB`: database path (default `metarscan.db`)
//! - `DIRECTORY_URL`: base URL of the airport directory API (default `http://localhost:8000`)
//! - `METAR_BASE_URL`: base URL of the report source (default: the NOAA mirror)
//! - `COLLECT_CONCURRENCY`, `COLLECT_TIMEOUT_SECS`, `COLLECT_RETRIES`

use log::{error, info};
use metarscan::{
    Collector, HttpStationDirectory, MetarScanError, NoaaReportSource, ReportStore, NOAA_BASE_URL,
};
use std::env;
use std::error::Error;
use std::str::FromStr;
use std::time::Duration;

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(ref e) = run().await {
        error!("collector run failed: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            error!("caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), MetarScanError> {
    let db_path = env_or("METARSCAN_DB", "metarscan.db");
    let directory_url = env_or("DIRECTORY_URL", "http://localhost:8000");
    let metar_base_url = env_or("METAR_BASE_URL", NOAA_BASE_URL);
    let concurrency: usize = env_parse("COLLECT_CONCURRENCY", 8);
    let timeout_secs: u64 = env_parse("COLLECT_TIMEOUT_SECS", 10);
    let retries: u32 = env_parse("COLLECT_RETRIES", 0);

    let store = ReportStore::open(&db_path).await?;
    let collector = Collector::builder()
        .store(store)
        .directory(HttpStationDirectory::new(directory_url))
        .source(NoaaReportSource::with_base_url(metar_base_url))
        .concurrency(concurrency)
        .timeout(Duration::from_secs(timeout_secs))
        .retries(retries)
        .build();

    let summary = collector.run().await?;
    info!(
        "done: {} stations, {} stored, {} failed, {} without code",
        summary.stations, summary.stored, summary.failed, summary.skipped_no_code
    );
    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
