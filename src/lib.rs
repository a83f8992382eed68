mod collector;
mod error;
mod metar;
mod metarscan;
mod stats;
mod store;
mod types;

pub use error::MetarScanError;
pub use metarscan::*;

pub use collector::{
    Collector, HttpStationDirectory, NoaaReportSource, ReportSource, RunSummary, StationDirectory,
    NOAA_BASE_URL,
};
pub use metar::{parse_report, parse_report_at};
pub use stats::{compute_stats, MetricSummary, StatsSummary};
pub use store::ReportStore;
pub use types::observation::{NewObservation, Observation, SkyCover, SkyLayer};
pub use types::station::Station;

pub use collector::error::{CollectError, DirectoryError, FetchReportError};
pub use metar::error::MalformedReportError;
pub use stats::error::StatsError;
pub use store::error::StorageError;
