//! Durable storage for decoded observations.
//!
//! [`ReportStore`] wraps a single SQLite database opened once per process.
//! The handle is cheap to clone (the connection is shared) and safe for
//! concurrent use: writers serialize on the connection lock and every call
//! runs on the blocking thread pool, so async callers never stall the
//! runtime. An insert is visible to any query issued after it returns.

pub mod error;

use crate::store::error::StorageError;
use crate::types::observation::{NewObservation, Observation, SkyLayer};
use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::task;

const SELECT_OBSERVATION: &str = "SELECT id, station_code, observed_at, wind_speed, \
     wind_direction, wind_gust, wind_variable_from, wind_variable_to, visibility, \
     visibility_direction, dew_point, temperature, pressure, sky_layers FROM observations";

/// Handle to the observation database.
///
/// Construct one at process start with [`ReportStore::open`] (or
/// [`ReportStore::open_in_memory`] for tests) and pass clones to whatever
/// needs it; all clones share the same underlying connection.
#[derive(Clone)]
pub struct ReportStore {
    conn: Arc<Mutex<Connection>>,
}

impl ReportStore {
    /// Opens (creating if necessary) the database at `path` and applies the
    /// schema. Parent directories are created as needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        task::spawn_blocking(move || Self::open_blocking(&path)).await?
    }

    /// Opens a private in-memory database, mainly for tests.
    pub async fn open_in_memory() -> Result<Self, StorageError> {
        task::spawn_blocking(|| {
            let conn = Connection::open_in_memory()
                .map_err(|e| StorageError::Open(PathBuf::from(":memory:"), e))?;
            Self::initialize(conn)
        })
        .await?
    }

    fn open_blocking(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::CreateDir(parent.to_path_buf(), e))?;
            }
        }
        let conn = Connection::open(path).map_err(|e| StorageError::Open(path.to_path_buf(), e))?;
        // journal_mode returns the resulting mode as a row, so query it
        // instead of a plain execute.
        conn.query_row("PRAGMA journal_mode = WAL", [], |_row| Ok(()))?;
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(ReportStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Persists `observation`, assigning it an id, and returns the stored row.
    ///
    /// The database is touched exactly once; there is no implicit retry.
    pub async fn insert(&self, observation: NewObservation) -> Result<Observation, StorageError> {
        let sky = serde_json::to_string(&observation.sky_layers).map_err(|e| {
            StorageError::SkyEncode {
                station: observation.station_code.clone(),
                source: e,
            }
        })?;
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO observations (station_code, observed_at, wind_speed, \
                 wind_direction, wind_gust, wind_variable_from, wind_variable_to, visibility, \
                 visibility_direction, dew_point, temperature, pressure, sky_layers) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    observation.station_code,
                    observation.observed_at,
                    observation.wind_speed,
                    observation.wind_direction,
                    observation.wind_gust,
                    observation.wind_variable_from,
                    observation.wind_variable_to,
                    observation.visibility,
                    observation.visibility_direction,
                    observation.dew_point,
                    observation.temperature,
                    observation.pressure,
                    sky,
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!(
                "inserted observation {} for station {}",
                id, observation.station_code
            );
            let stored = conn.query_row(
                &format!("{} WHERE id = ?1", SELECT_OBSERVATION),
                params![id],
                row_to_observation,
            )?;
            Ok(stored)
        })
        .await
    }

    /// Fetches one observation by id.
    pub async fn get(&self, id: i64) -> Result<Option<Observation>, StorageError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("{} WHERE id = ?1", SELECT_OBSERVATION),
                params![id],
                row_to_observation,
            )
            .optional()
            .map_err(Into::into)
        })
        .await
    }

    /// Every stored observation, ordered by id ascending.
    pub async fn list_all(&self) -> Result<Vec<Observation>, StorageError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{} ORDER BY id ASC", SELECT_OBSERVATION))?;
            let rows = stmt.query_map([], row_to_observation)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
        .await
    }

    /// Observations for `station_code`, bounded by `observed_at` within
    /// `[start, end]` inclusive when bounds are given, ordered by
    /// `observed_at` ascending. An absent bound leaves that side unbounded.
    pub async fn query(
        &self,
        station_code: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Observation>, StorageError> {
        let station = station_code.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE station_code = ?1 \
                 AND (?2 IS NULL OR observed_at >= ?2) \
                 AND (?3 IS NULL OR observed_at <= ?3) \
                 ORDER BY observed_at ASC",
                SELECT_OBSERVATION
            ))?;
            let rows = stmt.query_map(params![station, start, end], row_to_observation)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
        .await
    }

    /// Deletes one observation, reporting whether a row existed.
    pub async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        self.with_conn(move |conn| {
            let removed = conn.execute("DELETE FROM observations WHERE id = ?1", params![id])?;
            Ok(removed > 0)
        })
        .await
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            f(&guard)
        })
        .await?
    }
}

fn row_to_observation(row: &Row<'_>) -> rusqlite::Result<Observation> {
    let sky_json: String = row.get(13)?;
    let sky_layers: Vec<SkyLayer> = serde_json::from_str(&sky_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(13, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Observation {
        id: row.get(0)?,
        station_code: row.get(1)?,
        observed_at: row.get(2)?,
        wind_speed: row.get(3)?,
        wind_direction: row.get(4)?,
        wind_gust: row.get(5)?,
        wind_variable_from: row.get(6)?,
        wind_variable_to: row.get(7)?,
        visibility: row.get(8)?,
        visibility_direction: row.get(9)?,
        dew_point: row.get(10)?,
        temperature: row.get(11)?,
        pressure: row.get(12)?,
        sky_layers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::observation::{SkyCover, SkyLayer};
    use chrono::TimeZone;
    use futures_util::future::join_all;

    fn sample(station: &str, observed_at: Option<DateTime<Utc>>) -> NewObservation {
        let mut obs = NewObservation::for_station(station);
        obs.observed_at = observed_at;
        obs.temperature = Some(18.0);
        obs.wind_speed = Some(4.1);
        obs.sky_layers = vec![SkyLayer {
            cover: SkyCover::Scattered,
            altitude: Some(1219.2),
        }];
        obs
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 25, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = ReportStore::open_in_memory().await.unwrap();
        let new = sample("EHAM", Some(at(10)));

        let stored = store.insert(new.clone()).await.unwrap();
        let fetched = store.get(stored.id).await.unwrap().unwrap();

        assert_eq!(fetched, stored);
        assert_eq!(fetched.station_code, new.station_code);
        assert_eq!(fetched.observed_at, new.observed_at);
        assert_eq!(fetched.wind_speed, new.wind_speed);
        assert_eq!(fetched.temperature, new.temperature);
        assert_eq!(fetched.sky_layers, new.sky_layers);
    }

    #[tokio::test]
    async fn get_missing_id_is_none() {
        let store = ReportStore::open_in_memory().await.unwrap();
        assert!(store.get(4242).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_all_orders_by_id() {
        let store = ReportStore::open_in_memory().await.unwrap();
        for hour in [12, 10, 11] {
            store.insert(sample("EHAM", Some(at(hour)))).await.unwrap();
        }

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|pair| pair[0].id < pair[1].id));
    }

    #[tokio::test]
    async fn query_filters_bounds_inclusively_and_orders_by_time() {
        let store = ReportStore::open_in_memory().await.unwrap();
        // Insert out of chronological order on purpose.
        for hour in [12, 10, 11] {
            store.insert(sample("EHAM", Some(at(hour)))).await.unwrap();
        }
        store.insert(sample("KJFK", Some(at(11)))).await.unwrap();

        let window = store
            .query("EHAM", Some(at(10)), Some(at(11)))
            .await
            .unwrap();
        let times: Vec<_> = window.iter().map(|o| o.observed_at.unwrap()).collect();
        assert_eq!(times, vec![at(10), at(11)]);

        let unbounded = store.query("EHAM", None, None).await.unwrap();
        assert_eq!(unbounded.len(), 3);

        let open_start = store.query("EHAM", None, Some(at(10))).await.unwrap();
        assert_eq!(open_start.len(), 1);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_existed() {
        let store = ReportStore::open_in_memory().await.unwrap();
        let stored = store.insert(sample("EHAM", Some(at(10)))).await.unwrap();

        assert!(store.delete(stored.id).await.unwrap());
        assert!(!store.delete(stored.id).await.unwrap());
        assert!(store.get(stored.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_inserts_all_land_with_distinct_ids() {
        let store = ReportStore::open_in_memory().await.unwrap();

        let tasks: Vec<_> = (0..16u32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .insert(sample("EHAM", Some(at(i % 24))))
                        .await
                        .unwrap()
                        .id
                })
            })
            .collect();
        let mut ids: Vec<i64> = join_all(tasks)
            .await
            .into_iter()
            .map(|res| res.unwrap())
            .collect();

        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 16);
        assert_eq!(store.list_all().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn open_creates_the_database_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observations.db");

        let store = ReportStore::open(&path).await.unwrap();
        store.insert(sample("EHAM", Some(at(10)))).await.unwrap();
        drop(store);

        let reopened = ReportStore::open(&path).await.unwrap();
        assert_eq!(reopened.list_all().await.unwrap().len(), 1);
    }
}
