//! SQLite-backed time-series storage with retention pruning.
//!
//! One table per metric kind, each indexed by timestamp. Timestamps are
//! stored as UTC milliseconds so ordering never depends on the local zone.

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::records::{
    DockerMetrics, HistorySeries, MetricKind, MetricRecord, NetworkMetrics, TimeSeriesPoint,
    UsageMetrics,
};
use crate::error::Result;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS cpu_metrics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp INTEGER NOT NULL,
        usage REAL NOT NULL
    );
    CREATE TABLE IF NOT EXISTS ram_metrics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp INTEGER NOT NULL,
        usage REAL NOT NULL,
        used_bytes INTEGER NOT NULL,
        total_bytes INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS disk_metrics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp INTEGER NOT NULL,
        usage REAL NOT NULL,
        used_bytes INTEGER NOT NULL,
        total_bytes INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS docker_metrics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp INTEGER NOT NULL,
        daemon_running INTEGER NOT NULL,
        containers_running INTEGER NOT NULL,
        containers_total INTEGER NOT NULL,
        images_count INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS network_metrics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp INTEGER NOT NULL,
        internet_connected INTEGER NOT NULL,
        ping_latency REAL NOT NULL,
        dns_working INTEGER NOT NULL
    );
";

/// Durable, append-only metric history
pub struct HistoryStore {
    conn: Mutex<Connection>,
}

impl HistoryStore {
    /// Open (or create) the database file at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self::from_connection(conn)?;
        log::info!("History store opened at {}", path.display());
        Ok(store)
    }

    /// Volatile store, mostly useful for tests and one-shot runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        for kind in MetricKind::ALL {
            let table = kind.table_name();
            conn.execute_batch(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_timestamp ON {table}(timestamp)"
            ))?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Append one record to the table of its kind.
    pub fn store(&self, record: &MetricRecord) -> Result<()> {
        let conn = self.conn.lock();
        let ts = to_millis(record.timestamp());

        match record {
            MetricRecord::Cpu(m) => {
                conn.prepare_cached("INSERT INTO cpu_metrics (timestamp, usage) VALUES (?1, ?2)")?
                    .execute(params![ts, m.usage])?;
            }
            MetricRecord::Ram(m) | MetricRecord::Disk(m) => {
                let sql = format!(
                    "INSERT INTO {} (timestamp, usage, used_bytes, total_bytes) VALUES (?1, ?2, ?3, ?4)",
                    record.kind().table_name()
                );
                conn.prepare_cached(&sql)?.execute(params![
                    ts,
                    m.usage,
                    bytes_to_sql(m.used_bytes),
                    bytes_to_sql(m.total_bytes)
                ])?;
            }
            MetricRecord::Docker(m) => {
                conn.prepare_cached(
                    "INSERT INTO docker_metrics \
                     (timestamp, daemon_running, containers_running, containers_total, images_count) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?
                .execute(params![
                    ts,
                    m.daemon_running,
                    m.containers_running,
                    m.containers_total,
                    m.images_count
                ])?;
            }
            MetricRecord::Network(m) => {
                conn.prepare_cached(
                    "INSERT INTO network_metrics (timestamp, internet_connected, ping_latency, dns_working) \
                     VALUES (?1, ?2, ?3, ?4)",
                )?
                .execute(params![ts, m.internet_connected, m.ping_latency_ms, m.dns_working])?;
            }
        }

        Ok(())
    }

    /// All records of `kind` newer than `now - window`, ascending by timestamp.
    pub fn query(&self, kind: MetricKind, window: Duration) -> Result<HistorySeries> {
        Ok(match kind {
            MetricKind::Cpu | MetricKind::Ram | MetricKind::Disk => {
                HistorySeries::Points(self.usage_points(kind, window)?)
            }
            MetricKind::Docker => HistorySeries::Docker(self.docker_history(window)?),
            MetricKind::Network => HistorySeries::Network(self.network_history(window)?),
        })
    }

    pub fn cpu_history(&self, window: Duration) -> Result<Vec<TimeSeriesPoint>> {
        self.usage_points(MetricKind::Cpu, window)
    }

    pub fn ram_history(&self, window: Duration) -> Result<Vec<TimeSeriesPoint>> {
        self.usage_points(MetricKind::Ram, window)
    }

    pub fn disk_history(&self, window: Duration) -> Result<Vec<TimeSeriesPoint>> {
        self.usage_points(MetricKind::Disk, window)
    }

    pub fn docker_history(&self, window: Duration) -> Result<Vec<DockerMetrics>> {
        self.select_since(
            "SELECT timestamp, daemon_running, containers_running, containers_total, images_count \
             FROM docker_metrics WHERE timestamp > ?1 ORDER BY timestamp ASC",
            window,
            |row| {
                Ok(DockerMetrics {
                    timestamp: from_millis(row.get(0)?),
                    daemon_running: row.get(1)?,
                    containers_running: row.get(2)?,
                    containers_total: row.get(3)?,
                    images_count: row.get(4)?,
                })
            },
        )
    }

    pub fn network_history(&self, window: Duration) -> Result<Vec<NetworkMetrics>> {
        self.select_since(
            "SELECT timestamp, internet_connected, ping_latency, dns_working \
             FROM network_metrics WHERE timestamp > ?1 ORDER BY timestamp ASC",
            window,
            |row| {
                Ok(NetworkMetrics {
                    timestamp: from_millis(row.get(0)?),
                    internet_connected: row.get(1)?,
                    ping_latency_ms: row.get(2)?,
                    dns_working: row.get(3)?,
                })
            },
        )
    }

    /// Full RAM/disk rows, including byte counts
    pub fn usage_history(&self, kind: MetricKind, window: Duration) -> Result<Vec<UsageMetrics>> {
        let sql = format!(
            "SELECT timestamp, usage, used_bytes, total_bytes FROM {} \
             WHERE timestamp > ?1 ORDER BY timestamp ASC",
            kind.table_name()
        );
        self.select_since(&sql, window, |row| {
            Ok(UsageMetrics {
                timestamp: from_millis(row.get(0)?),
                usage: row.get(1)?,
                used_bytes: bytes_from_sql(row.get(2)?),
                total_bytes: bytes_from_sql(row.get(3)?),
            })
        })
    }

    /// Delete every record, across all kinds, older than `now - retention`.
    /// Returns the number of rows removed.
    pub fn prune(&self, retention: Duration) -> Result<usize> {
        self.prune_before(cutoff(retention))
    }

    pub fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let conn = self.conn.lock();
        let cutoff = to_millis(cutoff);
        let mut total = 0;

        for kind in MetricKind::ALL {
            let table = kind.table_name();
            let removed = conn
                .prepare_cached(&format!("DELETE FROM {table} WHERE timestamp < ?1"))?
                .execute(params![cutoff])?;
            if removed > 0 {
                log::info!("Cleaned up {} old records from {}", removed, table);
            }
            total += removed;
        }

        Ok(total)
    }

    /// Number of stored rows for `kind`
    pub fn count(&self, kind: MetricKind) -> Result<usize> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table_name()),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    fn usage_points(&self, kind: MetricKind, window: Duration) -> Result<Vec<TimeSeriesPoint>> {
        let sql = format!(
            "SELECT timestamp, usage FROM {} WHERE timestamp > ?1 ORDER BY timestamp ASC",
            kind.table_name()
        );
        self.select_since(&sql, window, |row| {
            Ok(TimeSeriesPoint {
                timestamp: from_millis(row.get(0)?),
                value: row.get(1)?,
            })
        })
    }

    fn select_since<T, F>(&self, sql: &str, window: Duration, map: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let since = to_millis(cutoff(window));
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params![since], map)?;
        let items = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }
}

/// `now - window`, saturating at the earliest representable instant
fn cutoff(window: Duration) -> DateTime<Utc> {
    let delta = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
    Utc::now()
        .checked_sub_signed(delta)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn bytes_to_sql(bytes: u64) -> i64 {
    i64::try_from(bytes).unwrap_or(i64::MAX)
}

fn bytes_from_sql(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
