use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use devex::core::history::{
    Collector, HistoryStore, MetricKind, NetworkSnapshot, Pruner, RetentionPolicy,
    SnapshotProvider,
};
use devex::core::SchedulerState;
use devex::error::{DevexError, Result};

/// Reports a fixed CPU value and nothing else
struct CpuOnly(&'static str);

impl SnapshotProvider for CpuOnly {
    fn cpu_info(&self) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// CPU is unavailable on the first call and fine afterwards
struct FlakyCpu {
    calls: AtomicUsize,
}

impl SnapshotProvider for FlakyCpu {
    fn cpu_info(&self) -> Result<String> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(DevexError::provider_unavailable("CPU: Error"))
        } else {
            Ok("CPU: 10.0%".to_string())
        }
    }
}

/// CPU and network readings
struct CpuAndNetwork;

impl SnapshotProvider for CpuAndNetwork {
    fn cpu_info(&self) -> Result<String> {
        Ok("CPU: 20.0%".to_string())
    }

    fn network_status(&self) -> Result<NetworkSnapshot> {
        Ok(NetworkSnapshot {
            internet_connected: true,
            ping_latency_ms: 8.0,
            dns_working: true,
        })
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .build()
        .unwrap()
}

#[test]
fn test_sample_is_queryable_with_its_value() {
    let store = Arc::new(HistoryStore::open_in_memory().unwrap());
    let collector = Collector::new(
        Arc::clone(&store),
        Arc::new(CpuOnly("CPU: 42.3%")),
        Duration::from_secs(10),
    );

    let report = collector.collect();
    assert_eq!(report.stored, vec![MetricKind::Cpu]);

    let points = store.cpu_history(Duration::from_secs(60)).unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].value, 42.3);
}

#[test]
fn test_failed_tick_does_not_block_the_next() {
    let store = Arc::new(HistoryStore::open_in_memory().unwrap());
    let collector = Collector::new(
        Arc::clone(&store),
        Arc::new(FlakyCpu {
            calls: AtomicUsize::new(0),
        }),
        Duration::from_secs(10),
    );

    let first = collector.collect();
    assert!(first.skipped.contains(&MetricKind::Cpu));
    assert_eq!(store.count(MetricKind::Cpu).unwrap(), 0);

    let second = collector.collect();
    assert!(second.stored.contains(&MetricKind::Cpu));
    assert_eq!(store.count(MetricKind::Cpu).unwrap(), 1);
}

#[test]
fn test_unavailable_kinds_store_nothing() {
    let store = Arc::new(HistoryStore::open_in_memory().unwrap());
    let collector = Collector::new(
        Arc::clone(&store),
        Arc::new(CpuOnly("CPU: 1.0%")),
        Duration::from_secs(10),
    );

    let report = collector.collect();
    assert_eq!(report.skipped.len(), 4);
    for kind in [MetricKind::Ram, MetricKind::Disk, MetricKind::Docker, MetricKind::Network] {
        assert_eq!(store.count(kind).unwrap(), 0);
    }
}

#[test]
fn test_collector_samples_on_interval_until_stopped() {
    let rt = runtime();
    let store = Arc::new(HistoryStore::open_in_memory().unwrap());
    let collector = Arc::new(Collector::new(
        Arc::clone(&store),
        Arc::new(CpuOnly("CPU: 5.0%")),
        Duration::from_millis(50),
    ));

    collector.start(rt.handle()).unwrap();
    // The first sample is taken before start returns
    assert!(store.count(MetricKind::Cpu).unwrap() >= 1);
    assert_eq!(collector.state(), SchedulerState::Running);

    std::thread::sleep(Duration::from_millis(300));
    assert!(store.count(MetricKind::Cpu).unwrap() >= 3);

    collector.stop();
    collector.stop();
    assert_eq!(collector.state(), SchedulerState::Stopped);

    // Let a cycle that was already running finish
    std::thread::sleep(Duration::from_millis(100));
    let settled = store.count(MetricKind::Cpu).unwrap();
    std::thread::sleep(Duration::from_millis(250));
    assert_eq!(store.count(MetricKind::Cpu).unwrap(), settled);

    assert!(collector.start(rt.handle()).is_err());
}

#[test]
fn test_stop_before_start_is_harmless() {
    let store = Arc::new(HistoryStore::open_in_memory().unwrap());
    let collector = Collector::new(store, Arc::new(CpuOnly("CPU: 1.0%")), Duration::from_secs(1));

    collector.stop();
    collector.stop();
    assert_eq!(collector.state(), SchedulerState::Stopped);
}

#[test]
fn test_pruner_lifecycle() {
    let rt = runtime();
    let store = Arc::new(HistoryStore::open_in_memory().unwrap());
    let pruner = Arc::new(Pruner::new(Arc::clone(&store), RetentionPolicy::default()));

    pruner.start(rt.handle()).unwrap();
    assert!(pruner.start(rt.handle()).is_err());

    pruner.stop();
    pruner.stop();
    assert_eq!(pruner.state(), SchedulerState::Stopped);
    assert_eq!(pruner.prune_now(), 0);
}

#[test]
fn test_write_failure_skips_only_that_kind() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("metrics.db");
    let store = Arc::new(HistoryStore::open(&db_path).unwrap());

    // Break the CPU table behind the store's back
    let other = rusqlite::Connection::open(&db_path).unwrap();
    other.execute_batch("DROP TABLE cpu_metrics").unwrap();

    let collector = Collector::new(
        Arc::clone(&store),
        Arc::new(CpuAndNetwork),
        Duration::from_secs(10),
    );

    let report = collector.collect();
    assert!(report.skipped.contains(&MetricKind::Cpu));
    assert_eq!(report.stored, vec![MetricKind::Network]);
    assert_eq!(store.count(MetricKind::Network).unwrap(), 1);
    assert!(store.count(MetricKind::Cpu).is_err());

    // The next cycle still runs
    let again = collector.collect();
    assert!(!again.overlapped);
    assert_eq!(store.count(MetricKind::Network).unwrap(), 2);
}
