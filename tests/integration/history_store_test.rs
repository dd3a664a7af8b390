use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use tempfile::TempDir;

use devex::core::history::{
    CpuMetrics, DockerMetrics, HistorySeries, HistoryStore, MetricKind, MetricRecord,
    NetworkMetrics, UsageMetrics,
};

fn cpu_at(minutes_ago: i64, usage: f64) -> MetricRecord {
    MetricRecord::Cpu(CpuMetrics {
        timestamp: Utc::now() - ChronoDuration::minutes(minutes_ago),
        usage,
    })
}

#[test]
fn test_store_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("metrics.db");

    {
        let store = HistoryStore::open(&db_path).unwrap();
        store.store(&cpu_at(1, 12.0)).unwrap();
        store
            .store(&MetricRecord::Ram(UsageMetrics {
                timestamp: Utc::now(),
                usage: 50.0,
                used_bytes: 8 << 30,
                total_bytes: 16 << 30,
            }))
            .unwrap();
    }

    let store = HistoryStore::open(&db_path).unwrap();
    assert_eq!(store.count(MetricKind::Cpu).unwrap(), 1);

    let ram = store.usage_history(MetricKind::Ram, Duration::from_secs(600)).unwrap();
    assert_eq!(ram.len(), 1);
    assert_eq!(ram[0].total_bytes, 16 << 30);
}

#[test]
fn test_retention_removes_only_old_records() {
    let temp_dir = TempDir::new().unwrap();
    let store = HistoryStore::open(&temp_dir.path().join("metrics.db")).unwrap();

    store.store(&cpu_at(90, 10.0)).unwrap();
    store.store(&cpu_at(61, 20.0)).unwrap();
    store.store(&cpu_at(30, 30.0)).unwrap();
    store.store(&cpu_at(0, 40.0)).unwrap();
    store
        .store(&MetricRecord::Network(NetworkMetrics {
            timestamp: Utc::now() - ChronoDuration::minutes(120),
            internet_connected: true,
            ping_latency_ms: 20.0,
            dns_working: true,
        }))
        .unwrap();

    let removed = store.prune(Duration::from_secs(3600)).unwrap();
    assert_eq!(removed, 3);

    let points = store.cpu_history(Duration::from_secs(24 * 3600)).unwrap();
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![30.0, 40.0]);
    assert_eq!(store.count(MetricKind::Network).unwrap(), 0);
}

#[test]
fn test_query_window_and_order() {
    let store = HistoryStore::open_in_memory().unwrap();

    // Inserted out of order on purpose
    store.store(&cpu_at(2, 2.0)).unwrap();
    store.store(&cpu_at(20, 20.0)).unwrap();
    store.store(&cpu_at(4, 4.0)).unwrap();

    let points = store.cpu_history(Duration::from_secs(10 * 60)).unwrap();
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![4.0, 2.0]);
    assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn test_query_shapes_per_kind() {
    let store = HistoryStore::open_in_memory().unwrap();
    store
        .store(&MetricRecord::Docker(DockerMetrics {
            timestamp: Utc::now(),
            daemon_running: true,
            containers_running: 2,
            containers_total: 5,
            images_count: 9,
        }))
        .unwrap();

    match store.query(MetricKind::Docker, Duration::from_secs(60)).unwrap() {
        HistorySeries::Docker(rows) => {
            assert_eq!(rows.len(), 1);
            assert!(rows[0].daemon_running);
            assert_eq!(rows[0].containers_total, 5);
            assert_eq!(rows[0].images_count, 9);
        }
        other => panic!("unexpected series: {:?}", other),
    }

    assert!(matches!(
        store.query(MetricKind::Disk, Duration::from_secs(60)).unwrap(),
        HistorySeries::Points(ref p) if p.is_empty()
    ));
}
