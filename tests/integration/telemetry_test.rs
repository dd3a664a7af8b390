use chrono::Utc;
use std::sync::Arc;
use tempfile::TempDir;

use devex::core::history::{
    DockerSnapshot, HistorySeries, HistoryStore, MetricKind, NetworkSnapshot, SnapshotProvider,
};
use devex::core::process::{
    PortEnumerator, PortRecord, ProcessRecord, ProcessSource, ProcessTerminator, Protocol,
};
use devex::core::{SchedulerState, Telemetry, TelemetryConfig, TelemetryParts};
use devex::error::{DevexError, Result};

struct Host;

impl SnapshotProvider for Host {
    fn cpu_info(&self) -> Result<String> {
        Ok("CPU: 42.3%".to_string())
    }

    fn ram_info(&self) -> Result<String> {
        Ok("RAM: 61.0%".to_string())
    }

    fn ram_details(&self) -> Result<String> {
        Ok("Used: 9.8 GB\nTotal: 16.0 GB".to_string())
    }

    fn disk_info(&self) -> Result<String> {
        Ok("Disk: No data".to_string())
    }

    fn docker_status(&self) -> Result<DockerSnapshot> {
        Ok(DockerSnapshot::default())
    }

    fn network_status(&self) -> Result<NetworkSnapshot> {
        Ok(NetworkSnapshot {
            internet_connected: true,
            ping_latency_ms: 12.5,
            dns_working: true,
        })
    }
}

struct Processes;

impl ProcessSource for Processes {
    fn processes(&self) -> Result<Vec<ProcessRecord>> {
        Ok(vec![
            ProcessRecord {
                pid: 100,
                name: "postgres".to_string(),
                command_line: "postgres -D /var/lib/postgres".to_string(),
                username: "postgres".to_string(),
                cpu_percent: 3.5,
                memory_bytes: 256 << 20,
                start_time: Utc::now(),
            },
            ProcessRecord {
                pid: 200,
                name: "node".to_string(),
                command_line: "node server.js".to_string(),
                username: "dev".to_string(),
                cpu_percent: 12.0,
                memory_bytes: 128 << 20,
                start_time: Utc::now(),
            },
        ])
    }
}

struct Ports;

impl PortEnumerator for Ports {
    fn tool(&self) -> &'static str {
        "fixture"
    }

    fn enumerate(&self) -> Result<Vec<PortRecord>> {
        Ok(vec![PortRecord {
            port: 5432,
            protocol: Protocol::Tcp,
            local_address: "127.0.0.1".to_string(),
            state: "LISTEN".to_string(),
            pid: 100,
        }])
    }
}

struct NoKill;

impl ProcessTerminator for NoKill {
    fn terminate(&self, pid: u32) -> Result<()> {
        Err(DevexError::termination(format!("refusing to kill {}", pid)))
    }
}

fn telemetry(store: Arc<HistoryStore>) -> Telemetry {
    let parts = TelemetryParts {
        store,
        provider: Arc::new(Host),
        source: Arc::new(Processes),
        ports: Arc::new(Ports),
        terminator: Arc::new(NoKill),
    };
    Telemetry::new(parts, &TelemetryConfig::default()).unwrap()
}

#[test]
fn test_start_records_first_sample_and_loads_processes() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(HistoryStore::open(&temp_dir.path().join("metrics.db")).unwrap());
    let telemetry = telemetry(Arc::clone(&store));

    telemetry.start().unwrap();

    match telemetry.history(MetricKind::Cpu, 5) {
        HistorySeries::Points(points) => {
            assert_eq!(points.len(), 1);
            assert_eq!(points[0].value, 42.3);
        }
        other => panic!("unexpected series: {:?}", other),
    }
    // "No data" disk snapshot is skipped
    assert!(telemetry.history(MetricKind::Disk, 5).is_empty());
    assert_eq!(telemetry.history(MetricKind::Network, 5).len(), 1);

    assert_eq!(telemetry.processes().len(), 2);
    assert_eq!(telemetry.search_by_port(5432)[0].process.name, "postgres");
    assert_eq!(telemetry.top_by_cpu(1)[0].process.pid, 200);
    assert_eq!(telemetry.top_by_memory(1)[0].process.pid, 100);

    assert!(telemetry.kill_process(100).is_err());

    telemetry.stop();
    telemetry.stop();
    assert_eq!(telemetry.collector().state(), SchedulerState::Stopped);
    assert_eq!(telemetry.process_manager().state(), SchedulerState::Stopped);
    telemetry.shutdown();
}

#[test]
fn test_history_window_of_zero_is_empty() {
    let store = Arc::new(HistoryStore::open_in_memory().unwrap());
    let telemetry = telemetry(store);

    telemetry.collect_now();
    assert!(telemetry.history(MetricKind::Cpu, 0).is_empty());
    assert_eq!(telemetry.history(MetricKind::Cpu, 60).len(), 1);
    telemetry.shutdown();
}

#[test]
fn test_config_drives_the_process_bound() {
    let mut config = TelemetryConfig::default();
    config.max_processes = 1;

    let parts = TelemetryParts {
        store: Arc::new(HistoryStore::open_in_memory().unwrap()),
        provider: Arc::new(Host),
        source: Arc::new(Processes),
        ports: Arc::new(Ports),
        terminator: Arc::new(NoKill),
    };
    let telemetry = Telemetry::new(parts, &config).unwrap();

    assert!(telemetry.refresh_processes());
    assert_eq!(telemetry.processes().len(), 1);
    assert_eq!(telemetry.prune_now(), 0);
    telemetry.shutdown();
}

#[test]
fn test_history_read_failure_yields_empty_series() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("metrics.db");
    let store = Arc::new(HistoryStore::open(&db_path).unwrap());
    let telemetry = telemetry(Arc::clone(&store));

    telemetry.collect_now();
    assert_eq!(telemetry.history(MetricKind::Network, 60).len(), 1);

    let other = rusqlite::Connection::open(&db_path).unwrap();
    other.execute_batch("DROP TABLE cpu_metrics").unwrap();

    let series = telemetry.history(MetricKind::Cpu, 60);
    assert!(series.is_empty());
    assert!(matches!(series, HistorySeries::Points(_)));

    // Other kinds are unaffected
    assert_eq!(telemetry.history(MetricKind::Network, 60).len(), 1);
    telemetry.shutdown();
}
