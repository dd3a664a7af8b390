use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use devex::core::process::{
    PortEnumerator, PortRecord, ProcessManager, ProcessRecord, ProcessSource, ProcessTerminator,
    Protocol,
};
use devex::error::{DevexError, Result};

fn process(pid: u32, name: &str) -> ProcessRecord {
    ProcessRecord {
        pid,
        name: name.to_string(),
        command_line: format!("/usr/bin/{}", name),
        username: "dev".to_string(),
        cpu_percent: 0.0,
        memory_bytes: u64::from(pid) * 4096,
        start_time: Utc::now(),
    }
}

fn socket(pid: u32, port: u16, protocol: Protocol) -> PortRecord {
    PortRecord {
        port,
        protocol,
        local_address: "0.0.0.0".to_string(),
        state: "LISTEN".to_string(),
        pid,
    }
}

/// Alternates between two distinct generations on every enumeration
struct AlternatingSource {
    calls: AtomicUsize,
}

impl ProcessSource for AlternatingSource {
    fn processes(&self) -> Result<Vec<ProcessRecord>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let (name, count) = if call % 2 == 0 { ("even", 5) } else { ("odd", 7) };
        // Slow enough for readers to overlap with the refresh
        std::thread::sleep(Duration::from_millis(2));
        Ok((1..=count).map(|pid| process(pid, name)).collect())
    }
}

struct Fixed(Vec<ProcessRecord>);

impl ProcessSource for Fixed {
    fn processes(&self) -> Result<Vec<ProcessRecord>> {
        Ok(self.0.clone())
    }
}

struct Sockets(Vec<PortRecord>);

impl PortEnumerator for Sockets {
    fn tool(&self) -> &'static str {
        "fixture"
    }

    fn enumerate(&self) -> Result<Vec<PortRecord>> {
        Ok(self.0.clone())
    }
}

/// Records every pid it was asked to terminate
#[derive(Default)]
struct Recorder {
    killed: parking_lot::Mutex<Vec<u32>>,
}

impl ProcessTerminator for Recorder {
    fn terminate(&self, pid: u32) -> Result<()> {
        self.killed.lock().push(pid);
        Ok(())
    }
}

struct Refuse;

impl ProcessTerminator for Refuse {
    fn terminate(&self, pid: u32) -> Result<()> {
        Err(DevexError::termination(format!("process {} not found", pid)))
    }
}

fn manager_with(
    source: Arc<dyn ProcessSource>,
    sockets: Vec<PortRecord>,
    terminator: Arc<dyn ProcessTerminator>,
) -> Arc<ProcessManager> {
    Arc::new(ProcessManager::new(
        source,
        Arc::new(Sockets(sockets)),
        terminator,
        Duration::from_secs(30),
    ))
}

#[test]
fn test_readers_never_see_a_mixed_generation() {
    let manager = manager_with(
        Arc::new(AlternatingSource {
            calls: AtomicUsize::new(0),
        }),
        Vec::new(),
        Arc::new(Refuse),
    );
    manager.refresh();

    let done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..50 {
                manager.refresh();
            }
            done.store(true, Ordering::SeqCst);
        });

        for _ in 0..4 {
            scope.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    let snapshot = manager.get_processes();
                    let first = &snapshot[0].process.name;
                    assert!(snapshot.iter().all(|p| &p.process.name == first));

                    let expected = if first == "even" { 5 } else { 7 };
                    assert_eq!(snapshot.len(), expected);
                }
            });
        }
    });
}

#[test]
fn test_cache_is_bounded_in_enumeration_order() {
    let source = Fixed((1..=500).map(|pid| process(pid, "worker")).collect());
    let manager = manager_with(Arc::new(source), Vec::new(), Arc::new(Refuse));

    manager.refresh();
    assert_eq!(manager.get_processes().len(), 300);

    manager.set_max_processes(25);
    manager.refresh();
    let processes = manager.get_processes();
    assert_eq!(processes.len(), 25);
    assert_eq!(processes.last().unwrap().process.pid, 25);
}

#[test]
fn test_join_attaches_every_socket_to_its_owner() {
    let source = Fixed(vec![process(10, "nginx"), process(20, "dnsmasq"), process(30, "idle")]);
    let sockets = vec![
        socket(10, 80, Protocol::Tcp),
        socket(10, 443, Protocol::Tcp),
        socket(20, 53, Protocol::Udp),
        // Owner not in the process list
        socket(99, 9999, Protocol::Tcp),
    ];
    let manager = manager_with(Arc::new(source), sockets, Arc::new(Refuse));
    manager.refresh();

    let processes = manager.get_processes();
    assert_eq!(processes.len(), 3);

    let nginx = &processes[0];
    assert_eq!(nginx.ports.len(), 2);
    assert!(nginx.ports.iter().all(|p| p.pid == 10));

    assert_eq!(processes[1].ports[0].protocol, Protocol::Udp);
    assert!(processes[2].ports.is_empty());
    assert!(manager.search_by_port(9999).is_empty());
}

#[test]
fn test_search_by_port_returns_all_owners() {
    let source = Fixed(vec![process(1, "a"), process(2, "b"), process(3, "c")]);
    let sockets = vec![
        socket(1, 5353, Protocol::Udp),
        socket(3, 5353, Protocol::Udp),
        socket(2, 22, Protocol::Tcp),
    ];
    let manager = manager_with(Arc::new(source), sockets, Arc::new(Refuse));
    manager.refresh();

    let pids: Vec<u32> = manager
        .search_by_port(5353)
        .iter()
        .map(|p| p.process.pid)
        .collect();
    assert_eq!(pids, vec![1, 3]);
    assert!(manager.search_by_port(8080).is_empty());
}

#[test]
fn test_kill_failure_leaves_cache_unchanged() {
    let manager = manager_with(
        Arc::new(Fixed(vec![process(1, "a"), process(2, "b")])),
        Vec::new(),
        Arc::new(Refuse),
    );
    manager.refresh();
    let before = manager.get_processes();
    let updated = manager.last_update_time();

    let err = manager.kill_process_by_pid(999_999).unwrap_err();
    assert!(matches!(err, DevexError::Termination(_)));

    std::thread::sleep(Duration::from_millis(50));
    assert!(Arc::ptr_eq(&before, &manager.get_processes()));
    assert_eq!(manager.last_update_time(), updated);
}

#[test]
fn test_kill_success_triggers_refresh() {
    let recorder = Arc::new(Recorder::default());
    let manager = manager_with(
        Arc::new(Fixed(vec![process(7, "victim")])),
        Vec::new(),
        recorder.clone(),
    );
    manager.refresh();
    let before = manager.get_processes();

    manager.kill_process_by_pid(7).unwrap();
    assert_eq!(*recorder.killed.lock(), vec![7]);

    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while Arc::ptr_eq(&before, &manager.get_processes()) {
        assert!(std::time::Instant::now() < deadline, "cache never refreshed");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_periodic_refresh_and_idempotent_stop() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .build()
        .unwrap();

    let manager = Arc::new(ProcessManager::new(
        Arc::new(AlternatingSource {
            calls: AtomicUsize::new(0),
        }),
        Arc::new(Sockets(Vec::new())),
        Arc::new(Refuse),
        Duration::from_millis(40),
    ));

    manager.start(rt.handle()).unwrap();
    assert!(manager.last_update_time().is_some());

    let first = manager.last_update_time();
    std::thread::sleep(Duration::from_millis(200));
    assert!(manager.last_update_time() > first);

    manager.stop();
    manager.stop();
    assert!(manager.start(rt.handle()).is_err());
}

#[cfg(unix)]
#[test]
fn test_kill_nonexistent_pid_with_system_command() {
    use devex::platform::CommandTerminator;

    let manager = manager_with(
        Arc::new(Fixed(vec![process(1, "init")])),
        Vec::new(),
        Arc::new(CommandTerminator::default()),
    );
    manager.refresh();
    let before = manager.get_processes();

    let err = manager.kill_process_by_pid(999_999_999).unwrap_err();
    assert!(matches!(err, DevexError::Termination(_)));
    assert!(Arc::ptr_eq(&before, &manager.get_processes()));
}
