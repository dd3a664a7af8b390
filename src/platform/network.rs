//! Connectivity probe: DNS resolution and TCP connect latency.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::core::history::NetworkSnapshot;

const PROBE_HOST: &str = "www.google.com:443";
/// Used when DNS is down, so connectivity and DNS are reported separately
const FALLBACK_ADDR: &str = "1.1.1.1:443";

/// Probe DNS and internet reachability. Never fails; every check that does
/// not finish within `timeout` counts as down.
pub fn network_snapshot(timeout: Duration) -> NetworkSnapshot {
    let resolved = resolve(PROBE_HOST, timeout);
    let dns_working = resolved.is_some();

    let target = resolved.or_else(|| FALLBACK_ADDR.parse().ok());
    let latency = target.and_then(|addr| connect_latency(addr, timeout));

    NetworkSnapshot {
        internet_connected: latency.is_some(),
        ping_latency_ms: latency.map(|d| d.as_secs_f64() * 1000.0).unwrap_or(0.0),
        dns_working,
    }
}

/// Resolve `host` on a helper thread; the system resolver has no timeout of
/// its own.
fn resolve(host: &'static str, timeout: Duration) -> Option<SocketAddr> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let addr = host.to_socket_addrs().ok().and_then(|mut addrs| addrs.next());
        let _ = tx.send(addr);
    });

    match rx.recv_timeout(timeout) {
        Ok(addr) => addr,
        Err(_) => {
            log::debug!("DNS lookup for {} timed out", host);
            None
        }
    }
}

fn connect_latency(addr: SocketAddr, timeout: Duration) -> Option<Duration> {
    let started = Instant::now();
    match TcpStream::connect_timeout(&addr, timeout) {
        Ok(_) => Some(started.elapsed()),
        Err(e) => {
            log::debug!("connect to {} failed: {}", addr, e);
            None
        }
    }
}
