use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A running process as reported by the process source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub command_line: String,
    pub username: String,
    pub cpu_percent: f32,
    pub memory_bytes: u64,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// `udp` anywhere in the marker (any case) means UDP; everything else is TCP.
    pub fn classify(marker: &str) -> Self {
        if marker.to_ascii_lowercase().contains("udp") {
            Protocol::Udp
        } else {
            Protocol::Tcp
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => f.write_str("TCP"),
            Protocol::Udp => f.write_str("UDP"),
        }
    }
}

/// An open socket owned by a process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRecord {
    pub port: u16,
    pub protocol: Protocol,
    /// Local address without the port, e.g. `0.0.0.0` or `[::]`
    pub local_address: String,
    pub state: String,
    pub pid: u32,
}

/// A process joined with every socket it owns. `ports` is empty, never
/// missing, when none were found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessWithPorts {
    pub process: ProcessRecord,
    pub ports: Vec<PortRecord>,
}

impl ProcessWithPorts {
    pub fn uses_port(&self, port: u16) -> bool {
        self.ports.iter().any(|p| p.port == port)
    }
}
