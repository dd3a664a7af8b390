use std::time::Duration;

use super::{run_listing_tool, split_host_port};
use crate::core::process::{PortEnumerator, PortRecord, Protocol};
use crate::error::Result;

/// Windows socket listing via `netstat`
pub struct NetstatEnumerator {
    timeout: Duration,
}

impl NetstatEnumerator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl PortEnumerator for NetstatEnumerator {
    fn tool(&self) -> &'static str {
        "netstat"
    }

    fn enumerate(&self) -> Result<Vec<PortRecord>> {
        let output = run_listing_tool("netstat", &["-ano"], self.timeout)?;
        Ok(parse_netstat_output(&output))
    }
}

/// Parse Windows `netstat -ano` output.
///
/// ```text
///   Proto  Local Address          Foreign Address        State           PID
///   TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       1052
///   UDP    0.0.0.0:5353           *:*                                    2200
/// ```
///
/// UDP rows have no state column, so the pid is always the last field.
pub fn parse_netstat_output(output: &str) -> Vec<PortRecord> {
    let mut result = Vec::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            continue;
        }

        let proto = fields[0].to_ascii_lowercase();
        if !proto.starts_with("tcp") && !proto.starts_with("udp") {
            continue;
        }
        let protocol = Protocol::classify(&proto);

        let Some((local_address, port)) = split_host_port(fields[1]) else {
            continue;
        };

        let Some(Ok(pid)) = fields.last().map(|f| f.parse::<u32>()) else {
            continue;
        };

        let state = if protocol == Protocol::Tcp && fields.len() >= 5 {
            fields[3].to_string()
        } else {
            String::new()
        };

        result.push(PortRecord {
            port,
            protocol,
            local_address,
            state,
            pid,
        });
    }

    result
}
