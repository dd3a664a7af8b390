use std::time::Duration;

use super::{run_listing_tool, split_host_port};
use crate::core::process::{PortEnumerator, PortRecord, Protocol};
use crate::error::Result;

/// Socket listing via `lsof`, used on macOS and the BSDs
pub struct LsofEnumerator {
    timeout: Duration,
}

impl LsofEnumerator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl PortEnumerator for LsofEnumerator {
    fn tool(&self) -> &'static str {
        "lsof"
    }

    fn enumerate(&self) -> Result<Vec<PortRecord>> {
        let output = run_listing_tool("lsof", &["-i", "-P", "-n"], self.timeout)?;
        Ok(parse_lsof_output(&output))
    }
}

/// Parse `lsof -i -P -n` output.
///
/// ```text
/// COMMAND  PID USER FD  TYPE DEVICE SIZE/OFF NODE NAME
/// node    4242 me   23u IPv4 0x1234      0t0  TCP  *:3000 (LISTEN)
/// ```
///
/// For connected sockets only the local side of `local->remote` is kept.
pub fn parse_lsof_output(output: &str) -> Vec<PortRecord> {
    let mut result = Vec::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 9 {
            continue;
        }

        // Also rejects the header row
        let Ok(pid) = fields[1].parse::<u32>() else {
            continue;
        };

        let local = fields[8].split("->").next().unwrap_or_default();
        let Some((local_address, port)) = split_host_port(local) else {
            continue;
        };

        let state = match fields.get(9) {
            Some(state) => state.trim_matches(|c| c == '(' || c == ')').to_string(),
            None => "UNKNOWN".to_string(),
        };

        result.push(PortRecord {
            port,
            protocol: Protocol::classify(fields[7]),
            local_address,
            state,
            pid,
        });
    }

    result
}
