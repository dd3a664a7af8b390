use std::time::Duration;

use super::{run_listing_tool, split_host_port};
use crate::core::process::{PortEnumerator, PortRecord, Protocol};
use crate::error::Result;

/// Linux socket listing via iproute2's `ss`
pub struct SsEnumerator {
    timeout: Duration,
}

impl SsEnumerator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl PortEnumerator for SsEnumerator {
    fn tool(&self) -> &'static str {
        "ss"
    }

    fn enumerate(&self) -> Result<Vec<PortRecord>> {
        let output = run_listing_tool("ss", &["-tuln", "-p"], self.timeout)?;
        Ok(parse_ss_output(&output))
    }
}

/// Parse `ss -tuln -p` output.
///
/// ```text
/// Netid State  Recv-Q Send-Q Local Address:Port Peer Address:Port Process
/// tcp   LISTEN 0      128    0.0.0.0:22         0.0.0.0:*         users:(("sshd",pid=812,fd=3))
/// ```
///
/// Lines without a `pid=` (sockets of other users when not root) are dropped.
/// A socket shared by several processes yields one record per pid.
pub fn parse_ss_output(output: &str) -> Vec<PortRecord> {
    let mut result = Vec::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            continue;
        }

        let Some((local_address, port)) = split_host_port(fields[4]) else {
            continue;
        };

        let mut pids: Vec<u32> = fields[6..]
            .iter()
            .flat_map(|f| extract_pids(f))
            .collect();
        pids.sort_unstable();
        pids.dedup();
        if pids.is_empty() {
            continue;
        }

        let protocol = Protocol::classify(fields[0]);
        for pid in pids {
            result.push(PortRecord {
                port,
                protocol,
                local_address: local_address.clone(),
                state: fields[1].to_string(),
                pid,
            });
        }
    }

    result
}

/// All `pid=<n>` values in a `users:((...))` column
fn extract_pids(field: &str) -> Vec<u32> {
    field
        .split("pid=")
        .skip(1)
        .filter_map(|rest| {
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        })
        .collect()
}
