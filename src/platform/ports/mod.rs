//! Port enumeration through the platform's socket listing tool.
//!
//! - Linux: `ss -tulnp`
//! - macOS and other Unixes: `lsof -i -P -n`
//! - Windows: `netstat -ano`
//!
//! Every parser is compiled on every platform so they can all be tested
//! anywhere; only the selection in [`platform_port_enumerator`] is
//! platform dependent.

mod lsof;
mod netstat;
mod ss;

pub use lsof::{parse_lsof_output, LsofEnumerator};
pub use netstat::{parse_netstat_output, NetstatEnumerator};
pub use ss::{parse_ss_output, SsEnumerator};

use std::sync::Arc;
use std::time::Duration;

use crate::core::process::PortEnumerator;
use crate::error::{DevexError, Result};
use crate::platform::command::run_with_timeout;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// The enumerator for the platform this binary was built for
pub fn platform_port_enumerator(timeout: Duration) -> Arc<dyn PortEnumerator> {
    if cfg!(target_os = "windows") {
        Arc::new(NetstatEnumerator::new(timeout))
    } else if cfg!(target_os = "linux") {
        Arc::new(SsEnumerator::new(timeout))
    } else {
        Arc::new(LsofEnumerator::new(timeout))
    }
}

/// Run a listing tool and hand back its stdout.
///
/// Only a tool that is missing, cannot start, or exceeds `timeout` is an
/// error. A non-zero exit with output is still parsed (lsof exits 1 when some
/// sockets could not be inspected).
fn run_listing_tool(tool: &str, args: &[&str], timeout: Duration) -> Result<String> {
    let path = which::which(tool)
        .map_err(|e| DevexError::probe(format!("{} not found: {}", tool, e)))?;
    let program = path.to_string_lossy();

    let output = run_with_timeout(&program, args, timeout)
        .map_err(|e| DevexError::probe(format!("error executing {}: {}", tool, e)))?;

    if !output.success() && output.stdout.trim().is_empty() && !output.stderr.trim().is_empty() {
        return Err(DevexError::probe(format!(
            "{} failed: {}",
            tool,
            output.stderr.trim()
        )));
    }

    Ok(output.stdout)
}

/// Split `host:port` on the last colon. `None` when the port is not numeric
/// (`*:*`, `Address:Port` headers and the like).
pub(crate) fn split_host_port(addr: &str) -> Option<(String, u16)> {
    let (host, port) = addr.rsplit_once(':')?;
    let port = port.parse::<u16>().ok()?;
    Some((host.to_string(), port))
}
