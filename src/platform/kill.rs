//! Process termination through the platform's kill command.

use std::time::Duration;

use crate::core::process::ProcessTerminator;
use crate::error::{DevexError, Result};
use crate::platform::command::run_with_timeout;

pub const DEFAULT_KILL_TIMEOUT: Duration = Duration::from_secs(5);

/// Force-terminates processes with `kill -9` (Unix) or `taskkill /F` (Windows)
pub struct CommandTerminator {
    timeout: Duration,
}

impl CommandTerminator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for CommandTerminator {
    fn default() -> Self {
        Self::new(DEFAULT_KILL_TIMEOUT)
    }
}

impl ProcessTerminator for CommandTerminator {
    fn terminate(&self, pid: u32) -> Result<()> {
        // pid 0 and values past i32::MAX address process groups or wrap to -1
        if pid == 0 || i32::try_from(pid).is_err() {
            return Err(DevexError::termination(format!("invalid pid: {}", pid)));
        }

        let pid_arg = pid.to_string();
        let (program, args): (&str, Vec<&str>) = if cfg!(target_os = "windows") {
            ("taskkill", vec!["/F", "/PID", pid_arg.as_str()])
        } else {
            ("kill", vec!["-9", pid_arg.as_str()])
        };

        let output = run_with_timeout(program, &args, self.timeout).map_err(|e| {
            DevexError::termination(format!("failed to run {} for pid {}: {}", program, pid, e))
        })?;

        if !output.success() {
            let reason = output.stderr.trim();
            return Err(DevexError::termination(format!(
                "{} exited with {} for pid {}{}{}",
                program,
                output.status,
                pid,
                if reason.is_empty() { "" } else { ": " },
                reason
            )));
        }

        Ok(())
    }
}
