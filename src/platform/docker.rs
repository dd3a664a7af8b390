//! Docker daemon probe through the `docker` CLI.

use std::time::Duration;

use crate::core::history::DockerSnapshot;
use crate::platform::command::run_with_timeout;

/// Probe the Docker daemon.
///
/// Never fails: a missing CLI or an unreachable daemon is reported as
/// `daemon_running: false` with zero counts.
pub fn docker_snapshot(timeout: Duration) -> DockerSnapshot {
    let Ok(path) = which::which("docker") else {
        log::debug!("docker CLI not found");
        return DockerSnapshot::default();
    };
    let docker = path.to_string_lossy();

    let run = |args: &[&str]| -> Option<String> {
        match run_with_timeout(&docker, args, timeout) {
            Ok(output) if output.success() => Some(output.stdout),
            Ok(output) => {
                log::debug!("docker {} exited with {}", args.join(" "), output.status);
                None
            }
            Err(e) => {
                log::debug!("docker {} failed: {}", args.join(" "), e);
                None
            }
        }
    };

    if run(&["info"]).is_none() {
        return DockerSnapshot::default();
    }

    let images_count = run(&["images", "--format", "{{.ID}}"])
        .map(|out| count_lines(&out))
        .unwrap_or(0);

    let (containers_all, containers_up) = run(&["ps", "-a", "--format", "{{.Status}}"])
        .map(|out| count_containers(&out))
        .unwrap_or((0, 0));

    DockerSnapshot {
        daemon_running: true,
        images_count,
        containers_all,
        containers_up,
    }
}

/// Non-empty lines of CLI output
fn count_lines(output: &str) -> u32 {
    output.lines().filter(|l| !l.trim().is_empty()).count() as u32
}

/// `(all, running)` from `docker ps -a --format {{.Status}}` output
fn count_containers(output: &str) -> (u32, u32) {
    let statuses: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let up = statuses.iter().filter(|s| s.starts_with("Up")).count();
    (statuses.len() as u32, up as u32)
}
