//! Host snapshots and process enumeration backed by `sysinfo`.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::path::Path;
use std::time::Duration;
use sysinfo::{
    CpuRefreshKind, Disks, MemoryRefreshKind, ProcessRefreshKind, ProcessesToUpdate, RefreshKind,
    System, UpdateKind, Users,
};

use crate::core::history::{format_bytes, DockerSnapshot, NetworkSnapshot, SnapshotProvider};
use crate::core::process::{ProcessRecord, ProcessSource};
use crate::error::{DevexError, Result};
use crate::platform::{docker, network};

/// [`SnapshotProvider`] for the local machine.
///
/// CPU, memory and disk come from `sysinfo`; Docker and connectivity are
/// probed with external commands and sockets bounded by `probe_timeout`.
pub struct HostSnapshotProvider {
    system: Mutex<System>,
    disks: Mutex<Disks>,
    probe_timeout: Duration,
}

impl HostSnapshotProvider {
    /// Blocks for one CPU measurement interval so the first CPU sample is
    /// meaningful.
    pub fn new(probe_timeout: Duration) -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
            .with_memory(MemoryRefreshKind::nothing().with_ram());

        let mut system = System::new_with_specifics(refresh_kind);
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_cpu_usage();

        Self {
            system: Mutex::new(system),
            disks: Mutex::new(Disks::new_with_refreshed_list()),
            probe_timeout,
        }
    }

    /// `(used, total)` bytes of the root filesystem, or the first disk found
    fn disk_usage(&self) -> Result<(u64, u64)> {
        let mut disks = self.disks.lock();
        disks.refresh(true);

        let disk = disks
            .list()
            .iter()
            .find(|d| d.mount_point() == Path::new("/"))
            .or_else(|| disks.list().first())
            .ok_or_else(|| DevexError::provider_unavailable("no disks found"))?;

        let total = disk.total_space();
        let used = total.saturating_sub(disk.available_space());
        Ok((used, total))
    }

    fn memory_usage(&self) -> (u64, u64) {
        let mut system = self.system.lock();
        system.refresh_memory();
        (system.used_memory(), system.total_memory())
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}

fn used_total_text(used: u64, total: u64) -> String {
    format!("Used: {}\nTotal: {}", format_bytes(used), format_bytes(total))
}

impl SnapshotProvider for HostSnapshotProvider {
    fn cpu_info(&self) -> Result<String> {
        let mut system = self.system.lock();
        system.refresh_cpu_usage();
        Ok(format!("CPU: {:.1}%", system.global_cpu_usage()))
    }

    fn ram_info(&self) -> Result<String> {
        let (used, total) = self.memory_usage();
        if total == 0 {
            return Err(DevexError::provider_unavailable("RAM: No data"));
        }
        Ok(format!("RAM: {:.1}%", percent(used, total)))
    }

    fn ram_details(&self) -> Result<String> {
        let (used, total) = self.memory_usage();
        Ok(used_total_text(used, total))
    }

    fn disk_info(&self) -> Result<String> {
        let (used, total) = self.disk_usage()?;
        Ok(format!("Disk: {:.1}%", percent(used, total)))
    }

    fn disk_details(&self) -> Result<String> {
        let (used, total) = self.disk_usage()?;
        Ok(used_total_text(used, total))
    }

    fn docker_status(&self) -> Result<DockerSnapshot> {
        Ok(docker::docker_snapshot(self.probe_timeout))
    }

    fn network_status(&self) -> Result<NetworkSnapshot> {
        Ok(network::network_snapshot(self.probe_timeout))
    }
}

/// [`ProcessSource`] over the `sysinfo` process table.
///
/// Keeps one `System` alive between refreshes; CPU percentages are computed
/// against the previous refresh, so the first enumeration reports 0%.
pub struct SysinfoProcessSource {
    system: Mutex<System>,
    users: Users,
}

impl SysinfoProcessSource {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            users: Users::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoProcessSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for SysinfoProcessSource {
    fn processes(&self) -> Result<Vec<ProcessRecord>> {
        let mut system = self.system.lock();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing()
                .with_cpu()
                .with_memory()
                .with_cmd(UpdateKind::OnlyIfNotSet)
                .with_user(UpdateKind::OnlyIfNotSet),
        );

        let mut records: Vec<ProcessRecord> = system
            .processes()
            .iter()
            // Linux reports every thread as a task entry of its own
            .filter(|(_, process)| process.thread_kind().is_none())
            .map(|(pid, process)| {
                let command_line = process
                    .cmd()
                    .iter()
                    .map(|arg| arg.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(" ");

                let username = process
                    .user_id()
                    .and_then(|uid| self.users.get_user_by_id(uid))
                    .map(|user| user.name().to_string())
                    .unwrap_or_default();

                let start_time: DateTime<Utc> =
                    DateTime::from_timestamp(process.start_time() as i64, 0).unwrap_or_default();

                ProcessRecord {
                    pid: pid.as_u32(),
                    name: process.name().to_string_lossy().to_string(),
                    command_line,
                    username,
                    cpu_percent: process.cpu_usage(),
                    memory_bytes: process.memory(),
                    start_time,
                }
            })
            .collect();

        if records.is_empty() {
            return Err(DevexError::provider_unavailable("process table is empty"));
        }

        records.sort_by_key(|r| r.pid);
        Ok(records)
    }
}
