use serde::{Deserialize, Serialize};

use crate::error::{DevexError, Result};

/// Docker daemon state as reported by the Docker probe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DockerSnapshot {
    pub daemon_running: bool,
    pub images_count: u32,
    pub containers_all: u32,
    pub containers_up: u32,
}

/// Connectivity state as reported by the network probe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub internet_connected: bool,
    pub ping_latency_ms: f64,
    pub dns_working: bool,
}

/// Trait for metric snapshot sources
///
/// Usage snapshots are display-formatted text (`"CPU: 45.2%"`,
/// `"Used: 8.5 GB\nTotal: 16.0 GB"`); Docker and network snapshots are
/// structured. A source that cannot serve a kind returns
/// [`DevexError::ProviderUnavailable`], which is also the default for every
/// method so partial sources only implement what they have.
pub trait SnapshotProvider: Send + Sync {
    fn cpu_info(&self) -> Result<String> {
        Err(DevexError::provider_unavailable("cpu snapshot not supported"))
    }

    fn ram_info(&self) -> Result<String> {
        Err(DevexError::provider_unavailable("ram snapshot not supported"))
    }

    fn ram_details(&self) -> Result<String> {
        Err(DevexError::provider_unavailable("ram details not supported"))
    }

    fn disk_info(&self) -> Result<String> {
        Err(DevexError::provider_unavailable("disk snapshot not supported"))
    }

    fn disk_details(&self) -> Result<String> {
        Err(DevexError::provider_unavailable("disk details not supported"))
    }

    fn docker_status(&self) -> Result<DockerSnapshot> {
        Err(DevexError::provider_unavailable("docker probe not supported"))
    }

    fn network_status(&self) -> Result<NetworkSnapshot> {
        Err(DevexError::provider_unavailable("network probe not supported"))
    }
}
