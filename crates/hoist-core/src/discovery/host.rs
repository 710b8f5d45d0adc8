//! Host discovery backed by `sysinfo`.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use sysinfo::System;
use tracing::debug;

use super::{Discoverer, ProcessFilterer};
use crate::cancel::{Cancelled, CancellationToken, with_cancel};
use crate::types::{DiscoveryManifest, ProcessInfo};

/// Raw host facts before vocabulary filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostFacts {
    pub hostname: String,
    pub kernel_arch: String,
    pub kernel_version: String,
    pub os: String,
    /// Distribution id as reported by the OS (`ubuntu`, `rhel`, `amzn`, ...).
    pub platform_id: String,
    pub platform_version: String,
}

impl HostFacts {
    /// Build a manifest, normalizing the distribution id and deriving the
    /// platform family. Values outside the known vocabularies are dropped.
    pub fn into_manifest(self) -> DiscoveryManifest {
        let platform = normalize_platform(&self.platform_id);
        let family = platform_family(&platform).unwrap_or_default();

        DiscoveryManifest {
            hostname: self.hostname,
            kernel_arch: self.kernel_arch,
            kernel_version: self.kernel_version,
            os: self.os,
            platform_version: self.platform_version,
            ..Default::default()
        }
        .with_platform(&platform, family)
    }
}

/// Map distribution ids onto the platform names recipes use.
pub fn normalize_platform(id: &str) -> String {
    let id = id.trim().to_ascii_lowercase();
    match id.as_str() {
        "rhel" | "redhat" => "redhat".to_string(),
        "amzn" | "amazon" => "amazon".to_string(),
        "sles" | "sled" | "suse" => "suse".to_string(),
        s if s.starts_with("opensuse") => "suse".to_string(),
        _ => id,
    }
}

/// Package ecosystem for a normalized platform name.
pub fn platform_family(platform: &str) -> Option<&'static str> {
    match platform {
        "debian" | "ubuntu" | "linuxmint" | "raspbian" => Some("debian"),
        "centos" | "redhat" | "amazon" | "fedora" | "rocky" | "almalinux" | "ol" => Some("rhel"),
        "suse" => Some("suse"),
        _ => None,
    }
}

/// [`Discoverer`] that reads host facts and the process table via `sysinfo`,
/// then narrows processes through a [`ProcessFilterer`].
pub struct SysinfoDiscoverer {
    process_filterer: Arc<dyn ProcessFilterer>,
}

impl SysinfoDiscoverer {
    pub fn new(process_filterer: Arc<dyn ProcessFilterer>) -> Self {
        Self { process_filterer }
    }
}

#[async_trait]
impl Discoverer for SysinfoDiscoverer {
    async fn discover(&self, cancel: &CancellationToken) -> anyhow::Result<DiscoveryManifest> {
        let (facts, processes) = with_cancel(cancel, async {
            tokio::task::spawn_blocking(snapshot_host)
                .await
                .context("Host discovery task failed")
        })
        .await?;

        let mut manifest = facts.into_manifest();
        debug!(
            hostname = %manifest.hostname,
            platform = ?manifest.platform,
            platform_family = ?manifest.platform_family,
            process_count = processes.len(),
            "host facts collected"
        );

        let filtered = self
            .process_filterer
            .filter(cancel, processes)
            .await
            .context("Failed to filter running processes")?;

        if cancel.is_cancelled() {
            return Err(Cancelled.into());
        }

        for process in filtered {
            manifest.add_process(process);
        }

        Ok(manifest)
    }
}

fn snapshot_host() -> (HostFacts, Vec<ProcessInfo>) {
    let sys = System::new_all();

    let facts = HostFacts {
        hostname: System::host_name().unwrap_or_default(),
        kernel_arch: System::cpu_arch(),
        kernel_version: System::kernel_version().unwrap_or_default(),
        os: std::env::consts::OS.to_string(),
        platform_id: System::distribution_id(),
        platform_version: System::os_version().unwrap_or_default(),
    };

    let mut processes = Vec::with_capacity(sys.processes().len());
    for (pid, process) in sys.processes() {
        let name = process.name().to_string_lossy().into_owned();
        if name.is_empty() {
            debug!(pid = pid.as_u32(), "cannot read process, skipping");
            continue;
        }

        let cmdline = process
            .cmd()
            .iter()
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");

        processes.push(ProcessInfo {
            pid: pid.as_u32(),
            name,
            cmdline,
        });
    }

    (facts, processes)
}
