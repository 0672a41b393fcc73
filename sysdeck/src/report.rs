//! Combined host report for `--export-json`, `--export-md` and the agent.
//! Sections that fail are left empty and listed in `errors`.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::error::FetchError;
use crate::ops::FetchSpec;
use crate::providers::Backend;
use crate::types::{
    CpuSnapshot, DiskSnapshot, MemorySnapshot, NetStats, ProcessInfo, ServiceInfo, Snapshot,
};
use crate::ui::util::{human, truncate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionError {
    pub section: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemReport {
    pub timestamp: DateTime<Utc>,
    pub cpu: Option<CpuSnapshot>,
    pub memory: Option<MemorySnapshot>,
    pub disk: Option<DiskSnapshot>,
    pub processes: Vec<ProcessInfo>,
    pub services: Vec<ServiceInfo>,
    pub network: Vec<NetStats>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SectionError>,
}

impl SystemReport {
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            cpu: None,
            memory: None,
            disk: None,
            processes: Vec::new(),
            services: Vec::new(),
            network: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Fold one provider result into its section.
    pub fn absorb(&mut self, section: &str, result: Result<Snapshot, FetchError>) {
        match result {
            Ok(Snapshot::Cpu(s)) => self.cpu = Some(s.data),
            Ok(Snapshot::Memory(s)) => self.memory = Some(s.data),
            Ok(Snapshot::Disk(s)) => self.disk = Some(s.data),
            Ok(Snapshot::Processes(s)) => self.processes = s.data,
            Ok(Snapshot::Services(s)) => self.services = s.data,
            Ok(Snapshot::NetStats(s)) => self.network = s.data,
            Ok(other) => tracing::debug!(domain = %other.domain(), "not part of the report"),
            Err(e) => self.errors.push(SectionError {
                section: section.to_string(),
                error: e.to_string(),
            }),
        }
    }
}

/// Query every report section concurrently, each under `limit`.
pub async fn collect(backend: &dyn Backend, limit: Duration) -> SystemReport {
    let specs = [
        FetchSpec::Cpu,
        FetchSpec::Memory,
        FetchSpec::Disk,
        FetchSpec::Processes,
        FetchSpec::Services,
        FetchSpec::NetStats,
    ];
    let results = join_all(specs.into_iter().map(|spec| {
        let section = spec.domain().label();
        let fut = backend.fetch(spec);
        async move {
            let r = timeout(limit, fut)
                .await
                .unwrap_or(Err(FetchError::Timeout(limit)));
            (section, r)
        }
    }))
    .await;

    let mut report = SystemReport::empty(Utc::now());
    for (section, result) in results {
        report.absorb(section, result);
    }
    report
}

pub fn to_json(report: &SystemReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

// pipes would split a table cell
fn cell(s: &str, max: usize) -> String {
    truncate(&s.replace('|', "\\|"), max)
}

pub fn to_markdown(r: &SystemReport) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# System Report\n");
    let _ = writeln!(md, "Generated: {}\n", r.timestamp.to_rfc3339());

    md.push_str("## CPU\n\n");
    match &r.cpu {
        Some(c) => {
            let _ = writeln!(md, "- **Usage**: {:.2}%", c.usage);
            let _ = writeln!(md, "- **Cores**: {}", c.cores);
            let _ = writeln!(md, "- **Model**: {}", c.model);
            let _ = writeln!(md, "- **Load (1m)**: {:.2}\n", c.load_1m);
        }
        None => md.push_str("_unavailable_\n\n"),
    }

    md.push_str("## Memory\n\n");
    match &r.memory {
        Some(m) => {
            let _ = writeln!(md, "- **Total**: {}", human(m.total));
            let _ = writeln!(md, "- **Used**: {} ({:.2}%)", human(m.used), m.used_percent);
            let _ = writeln!(md, "- **Available**: {}", human(m.available));
            let _ = writeln!(md, "- **Free**: {}\n", human(m.free));
        }
        None => md.push_str("_unavailable_\n\n"),
    }

    md.push_str("## Disks\n\n");
    md.push_str("| Mount | Device | Total | Used | Used % |\n");
    md.push_str("|-------|--------|-------|------|--------|\n");
    for d in r.disk.iter().flat_map(|d| d.disks.iter()) {
        let _ = writeln!(
            md,
            "| {} | {} | {} | {} | {:.2} |",
            cell(&d.mount_point, 40),
            cell(&d.device, 30),
            human(d.total),
            human(d.used),
            d.used_percent
        );
    }
    md.push('\n');

    md.push_str("## Processes\n\n");
    md.push_str("| PID | Name | CPU % | Memory % | User |\n");
    md.push_str("|-----|------|-------|----------|------|\n");
    for p in &r.processes {
        let _ = writeln!(
            md,
            "| {} | {} | {:.2} | {:.2} | {} |",
            p.pid,
            cell(&p.name, 20),
            p.cpu_percent,
            p.mem_percent,
            cell(&p.user, 16)
        );
    }
    md.push('\n');

    md.push_str("## Services\n\n");
    md.push_str("| Name | State | Description |\n");
    md.push_str("|------|-------|-------------|\n");
    for s in &r.services {
        let _ = writeln!(
            md,
            "| {} | {} | {} |",
            cell(&s.name, 30),
            cell(&s.active_state, 12),
            cell(&s.description, 60)
        );
    }
    md.push('\n');

    md.push_str("## Network Interfaces\n\n");
    md.push_str("| Interface | Bytes Sent | Bytes Received |\n");
    md.push_str("|-----------|------------|----------------|\n");
    for n in &r.network {
        let _ = writeln!(
            md,
            "| {} | {} | {} |",
            cell(&n.interface, 20),
            human(n.bytes_sent),
            human(n.bytes_recv)
        );
    }

    if !r.errors.is_empty() {
        md.push_str("\n## Errors\n\n");
        for e in &r.errors {
            let _ = writeln!(md, "- **{}**: {}", e.section, e.error);
        }
    }
    md
}

pub fn write_json(path: &Path, report: &SystemReport) -> anyhow::Result<()> {
    let data = to_json(report).context("serialize report")?;
    fs::write(path, data).with_context(|| format!("write {}", path.display()))
}

pub fn write_markdown(path: &Path, report: &SystemReport) -> anyhow::Result<()> {
    fs::write(path, to_markdown(report)).with_context(|| format!("write {}", path.display()))
}
