//! Snapshot types produced by providers and shared by views, reports and the agent.

use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point-in-time value. Views hold these behind `Arc`, so a replaced sample
/// stays intact for any frame still drawing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample<T> {
    pub taken_at: DateTime<Utc>,
    pub data: T,
}

impl<T> Sample<T> {
    pub fn now(data: T) -> Self {
        Self {
            taken_at: Utc::now(),
            data,
        }
    }

    pub fn at(taken_at: DateTime<Utc>, data: T) -> Self {
        Self { taken_at, data }
    }
}

/// Number of selectable rows in a snapshot. Aggregates (CPU, memory) have none.
pub trait Rows {
    fn rows(&self) -> usize {
        0
    }
}

impl<T> Rows for Vec<T> {
    fn rows(&self) -> usize {
        self.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub usage: f32,
    pub per_core: Vec<f32>,
    pub cores: usize,
    pub model: String,
    pub load_1m: f64,
}

impl Rows for CpuSnapshot {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub free: u64,
    pub used_percent: f64,
    pub swap_total: u64,
    pub swap_used: u64,
}

impl Rows for MemorySnapshot {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskSnapshot {
    pub disks: Vec<DiskInfo>,
}

impl DiskSnapshot {
    /// The root filesystem, falling back to the largest mount.
    pub fn root(&self) -> Option<&DiskInfo> {
        self.disks
            .iter()
            .find(|d| d.mount_point == "/")
            .or_else(|| self.disks.iter().max_by_key(|d| d.total))
    }
}

impl Rows for DiskSnapshot {
    fn rows(&self) -> usize {
        self.disks.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetStats {
    pub interface: String,
    // cumulative counters; rates are diffed between samples
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub errors_in: u64,
    pub errors_out: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    Tcp,
    Tcp6,
    Udp,
    Udp6,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Tcp6 => "tcp6",
            Protocol::Udp => "udp",
            Protocol::Udp6 => "udp6",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub protocol: Protocol,
    pub status: String,
    pub local: SocketAddr,
    pub remote: SocketAddr,
    pub pid: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub mem_percent: f32,
    pub status: String,
    pub user: String,
    pub started: DateTime<Utc>,
    pub command_line: String,
    pub nice: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub description: String,
    pub load_state: String,
    pub active_state: String,
    pub sub_state: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Apt,
    Dnf,
    Pacman,
}

impl PackageManager {
    pub fn as_str(self) -> &'static str {
        match self {
            PackageManager::Apt => "apt",
            PackageManager::Dnf => "dnf",
            PackageManager::Pacman => "pacman",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apt" | "dpkg" => Some(PackageManager::Apt),
            "dnf" | "yum" | "rpm" => Some(PackageManager::Dnf),
            "pacman" => Some(PackageManager::Pacman),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub size: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageList {
    pub manager: PackageManager,
    pub packages: Vec<PackageInfo>,
}

impl Rows for PackageList {
    fn rows(&self) -> usize {
        self.packages.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warn,
    Info,
    Debug,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Error,
        Severity::Warn,
        Severity::Info,
        Severity::Debug,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warn => "WARN",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub severity: Severity,
    pub source: String,
    pub message: String,
}

/// Every provider result, tagged by domain.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Cpu(Sample<CpuSnapshot>),
    Memory(Sample<MemorySnapshot>),
    Disk(Sample<DiskSnapshot>),
    NetStats(Sample<Vec<NetStats>>),
    Connections(Sample<Vec<Connection>>),
    Processes(Sample<Vec<ProcessInfo>>),
    Services(Sample<Vec<ServiceInfo>>),
    Packages(Sample<PackageList>),
    Logs(Sample<Vec<LogEntry>>),
}
