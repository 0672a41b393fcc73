//! Host report assembly, JSON and Markdown output.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use futures::future::{self, BoxFuture, FutureExt};

use sysdeck::error::{CommandError, FetchError};
use sysdeck::ops::{CommandSpec, FetchSpec};
use sysdeck::providers::Backend;
use sysdeck::report::{self, SystemReport};
use sysdeck::types::{
    CpuSnapshot, MemorySnapshot, NetStats, ProcessInfo, Sample, ServiceInfo, Snapshot,
};

/// Canned host: disk never answers and services are down.
struct CannedHost;

fn cpu() -> CpuSnapshot {
    CpuSnapshot {
        usage: 37.5,
        per_core: vec![30.0, 45.0],
        cores: 2,
        model: "Test CPU".into(),
        load_1m: 0.42,
    }
}

fn proc_info() -> ProcessInfo {
    ProcessInfo {
        pid: 4242,
        name: "we|ird".into(),
        cpu_percent: 1.5,
        mem_percent: 0.25,
        status: "Run".into(),
        user: "ops".into(),
        started: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
        command_line: "weird".into(),
        nice: 0,
    }
}

impl Backend for CannedHost {
    fn fetch(&self, spec: FetchSpec) -> BoxFuture<'static, Result<Snapshot, FetchError>> {
        let snap = match spec {
            FetchSpec::Cpu => Ok(Snapshot::Cpu(Sample::now(cpu()))),
            FetchSpec::Memory => Ok(Snapshot::Memory(Sample::now(MemorySnapshot {
                total: 8 << 30,
                used: 2 << 30,
                available: 6 << 30,
                free: 5 << 30,
                used_percent: 25.0,
                swap_total: 0,
                swap_used: 0,
            }))),
            FetchSpec::Disk => return future::pending().boxed(),
            FetchSpec::Processes => Ok(Snapshot::Processes(Sample::now(vec![proc_info()]))),
            FetchSpec::Services => Err(FetchError::Unreachable("no system bus".into())),
            FetchSpec::NetStats => Ok(Snapshot::NetStats(Sample::now(vec![NetStats {
                interface: "eth0".into(),
                bytes_sent: 2048,
                bytes_recv: 1 << 20,
                packets_sent: 1,
                packets_recv: 2,
                errors_in: 0,
                errors_out: 0,
            }]))),
            other => Err(FetchError::Worker(format!("unexpected {other:?}"))),
        };
        future::ready(snap).boxed()
    }

    fn execute(&self, _cmd: CommandSpec) -> BoxFuture<'static, Result<(), CommandError>> {
        future::ready(Err(CommandError::Unsupported("read-only"))).boxed()
    }
}

async fn collected() -> SystemReport {
    report::collect(&CannedHost, Duration::from_millis(100)).await
}

#[tokio::test]
async fn failed_sections_are_listed_not_fatal() {
    let r = collected().await;
    assert_eq!(r.cpu.as_ref().map(|c| c.cores), Some(2));
    assert!(r.memory.is_some());
    assert!(r.disk.is_none());
    assert!(r.services.is_empty());
    assert_eq!(r.processes.len(), 1);
    assert_eq!(r.network.len(), 1);

    let mut failed: Vec<&str> = r.errors.iter().map(|e| e.section.as_str()).collect();
    failed.sort();
    assert_eq!(failed, vec!["disk", "services"]);
    let disk = r.errors.iter().find(|e| e.section == "disk").unwrap();
    assert!(disk.error.contains("timed out after 100ms"));
}

#[tokio::test]
async fn json_round_trips_and_names_sections() {
    let r = collected().await;
    let text = report::to_json(&r).unwrap();
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    for key in [
        "timestamp",
        "cpu",
        "memory",
        "disk",
        "processes",
        "services",
        "network",
        "errors",
    ] {
        assert!(v.get(key).is_some(), "missing {key}");
    }
    assert_eq!(v["cpu"]["model"], "Test CPU");
    assert!(v["disk"].is_null());
    let back: SystemReport = serde_json::from_str(&text).unwrap();
    assert_eq!(back, r);
}

#[test]
fn clean_report_omits_errors_key() {
    let r = SystemReport::empty(Utc::now());
    let v: serde_json::Value = serde_json::from_str(&report::to_json(&r).unwrap()).unwrap();
    assert!(v.get("errors").is_none());
}

#[tokio::test]
async fn markdown_layout() {
    let r = collected().await;
    let md = report::to_markdown(&r);
    assert!(md.starts_with("# System Report\n"));
    assert!(md.contains("Generated: "));
    assert!(md.contains("- **Usage**: 37.50%"));
    assert!(md.contains("- **Total**: 8.0GB"));
    assert!(md.contains("| PID | Name | CPU % | Memory % | User |"));
    // pipes in cells are escaped
    assert!(md.contains("| 4242 | we\\|ird | 1.50 | 0.25 | ops |"));
    assert!(md.contains("| eth0 | 2.0KB | 1.0MB |"));
    assert!(md.contains("## Errors"));
    assert!(md.contains("- **services**: collaborator unreachable: no system bus"));
}

#[tokio::test]
async fn writers_create_files() {
    let dir = tempfile::tempdir().unwrap();
    let r = collected().await;
    let json = dir.path().join("report.json");
    let md = dir.path().join("report.md");
    report::write_json(&json, &r).unwrap();
    report::write_markdown(&md, &r).unwrap();
    assert!(std::fs::read_to_string(&json).unwrap().contains("\"processes\""));
    assert!(std::fs::read_to_string(&md).unwrap().contains("## Services"));

    let missing = dir.path().join("no/such/dir/report.json");
    let err = report::write_json(&missing, &r).unwrap_err();
    assert!(format!("{err:#}").contains("report.json"));
}
