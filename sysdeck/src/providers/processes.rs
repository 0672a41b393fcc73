//! Process listing via sysinfo, plus the terminate and renice executors.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, Users};
use tokio::process::Command;
use tracing::warn;

use crate::error::CommandError;
use crate::ops::Signal;
use crate::types::ProcessInfo;

pub const NICE_MIN: i32 = -20;
pub const NICE_MAX: i32 = 19;

const RENICE_TIMEOUT: Duration = Duration::from_secs(5);

/// All processes, ordered by pid. CPU is scaled to a single 0..100 range
/// across all cores.
pub fn list(sys: &mut System, users: &Users) -> Vec<ProcessInfo> {
    sys.refresh_memory();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::everything().without_tasks(),
    );
    let cores = sys.cpus().len().max(1) as f32;
    let total_mem = sys.total_memory().max(1) as f64;

    let mut procs: Vec<ProcessInfo> = sys
        .processes()
        .values()
        .map(|p| {
            let pid = p.pid().as_u32();
            let user = p
                .user_id()
                .and_then(|uid| users.get_user_by_id(uid))
                .map(|u| u.name().to_string())
                .unwrap_or_default();
            let command_line = p
                .cmd()
                .iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ");
            ProcessInfo {
                pid,
                name: p.name().to_string_lossy().into_owned(),
                cpu_percent: (p.cpu_usage() / cores).clamp(0.0, 100.0),
                mem_percent: (p.memory() as f64 / total_mem * 100.0) as f32,
                status: p.status().to_string(),
                user,
                started: DateTime::<Utc>::from_timestamp(p.start_time() as i64, 0)
                    .unwrap_or_default(),
                command_line,
                nice: read_nice(pid),
            }
        })
        .collect();
    procs.sort_by_key(|p| p.pid);
    procs
}

/// Nice value from the contents of /proc/<pid>/stat. The comm field may hold
/// spaces, so fields are counted from the closing paren.
pub fn parse_stat_nice(stat: &str) -> Option<i32> {
    let rpar = stat.rfind(')')?;
    let after = stat.get(rpar + 2..)?;
    // state is field 0 here; nice is field 19 of the full line
    after.split_whitespace().nth(16)?.parse().ok()
}

#[cfg(target_os = "linux")]
fn read_nice(pid: u32) -> i32 {
    std::fs::read_to_string(format!("/proc/{pid}/stat"))
        .ok()
        .as_deref()
        .and_then(parse_stat_nice)
        .unwrap_or(0)
}

#[cfg(not(target_os = "linux"))]
fn read_nice(_pid: u32) -> i32 {
    0
}

pub fn terminate(sys: &mut System, pid: u32, signal: Signal) -> Result<(), CommandError> {
    let spid = Pid::from_u32(pid);
    sys.refresh_processes(ProcessesToUpdate::Some(&[spid]), true);
    let process = sys.process(spid).ok_or(CommandError::NoSuchProcess(pid))?;
    let sig = match signal {
        Signal::Term => sysinfo::Signal::Term,
        Signal::Kill => sysinfo::Signal::Kill,
    };
    match process.kill_with(sig) {
        Some(true) => Ok(()),
        Some(false) => Err(CommandError::Rejected(format!(
            "{} to {pid} was refused",
            signal.as_str()
        ))),
        None => Err(CommandError::Unsupported("signal not available on this platform")),
    }
}

pub fn clamp_nice(v: i32) -> i32 {
    v.clamp(NICE_MIN, NICE_MAX)
}

pub async fn renice(pid: u32, nice: i32) -> Result<(), CommandError> {
    let nice = clamp_nice(nice);
    let run = Command::new("renice")
        .args(["-n", &nice.to_string(), "-p", &pid.to_string()])
        .kill_on_drop(true)
        .output();
    let out = match tokio::time::timeout(RENICE_TIMEOUT, run).await {
        Ok(Ok(out)) => out,
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CommandError::Unsupported("renice not installed"))
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err(CommandError::Timeout(RENICE_TIMEOUT)),
    };
    if out.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
    warn!(pid, nice, %stderr, "renice failed");
    if stderr.contains("No such process") {
        Err(CommandError::NoSuchProcess(pid))
    } else {
        Err(CommandError::Rejected(stderr))
    }
}
