//! CPU, memory and disk sampling using sysinfo.

use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};

use crate::types::{CpuSnapshot, DiskInfo, DiskSnapshot, MemorySnapshot};

/// sysinfo derives usage from two refreshes; the very first sample waits out
/// the minimum interval so it is not a meaningless 0%.
pub fn cpu(sys: &mut System, first: bool) -> CpuSnapshot {
    sys.refresh_cpu_all();
    if first {
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();
    }
    let per_core: Vec<f32> = sys.cpus().iter().map(|c| c.cpu_usage()).collect();
    let model = sys
        .cpus()
        .first()
        .map(|c| c.brand().trim().to_string())
        .unwrap_or_default();
    CpuSnapshot {
        usage: sys.global_cpu_usage(),
        cores: per_core.len(),
        per_core,
        model,
        load_1m: System::load_average().one,
    }
}

pub fn memory(sys: &mut System) -> MemorySnapshot {
    sys.refresh_memory();
    let total = sys.total_memory();
    let available = sys.available_memory();
    let used = total.saturating_sub(available);
    MemorySnapshot {
        total,
        used,
        available,
        free: sys.free_memory(),
        used_percent: percent(used, total),
        swap_total: sys.total_swap(),
        swap_used: sys.used_swap(),
    }
}

pub fn disks(disks: &mut Disks) -> DiskSnapshot {
    // true: drop disks that disappeared since the last refresh
    disks.refresh(true);
    let mut list: Vec<DiskInfo> = disks
        .iter()
        .map(|d| {
            let total = d.total_space();
            let free = d.available_space();
            let used = total.saturating_sub(free);
            DiskInfo {
                device: d.name().to_string_lossy().into_owned(),
                mount_point: d.mount_point().to_string_lossy().into_owned(),
                fs_type: d.file_system().to_string_lossy().into_owned(),
                total,
                used,
                free,
                used_percent: percent(used, total),
            }
        })
        .collect();
    list.sort_by(|a, b| a.mount_point.cmp(&b.mount_point));
    DiskSnapshot { disks: list }
}

pub(crate) fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

