//! Per-domain view state: last good snapshot, status, cursor. Only the
//! controller loop writes here, one delivered result at a time.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::error;

use crate::error::{CommandError, FetchError, ViewError};
use crate::history::{push_capped, NetRates, PerCoreHistory};
use crate::ops::{CommandOutcome, CommandResult, Domain};
use crate::types::{
    Connection, CpuSnapshot, DiskSnapshot, LogEntry, MemorySnapshot, NetStats, PackageList,
    ProcessInfo, Rows, Sample, ServiceInfo, Snapshot,
};

const HISTORY_CAP: usize = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Clone)]
pub struct ViewState<T> {
    status: Status,
    snapshot: Option<Arc<Sample<T>>>,
    last_error: Option<ViewError>,
    selected: usize,
    last_command: Option<CommandResult>,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            status: Status::Loading,
            snapshot: None,
            last_error: None,
            selected: 0,
            last_command: None,
        }
    }
}

impl<T: Rows> ViewState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn sample(&self) -> Option<&Arc<Sample<T>>> {
        self.snapshot.as_ref()
    }

    pub fn data(&self) -> Option<&T> {
        self.snapshot.as_deref().map(|s| &s.data)
    }

    pub fn last_error(&self) -> Option<&ViewError> {
        self.last_error.as_ref()
    }

    pub fn last_command(&self) -> Option<&CommandResult> {
        self.last_command.as_ref()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn len(&self) -> usize {
        self.data().map(Rows::rows).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reducer for provider results.
    pub fn apply_fetch(&mut self, result: Result<Sample<T>, FetchError>) {
        match result {
            Ok(sample) => {
                self.snapshot = Some(Arc::new(sample));
                self.status = Status::Ready;
                self.last_error = None;
                self.clamp_selection();
            }
            Err(e) => {
                // Without any data there is nothing stale to show: keep loading.
                if self.snapshot.is_some() {
                    self.status = Status::Error;
                }
                self.last_error = Some(ViewError::Fetch(e));
            }
        }
    }

    /// Reducer for executor results. Never touches the listing; a successful
    /// command is followed by a fresh fetch issued by the controller.
    pub fn apply_command(&mut self, result: CommandResult) {
        if let CommandOutcome::Failed(_) = &result.outcome {
            if self.snapshot.is_some() {
                self.status = Status::Error;
            }
        }
        self.last_command = Some(result);
    }

    pub fn record_command_error(&mut self, e: CommandError) {
        self.last_error = Some(ViewError::Command(e));
    }

    fn clamp_selection(&mut self) {
        let len = self.len();
        self.selected = if len == 0 {
            0
        } else {
            self.selected.min(len - 1)
        };
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.len().saturating_sub(1);
    }

    pub fn page_down(&mut self, page: usize) {
        self.selected = self.selected.saturating_add(page.max(1));
        self.clamp_selection();
    }

    pub fn page_up(&mut self, page: usize) {
        self.selected = self.selected.saturating_sub(page.max(1));
    }
}

impl<T> ViewState<Vec<T>> {
    pub fn selected_item(&self) -> Option<&T> {
        self.snapshot
            .as_deref()
            .and_then(|s| s.data.get(self.selected))
    }
}

impl ViewState<PackageList> {
    pub fn selected_item(&self) -> Option<&crate::types::PackageInfo> {
        self.snapshot
            .as_deref()
            .and_then(|s| s.data.packages.get(self.selected))
    }
}

/// Snapshot tagged for a domain other than the operation that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainMismatch {
    pub expected: Domain,
    pub got: Domain,
}

/// Every domain's state plus the chart histories derived from it.
#[derive(Debug, Clone)]
pub struct Store {
    pub cpu: ViewState<CpuSnapshot>,
    pub memory: ViewState<MemorySnapshot>,
    pub disk: ViewState<DiskSnapshot>,
    pub net_stats: ViewState<Vec<NetStats>>,
    pub connections: ViewState<Vec<Connection>>,
    pub processes: ViewState<Vec<ProcessInfo>>,
    pub services: ViewState<Vec<ServiceInfo>>,
    pub packages: ViewState<PackageList>,
    pub logs: ViewState<Vec<LogEntry>>,

    pub cpu_hist: VecDeque<u64>,
    pub per_core_hist: PerCoreHistory,
    pub net_rates: NetRates,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            cpu: ViewState::new(),
            memory: ViewState::new(),
            disk: ViewState::new(),
            net_stats: ViewState::new(),
            connections: ViewState::new(),
            processes: ViewState::new(),
            services: ViewState::new(),
            packages: ViewState::new(),
            logs: ViewState::new(),
            cpu_hist: VecDeque::with_capacity(HISTORY_CAP),
            per_core_hist: PerCoreHistory::new(60),
            net_rates: NetRates::new(HISTORY_CAP),
        }
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a provider result to its domain.
    pub fn apply_fetch(
        &mut self,
        domain: Domain,
        result: Result<Snapshot, FetchError>,
    ) -> Result<(), DomainMismatch> {
        let snap = match result {
            Ok(s) => s,
            Err(e) => {
                self.fail_fetch(domain, e);
                return Ok(());
            }
        };
        if snap.domain() != domain {
            return Err(DomainMismatch {
                expected: domain,
                got: snap.domain(),
            });
        }
        match snap {
            Snapshot::Cpu(s) => {
                let v = s.data.usage.clamp(0.0, 100.0).round() as u64;
                push_capped(&mut self.cpu_hist, v, HISTORY_CAP);
                self.per_core_hist.push_samples(&s.data.per_core);
                self.cpu.apply_fetch(Ok(s));
            }
            Snapshot::Memory(s) => self.memory.apply_fetch(Ok(s)),
            Snapshot::Disk(s) => self.disk.apply_fetch(Ok(s)),
            Snapshot::NetStats(s) => {
                self.net_rates.push(&s);
                self.net_stats.apply_fetch(Ok(s));
            }
            Snapshot::Connections(s) => self.connections.apply_fetch(Ok(s)),
            Snapshot::Processes(s) => self.processes.apply_fetch(Ok(s)),
            Snapshot::Services(s) => self.services.apply_fetch(Ok(s)),
            Snapshot::Packages(s) => self.packages.apply_fetch(Ok(s)),
            Snapshot::Logs(s) => self.logs.apply_fetch(Ok(s)),
        }
        Ok(())
    }

    fn fail_fetch(&mut self, domain: Domain, e: FetchError) {
        match domain {
            Domain::Cpu => self.cpu.apply_fetch(Err(e)),
            Domain::Memory => self.memory.apply_fetch(Err(e)),
            Domain::Disk => self.disk.apply_fetch(Err(e)),
            Domain::NetStats => self.net_stats.apply_fetch(Err(e)),
            Domain::Connections => self.connections.apply_fetch(Err(e)),
            Domain::Processes => self.processes.apply_fetch(Err(e)),
            Domain::Services => self.services.apply_fetch(Err(e)),
            Domain::Packages => self.packages.apply_fetch(Err(e)),
            Domain::Logs => self.logs.apply_fetch(Err(e)),
        }
    }

    /// Record a command outcome on the domain that owns the target.
    pub fn apply_command(&mut self, result: CommandResult, failure: Option<CommandError>) {
        match result.domain {
            Domain::Processes => {
                if let Some(e) = failure {
                    self.processes.record_command_error(e);
                }
                self.processes.apply_command(result);
            }
            Domain::Services => {
                if let Some(e) = failure {
                    self.services.record_command_error(e);
                }
                self.services.apply_command(result);
            }
            other => {
                error!(domain = %other, "command result for a domain without commands")
            }
        }
    }

    pub fn last_command(&self, domain: Domain) -> Option<&CommandResult> {
        match domain {
            Domain::Processes => self.processes.last_command(),
            Domain::Services => self.services.last_command(),
            _ => None,
        }
    }

    pub fn status(&self, domain: Domain) -> Status {
        match domain {
            Domain::Cpu => self.cpu.status(),
            Domain::Memory => self.memory.status(),
            Domain::Disk => self.disk.status(),
            Domain::NetStats => self.net_stats.status(),
            Domain::Connections => self.connections.status(),
            Domain::Processes => self.processes.status(),
            Domain::Services => self.services.status(),
            Domain::Packages => self.packages.status(),
            Domain::Logs => self.logs.status(),
        }
    }

    pub fn selected(&self, domain: Domain) -> usize {
        match domain {
            Domain::Cpu => self.cpu.selected(),
            Domain::Memory => self.memory.selected(),
            Domain::Disk => self.disk.selected(),
            Domain::NetStats => self.net_stats.selected(),
            Domain::Connections => self.connections.selected(),
            Domain::Processes => self.processes.selected(),
            Domain::Services => self.services.selected(),
            Domain::Packages => self.packages.selected(),
            Domain::Logs => self.logs.selected(),
        }
    }

    pub fn len(&self, domain: Domain) -> usize {
        match domain {
            Domain::Cpu => self.cpu.len(),
            Domain::Memory => self.memory.len(),
            Domain::Disk => self.disk.len(),
            Domain::NetStats => self.net_stats.len(),
            Domain::Connections => self.connections.len(),
            Domain::Processes => self.processes.len(),
            Domain::Services => self.services.len(),
            Domain::Packages => self.packages.len(),
            Domain::Logs => self.logs.len(),
        }
    }
}
