//! Operation vocabulary shared by the controller, the runtime and the backend:
//! which domain a fetch targets, which command to run, and how results come back.

use std::fmt;
use std::path::PathBuf;

use crate::error::{CommandError, FetchError};
use crate::types::{Severity, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    Cpu,
    Memory,
    Disk,
    NetStats,
    Connections,
    Processes,
    Services,
    Packages,
    Logs,
}

impl Domain {
    pub const ALL: [Domain; 9] = [
        Domain::Cpu,
        Domain::Memory,
        Domain::Disk,
        Domain::NetStats,
        Domain::Connections,
        Domain::Processes,
        Domain::Services,
        Domain::Packages,
        Domain::Logs,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Domain::Cpu => "cpu",
            Domain::Memory => "memory",
            Domain::Disk => "disk",
            Domain::NetStats => "network",
            Domain::Connections => "connections",
            Domain::Processes => "processes",
            Domain::Services => "services",
            Domain::Packages => "packages",
            Domain::Logs => "logs",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewId {
    Dashboard,
    Processes,
    Services,
    Network,
    Packages,
    Logs,
}

impl ViewId {
    pub const ALL: [ViewId; 6] = [
        ViewId::Dashboard,
        ViewId::Processes,
        ViewId::Services,
        ViewId::Network,
        ViewId::Packages,
        ViewId::Logs,
    ];

    pub fn index(self) -> usize {
        match self {
            ViewId::Dashboard => 0,
            ViewId::Processes => 1,
            ViewId::Services => 2,
            ViewId::Network => 3,
            ViewId::Packages => 4,
            ViewId::Logs => 5,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        ViewId::ALL.get(i).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewId::Dashboard => "Dashboard",
            ViewId::Processes => "Processes",
            ViewId::Services => "Services",
            ViewId::Network => "Network",
            ViewId::Packages => "Packages",
            ViewId::Logs => "Logs",
        }
    }
}

/// Log engine query. Empty filters mean unfiltered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub path: PathBuf,
    pub pattern: Option<String>,
    /// "%Y-%m-%d %H:%M:%S"
    pub since: Option<String>,
    pub until: Option<String>,
    pub severity: Option<Severity>,
    pub max_entries: usize,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/var/log/syslog"),
            pattern: None,
            since: None,
            until: None,
            severity: None,
            max_entries: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchSpec {
    Cpu,
    Memory,
    Disk,
    NetStats,
    Connections,
    Processes,
    Services,
    Packages,
    Logs(LogQuery),
}

impl FetchSpec {
    pub fn domain(&self) -> Domain {
        match self {
            FetchSpec::Cpu => Domain::Cpu,
            FetchSpec::Memory => Domain::Memory,
            FetchSpec::Disk => Domain::Disk,
            FetchSpec::NetStats => Domain::NetStats,
            FetchSpec::Connections => Domain::Connections,
            FetchSpec::Processes => Domain::Processes,
            FetchSpec::Services => Domain::Services,
            FetchSpec::Packages => Domain::Packages,
            FetchSpec::Logs(_) => Domain::Logs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Term,
    Kill,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Term => "SIGTERM",
            Signal::Kill => "SIGKILL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Start,
    Stop,
    Restart,
}

impl Transition {
    pub fn verb(self) -> &'static str {
        match self {
            Transition::Start => "start",
            Transition::Stop => "stop",
            Transition::Restart => "restart",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    Terminate { pid: u32, signal: Signal },
    Renice { pid: u32, nice: i32 },
    Service { unit: String, transition: Transition },
}

impl CommandSpec {
    pub fn domain(&self) -> Domain {
        match self {
            CommandSpec::Terminate { .. } | CommandSpec::Renice { .. } => Domain::Processes,
            CommandSpec::Service { .. } => Domain::Services,
        }
    }

    /// pid or unit name
    pub fn target_key(&self) -> String {
        match self {
            CommandSpec::Terminate { pid, .. } | CommandSpec::Renice { pid, .. } => pid.to_string(),
            CommandSpec::Service { unit, .. } => unit.clone(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            CommandSpec::Terminate { pid, signal } => format!("{} {pid}", signal.as_str()),
            CommandSpec::Renice { pid, nice } => format!("renice {pid} to {nice}"),
            CommandSpec::Service { unit, transition } => format!("{} {unit}", transition.verb()),
        }
    }
}

/// What a view asks the controller to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Fetch(FetchSpec),
    Command(CommandSpec),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(pub u64);

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpKind {
    Fetch(FetchSpec),
    Command(CommandSpec),
}

/// A launched provider or executor call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub id: OpId,
    pub origin: ViewId,
    pub kind: OpKind,
}

impl Operation {
    pub fn domain(&self) -> Domain {
        match &self.kind {
            OpKind::Fetch(spec) => spec.domain(),
            OpKind::Command(cmd) => cmd.domain(),
        }
    }

    pub fn is_fetch(&self) -> bool {
        matches!(self.kind, OpKind::Fetch(_))
    }
}

/// Result payload posted back by a worker task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Fetched(Result<Snapshot, FetchError>),
    Commanded(Result<(), CommandError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Succeeded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub domain: Domain,
    pub target_key: String,
    pub action: String,
    pub outcome: CommandOutcome,
}

impl CommandResult {
    pub fn summary(&self) -> String {
        match &self.outcome {
            CommandOutcome::Succeeded => format!("{}: ok", self.action),
            CommandOutcome::Failed(reason) => format!("{}: failed ({reason})", self.action),
        }
    }
}

impl Snapshot {
    pub fn domain(&self) -> Domain {
        match self {
            Snapshot::Cpu(_) => Domain::Cpu,
            Snapshot::Memory(_) => Domain::Memory,
            Snapshot::Disk(_) => Domain::Disk,
            Snapshot::NetStats(_) => Domain::NetStats,
            Snapshot::Connections(_) => Domain::Connections,
            Snapshot::Processes(_) => Domain::Processes,
            Snapshot::Services(_) => Domain::Services,
            Snapshot::Packages(_) => Domain::Packages,
            Snapshot::Logs(_) => Domain::Logs,
        }
    }
}
