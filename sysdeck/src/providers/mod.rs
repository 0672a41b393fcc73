//! Snapshot providers and command executors behind one object-safe seam.
//!
//! The controller never talks to these directly: the runtime launches
//! `Backend::fetch` / `Backend::execute` futures as tasks and posts each result
//! back onto the event channel.

pub mod logs;
pub mod metrics;
pub mod network;
pub mod packages;
pub mod processes;
pub mod services;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use sysinfo::{
    CpuRefreshKind, Disks, MemoryRefreshKind, Networks, ProcessRefreshKind, RefreshKind, System,
    Users,
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::Config;
use crate::error::{CommandError, FetchError};
use crate::ops::{CommandSpec, FetchSpec};
use crate::types::{PackageManager, Sample, Snapshot};

pub use services::{ServiceBus, SystemdBus};

/// Everything the console and the agent need from the host.
pub trait Backend: Send + Sync {
    fn fetch(&self, spec: FetchSpec) -> BoxFuture<'static, Result<Snapshot, FetchError>>;
    fn execute(&self, cmd: CommandSpec) -> BoxFuture<'static, Result<(), CommandError>>;
}

/// Run synchronous collaborator work off the async threads.
pub(crate) async fn blocking<T, E, F>(f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<tokio::task::JoinError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

pub type SharedSystem = Arc<Mutex<System>>;
pub type SharedNetworks = Arc<Mutex<Networks>>;
pub type SharedDisks = Arc<Mutex<Disks>>;
pub type SharedUsers = Arc<Mutex<Users>>;

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub package_manager: Option<PackageManager>,
    pub connections_limit: usize,
    pub command_timeout: Duration,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for BackendSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            package_manager: cfg.package_manager,
            connections_limit: cfg.connections_limit,
            command_timeout: cfg.command_timeout(),
        }
    }
}

/// Long-lived host handles, built once at startup and dropped at exit.
pub struct SystemBackend<B: ServiceBus = SystemdBus> {
    sys: SharedSystem,
    networks: SharedNetworks,
    disks: SharedDisks,
    users: SharedUsers,
    cpu_primed: Arc<AtomicBool>,
    bus: Arc<B>,
    settings: BackendSettings,
}

impl SystemBackend<SystemdBus> {
    pub fn new(settings: BackendSettings) -> Self {
        Self::with_bus(SystemdBus, settings)
    }
}

impl<B: ServiceBus> SystemBackend<B> {
    pub fn with_bus(bus: B, settings: BackendSettings) -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything())
            .with_processes(ProcessRefreshKind::everything());
        let sys = System::new_with_specifics(refresh_kind);

        Self {
            sys: Arc::new(Mutex::new(sys)),
            networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
            disks: Arc::new(Mutex::new(Disks::new_with_refreshed_list())),
            users: Arc::new(Mutex::new(Users::new_with_refreshed_list())),
            cpu_primed: Arc::new(AtomicBool::new(false)),
            bus: Arc::new(bus),
            settings,
        }
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }
}

impl<B: ServiceBus> Backend for SystemBackend<B> {
    fn fetch(&self, spec: FetchSpec) -> BoxFuture<'static, Result<Snapshot, FetchError>> {
        debug!(domain = %spec.domain(), "fetch");
        match spec {
            FetchSpec::Cpu => {
                let sys = self.sys.clone();
                let primed = self.cpu_primed.clone();
                blocking(move || {
                    let mut sys = sys.blocking_lock();
                    let first = !primed.swap(true, Ordering::AcqRel);
                    Ok(Snapshot::Cpu(Sample::now(metrics::cpu(&mut sys, first))))
                })
                .boxed()
            }
            FetchSpec::Memory => {
                let sys = self.sys.clone();
                blocking(move || {
                    let mut sys = sys.blocking_lock();
                    Ok(Snapshot::Memory(Sample::now(metrics::memory(&mut sys))))
                })
                .boxed()
            }
            FetchSpec::Disk => {
                let disks = self.disks.clone();
                blocking(move || {
                    let mut disks = disks.blocking_lock();
                    Ok(Snapshot::Disk(Sample::now(metrics::disks(&mut disks))))
                })
                .boxed()
            }
            FetchSpec::NetStats => {
                let networks = self.networks.clone();
                blocking(move || {
                    let mut nets = networks.blocking_lock();
                    Ok(Snapshot::NetStats(Sample::now(network::interfaces(&mut nets))))
                })
                .boxed()
            }
            FetchSpec::Connections => {
                let limit = self.settings.connections_limit;
                blocking(move || {
                    network::connections(limit).map(|c| Snapshot::Connections(Sample::now(c)))
                })
                .boxed()
            }
            FetchSpec::Processes => {
                let sys = self.sys.clone();
                let users = self.users.clone();
                blocking(move || {
                    let mut sys = sys.blocking_lock();
                    let users = users.blocking_lock();
                    Ok(Snapshot::Processes(Sample::now(processes::list(
                        &mut sys, &users,
                    ))))
                })
                .boxed()
            }
            FetchSpec::Services => {
                let bus = self.bus.clone();
                async move {
                    let units = services::list(bus.as_ref()).await?;
                    Ok(Snapshot::Services(Sample::now(units)))
                }
                .boxed()
            }
            FetchSpec::Packages => {
                let configured = self.settings.package_manager;
                async move {
                    let list = packages::list(configured).await?;
                    Ok(Snapshot::Packages(Sample::now(list)))
                }
                .boxed()
            }
            FetchSpec::Logs(query) => blocking(move || {
                logs::parse(&query).map(|entries| Snapshot::Logs(Sample::now(entries)))
            })
            .boxed(),
        }
    }

    fn execute(&self, cmd: CommandSpec) -> BoxFuture<'static, Result<(), CommandError>> {
        debug!(command = %cmd.describe(), "execute");
        match cmd {
            CommandSpec::Terminate { pid, signal } => {
                let sys = self.sys.clone();
                blocking(move || {
                    let mut sys = sys.blocking_lock();
                    processes::terminate(&mut sys, pid, signal)
                })
                .boxed()
            }
            CommandSpec::Renice { pid, nice } => processes::renice(pid, nice).boxed(),
            CommandSpec::Service { unit, transition } => {
                let bus = self.bus.clone();
                let wait = self.settings.command_timeout;
                async move { services::transition(bus.as_ref(), &unit, transition, wait).await }
                    .boxed()
            }
        }
    }
}
