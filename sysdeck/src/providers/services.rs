//! Service units over the systemd D-Bus manager.
//!
//! `ServiceBus` is the seam: the executor below only needs a way to connect,
//! submit a transition and await its single completion value, so tests drive
//! it with an in-memory bus.

use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use zbus::zvariant::OwnedObjectPath;

use crate::error::{BusError, CommandError, FetchError};
use crate::ops::Transition;
use crate::types::ServiceInfo;

/// Job mode for every transition: replace a conflicting queued job.
pub const JOB_MODE: &str = "replace";

pub trait ServiceBus: Send + Sync + 'static {
    type Session: BusSession;

    fn connect(&self) -> impl Future<Output = Result<Self::Session, BusError>> + Send;
}

pub trait BusSession: Send + Sync {
    fn list_units(&self) -> impl Future<Output = Result<Vec<ServiceInfo>, BusError>> + Send;

    /// Submit a transition. The receiver yields the job's terminal result
    /// string exactly once.
    fn submit(
        &self,
        unit: &str,
        transition: Transition,
        mode: &str,
    ) -> impl Future<Output = Result<oneshot::Receiver<String>, BusError>> + Send;
}

/// Connect, submit with mode `replace`, then wait for the job's result.
/// Nothing is submitted when the connection fails.
pub async fn transition<B: ServiceBus>(
    bus: &B,
    unit: &str,
    kind: Transition,
    wait: Duration,
) -> Result<(), CommandError> {
    let session = bus
        .connect()
        .await
        .map_err(|e| CommandError::Connect(e.0))?;
    let done = session
        .submit(unit, kind, JOB_MODE)
        .await
        .map_err(|e| CommandError::Rejected(e.0))?;
    debug!(unit, verb = kind.verb(), "job submitted");
    match tokio::time::timeout(wait, done).await {
        Ok(Ok(result)) if result == "done" => Ok(()),
        Ok(Ok(result)) => {
            warn!(unit, verb = kind.verb(), %result, "job did not complete");
            Err(CommandError::Failed(result))
        }
        // sender dropped or the job never reported back
        Ok(Err(_)) | Err(_) => Err(CommandError::NoCompletion),
    }
}

/// Loaded `.service` units, ordered by name.
pub async fn list<B: ServiceBus>(bus: &B) -> Result<Vec<ServiceInfo>, FetchError> {
    let session = bus
        .connect()
        .await
        .map_err(|e| FetchError::Unreachable(e.0))?;
    let mut units = session
        .list_units()
        .await
        .map_err(|e| FetchError::Unreachable(e.0))?;
    units.retain(|u| u.name.ends_with(".service"));
    units.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(units)
}

type UnitRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    OwnedObjectPath,
    u32,
    String,
    OwnedObjectPath,
);

#[zbus::proxy(
    interface = "org.freedesktop.systemd1.Manager",
    default_service = "org.freedesktop.systemd1",
    default_path = "/org/freedesktop/systemd1"
)]
trait Systemd1Manager {
    fn start_unit(&self, name: &str, mode: &str) -> zbus::Result<OwnedObjectPath>;
    fn stop_unit(&self, name: &str, mode: &str) -> zbus::Result<OwnedObjectPath>;
    fn restart_unit(&self, name: &str, mode: &str) -> zbus::Result<OwnedObjectPath>;
    fn subscribe(&self) -> zbus::Result<()>;
    fn list_units(&self) -> zbus::Result<Vec<UnitRow>>;

    #[zbus(signal)]
    fn job_removed(
        &self,
        id: u32,
        job: OwnedObjectPath,
        unit: String,
        result: String,
    ) -> zbus::Result<()>;
}

/// The system bus. A fresh connection per call keeps no state between commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemdBus;

pub struct SystemdSession {
    manager: Systemd1ManagerProxy<'static>,
}

impl ServiceBus for SystemdBus {
    type Session = SystemdSession;

    async fn connect(&self) -> Result<SystemdSession, BusError> {
        let conn = zbus::Connection::system().await?;
        let manager = Systemd1ManagerProxy::new(&conn).await?;
        // JobRemoved is only broadcast to subscribed clients
        manager.subscribe().await?;
        Ok(SystemdSession { manager })
    }
}

impl BusSession for SystemdSession {
    async fn list_units(&self) -> Result<Vec<ServiceInfo>, BusError> {
        let rows = self.manager.list_units().await?;
        Ok(rows
            .into_iter()
            .map(|(name, description, load_state, active_state, sub_state, ..)| ServiceInfo {
                name,
                description,
                load_state,
                active_state,
                sub_state,
            })
            .collect())
    }

    async fn submit(
        &self,
        unit: &str,
        transition: Transition,
        mode: &str,
    ) -> Result<oneshot::Receiver<String>, BusError> {
        // Listen before submitting so a fast job cannot finish unseen.
        let mut removed = self.manager.receive_job_removed().await?;
        let job = match transition {
            Transition::Start => self.manager.start_unit(unit, mode).await?,
            Transition::Stop => self.manager.stop_unit(unit, mode).await?,
            Transition::Restart => self.manager.restart_unit(unit, mode).await?,
        };

        let (mut tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => return,
                    signal = removed.next() => {
                        let Some(signal) = signal else { return };
                        let Ok(args) = signal.args() else { continue };
                        if *args.job() == job {
                            let _ = tx.send(args.result().clone());
                            return;
                        }
                    }
                }
            }
        });
        Ok(rx)
    }
}
