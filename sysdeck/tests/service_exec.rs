//! Service listing and transitions against an in-memory service bus.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;

use sysdeck::error::{BusError, CommandError, FetchError};
use sysdeck::ops::{CommandSpec, FetchSpec, Transition};
use sysdeck::providers::services::{self, BusSession, ServiceBus, JOB_MODE};
use sysdeck::providers::{Backend, BackendSettings, SystemBackend};
use sysdeck::types::{ServiceInfo, Snapshot};

#[derive(Debug, Clone)]
enum Reply {
    Result(&'static str),
    DropSender,
    Silent,
}

#[derive(Debug)]
struct FakeState {
    connect_error: Option<&'static str>,
    submit_error: Option<&'static str>,
    reply: Reply,
    units: Vec<ServiceInfo>,
    submitted: Vec<(String, Transition, String)>,
    parked: Vec<oneshot::Sender<String>>,
}

#[derive(Clone)]
struct FakeBus(Arc<Mutex<FakeState>>);

impl FakeBus {
    fn new(reply: Reply) -> Self {
        FakeBus(Arc::new(Mutex::new(FakeState {
            connect_error: None,
            submit_error: None,
            reply,
            units: Vec::new(),
            submitted: Vec::new(),
            parked: Vec::new(),
        })))
    }

    fn submitted(&self) -> Vec<(String, Transition, String)> {
        self.0.lock().unwrap().submitted.clone()
    }
}

struct FakeSession(Arc<Mutex<FakeState>>);

impl ServiceBus for FakeBus {
    type Session = FakeSession;

    async fn connect(&self) -> Result<FakeSession, BusError> {
        match self.0.lock().unwrap().connect_error {
            Some(e) => Err(BusError(e.into())),
            None => Ok(FakeSession(self.0.clone())),
        }
    }
}

impl BusSession for FakeSession {
    async fn list_units(&self) -> Result<Vec<ServiceInfo>, BusError> {
        Ok(self.0.lock().unwrap().units.clone())
    }

    async fn submit(
        &self,
        unit: &str,
        transition: Transition,
        mode: &str,
    ) -> Result<oneshot::Receiver<String>, BusError> {
        let mut st = self.0.lock().unwrap();
        if let Some(e) = st.submit_error {
            return Err(BusError(e.into()));
        }
        st.submitted
            .push((unit.to_string(), transition, mode.to_string()));
        let (tx, rx) = oneshot::channel();
        match st.reply.clone() {
            Reply::Result(r) => {
                let _ = tx.send(r.to_string());
            }
            Reply::DropSender => drop(tx),
            Reply::Silent => st.parked.push(tx),
        }
        Ok(rx)
    }
}

fn unit(name: &str, active: &str) -> ServiceInfo {
    ServiceInfo {
        name: name.into(),
        description: format!("{name} daemon"),
        load_state: "loaded".into(),
        active_state: active.into(),
        sub_state: "running".into(),
    }
}

const WAIT: Duration = Duration::from_millis(200);

#[tokio::test]
async fn done_job_succeeds_with_replace_mode() {
    let bus = FakeBus::new(Reply::Result("done"));
    services::transition(&bus, "nginx.service", Transition::Restart, WAIT)
        .await
        .unwrap();
    assert_eq!(
        bus.submitted(),
        vec![(
            "nginx.service".to_string(),
            Transition::Restart,
            JOB_MODE.to_string()
        )]
    );
}

#[tokio::test]
async fn other_job_results_are_failures() {
    for result in ["failed", "canceled", "timeout", "dependency", "skipped"] {
        let bus = FakeBus::new(Reply::Result(result));
        let err = services::transition(&bus, "a.service", Transition::Start, WAIT)
            .await
            .unwrap_err();
        assert_eq!(err, CommandError::Failed(result.to_string()));
        assert!(err.to_string().contains(result));
    }
}

#[tokio::test]
async fn connect_failure_submits_nothing() {
    let bus = FakeBus::new(Reply::Result("done"));
    bus.0.lock().unwrap().connect_error = Some("no system bus");
    let err = services::transition(&bus, "a.service", Transition::Stop, WAIT)
        .await
        .unwrap_err();
    assert_eq!(err, CommandError::Connect("no system bus".into()));
    assert!(bus.submitted().is_empty());
}

#[tokio::test]
async fn rejected_submission() {
    let bus = FakeBus::new(Reply::Result("done"));
    bus.0.lock().unwrap().submit_error = Some("access denied");
    let err = services::transition(&bus, "a.service", Transition::Stop, WAIT)
        .await
        .unwrap_err();
    assert_eq!(err, CommandError::Rejected("access denied".into()));
}

#[tokio::test]
async fn missing_completion() {
    let bus = FakeBus::new(Reply::DropSender);
    let err = services::transition(&bus, "a.service", Transition::Start, WAIT)
        .await
        .unwrap_err();
    assert_eq!(err, CommandError::NoCompletion);

    let bus = FakeBus::new(Reply::Silent);
    let err = services::transition(&bus, "a.service", Transition::Start, WAIT)
        .await
        .unwrap_err();
    assert_eq!(err, CommandError::NoCompletion);
}

#[tokio::test]
async fn listing_keeps_sorted_service_units() {
    let bus = FakeBus::new(Reply::Result("done"));
    bus.0.lock().unwrap().units = vec![
        unit("zed.service", "active"),
        unit("dbus.socket", "active"),
        unit("cron.service", "inactive"),
        unit("-.mount", "active"),
    ];
    let units = services::list(&bus).await.unwrap();
    let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["cron.service", "zed.service"]);
}

#[tokio::test]
async fn listing_without_bus_is_unreachable() {
    let bus = FakeBus::new(Reply::Result("done"));
    bus.0.lock().unwrap().connect_error = Some("down");
    assert_eq!(
        services::list(&bus).await,
        Err(FetchError::Unreachable("down".into()))
    );
}

#[tokio::test]
async fn backend_routes_service_work_to_the_bus() {
    let bus = FakeBus::new(Reply::Result("done"));
    bus.0.lock().unwrap().units = vec![unit("ssh.service", "active")];
    let backend = SystemBackend::with_bus(
        bus.clone(),
        BackendSettings {
            command_timeout: WAIT,
            ..BackendSettings::default()
        },
    );

    match backend.fetch(FetchSpec::Services).await.unwrap() {
        Snapshot::Services(s) => assert_eq!(s.data.len(), 1),
        other => panic!("unexpected snapshot {other:?}"),
    }

    backend
        .execute(CommandSpec::Service {
            unit: "ssh.service".into(),
            transition: Transition::Stop,
        })
        .await
        .unwrap();
    assert_eq!(bus.submitted()[0].1, Transition::Stop);
}
