//! Scheduling scenarios for the controller: coalescing, command refetches,
//! view switching and stale completions. No runtime involved.

use std::collections::HashSet;

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use sysdeck::config::Config;
use sysdeck::controller::{Controller, Dispatch, Effect, Event};
use sysdeck::error::{CommandError, FetchError};
use sysdeck::ops::{
    CommandOutcome, CommandSpec, Domain, FetchSpec, OpId, OpKind, Operation, Outcome, Signal,
    Transition, ViewId,
};
use sysdeck::state::Status;
use sysdeck::types::{
    CpuSnapshot, LogEntry, ProcessInfo, Sample, ServiceInfo, Severity, Snapshot,
};

fn key(c: char) -> Event {
    Event::Input(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

fn code(k: KeyCode) -> Event {
    Event::Input(KeyEvent::new(k, KeyModifiers::NONE))
}

fn launched(d: &Dispatch) -> Vec<Operation> {
    d.launched().cloned().collect()
}

fn domains(d: &Dispatch) -> Vec<Domain> {
    d.launched().map(Operation::domain).collect()
}

fn find(ops: &[Operation], domain: Domain) -> Operation {
    ops.iter()
        .find(|o| o.domain() == domain)
        .cloned()
        .unwrap_or_else(|| panic!("no launch for {domain}"))
}

fn cpu(usage: f32) -> Snapshot {
    Snapshot::Cpu(Sample::now(CpuSnapshot {
        usage,
        per_core: vec![usage, usage],
        cores: 2,
        model: "test".into(),
        load_1m: 0.5,
    }))
}

fn proc_info(pid: u32) -> ProcessInfo {
    ProcessInfo {
        pid,
        name: format!("p{pid}"),
        cpu_percent: 1.0,
        mem_percent: 2.0,
        status: "Run".into(),
        user: "root".into(),
        started: Utc::now(),
        command_line: format!("/bin/p{pid}"),
        nice: 0,
    }
}

fn procs(pids: &[u32]) -> Snapshot {
    Snapshot::Processes(Sample::now(pids.iter().copied().map(proc_info).collect()))
}

fn units(states: &[(&str, &str)]) -> Snapshot {
    Snapshot::Services(Sample::now(
        states
            .iter()
            .map(|(name, active)| ServiceInfo {
                name: name.to_string(),
                description: String::new(),
                load_state: "loaded".into(),
                active_state: active.to_string(),
                sub_state: if *active == "active" { "running" } else { "dead" }.into(),
            })
            .collect(),
    ))
}

fn started() -> (Controller, Vec<Operation>) {
    let mut c = Controller::new(&Config::default());
    let d = c.init();
    let ops = launched(&d);
    (c, ops)
}

#[test]
fn init_fetches_each_domain_once_and_schedules_tick() {
    let (c, ops) = started();
    let unique: HashSet<Domain> = ops.iter().map(Operation::domain).collect();
    assert_eq!(unique.len(), ops.len(), "duplicate startup fetches: {ops:?}");
    assert_eq!(unique, Domain::ALL.into_iter().collect());
    assert!(ops.iter().all(Operation::is_fetch));
    assert_eq!(c.in_flight().count(), ops.len());
    for d in Domain::ALL {
        assert_eq!(c.store().status(d), Status::Loading);
    }
}

#[test]
fn init_requests_render_and_a_tick() {
    let mut c = Controller::new(&Config::default());
    let d = c.init();
    assert!(d.render);
    assert!(d
        .effects
        .iter()
        .any(|e| matches!(e, Effect::ScheduleTick(t) if *t == Config::default().tick())));
}

#[test]
fn tick_coalesces_with_in_flight_dashboard_fetches() {
    let (mut c, _) = started();
    let d = c.dispatch(Event::Tick);
    assert!(domains(&d).is_empty());
    assert!(!d.render);
    assert!(matches!(d.effects.last(), Some(Effect::ScheduleTick(_))));
}

#[test]
fn tick_relaunches_only_completed_dashboard_domains() {
    let (mut c, ops) = started();
    let cpu_op = find(&ops, Domain::Cpu);
    let d = c.dispatch(Event::Completed(cpu_op.id, Outcome::Fetched(Ok(cpu(40.0)))));
    assert!(d.render);
    assert_eq!(c.store().status(Domain::Cpu), Status::Ready);
    assert_eq!(c.store().cpu_hist.back(), Some(&40));

    let d = c.dispatch(Event::Tick);
    assert_eq!(domains(&d), vec![Domain::Cpu]);
    assert!(c.fetching(Domain::Cpu));
}

#[test]
fn tick_skips_dashboard_when_another_view_is_active() {
    let (mut c, ops) = started();
    for op in ops.iter().filter(|o| o.domain() == Domain::Cpu) {
        c.dispatch(Event::Completed(op.id, Outcome::Fetched(Ok(cpu(1.0)))));
    }
    c.dispatch(key('2'));
    assert_eq!(c.active(), ViewId::Processes);
    let d = c.dispatch(Event::Tick);
    assert!(domains(&d).is_empty());
}

#[test]
fn background_sampling_keeps_dashboard_ticking() {
    let cfg = Config {
        background_sampling: true,
        ..Config::default()
    };
    let mut c = Controller::new(&cfg);
    let ops = launched(&c.init());
    let cpu_op = find(&ops, Domain::Cpu);
    c.dispatch(Event::Completed(cpu_op.id, Outcome::Fetched(Ok(cpu(5.0)))));
    c.dispatch(key('3'));
    let d = c.dispatch(Event::Tick);
    assert_eq!(domains(&d), vec![Domain::Cpu]);
}

#[test]
fn fetch_failure_without_data_stays_loading() {
    let (mut c, ops) = started();
    let op = find(&ops, Domain::Services);
    c.dispatch(Event::Completed(
        op.id,
        Outcome::Fetched(Err(FetchError::Unreachable("no bus".into()))),
    ));
    assert_eq!(c.store().status(Domain::Services), Status::Loading);
    assert!(c.store().services.last_error().is_some());
    assert!(!c.fetching(Domain::Services));
}

#[test]
fn fetch_failure_after_data_marks_error_and_keeps_rows() {
    let (mut c, ops) = started();
    let op = find(&ops, Domain::Processes);
    c.dispatch(Event::Completed(op.id, Outcome::Fetched(Ok(procs(&[1, 2])))));
    c.dispatch(key('2'));
    let d = c.dispatch(key('r'));
    let again = launched(&d);
    assert_eq!(again.len(), 1);
    c.dispatch(Event::Completed(
        again[0].id,
        Outcome::Fetched(Err(FetchError::Timeout(std::time::Duration::from_secs(5)))),
    ));
    assert_eq!(c.store().status(Domain::Processes), Status::Error);
    assert_eq!(c.store().len(Domain::Processes), 2);
}

#[test]
fn refresh_key_coalesces_with_pending_fetch() {
    let (mut c, _) = started();
    c.dispatch(key('2'));
    let d = c.dispatch(key('r'));
    assert!(domains(&d).is_empty());
    assert!(d.render);
}

#[test]
fn successful_command_always_refetches_its_domain() {
    let (mut c, ops) = started();
    let op = find(&ops, Domain::Processes);
    c.dispatch(Event::Completed(op.id, Outcome::Fetched(Ok(procs(&[10, 20])))));
    c.dispatch(key('2'));
    c.dispatch(code(KeyCode::Down));

    // a refresh is pending while the command runs
    let refresh = launched(&c.dispatch(key('r')));
    assert_eq!(refresh.len(), 1);

    let d = c.dispatch(key('d'));
    let cmd = launched(&d);
    assert_eq!(cmd.len(), 1);
    assert_eq!(
        cmd[0].kind,
        OpKind::Command(CommandSpec::Terminate {
            pid: 20,
            signal: Signal::Term
        })
    );

    let d = c.dispatch(Event::Completed(cmd[0].id, Outcome::Commanded(Ok(()))));
    let after = launched(&d);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].kind, OpKind::Fetch(FetchSpec::Processes));
    assert_eq!(after[0].origin, ViewId::Processes);

    let last = c.store().last_command(Domain::Processes).unwrap();
    assert_eq!(last.outcome, CommandOutcome::Succeeded);
    assert_eq!(last.target_key, "20");
    assert_eq!(last.summary(), "SIGTERM 20: ok");
}

#[test]
fn failed_command_reports_and_does_not_refetch() {
    let (mut c, ops) = started();
    let op = find(&ops, Domain::Processes);
    c.dispatch(Event::Completed(op.id, Outcome::Fetched(Ok(procs(&[7])))));
    c.dispatch(key('2'));
    let cmd = launched(&c.dispatch(key('K')));
    assert_eq!(cmd.len(), 1);

    let d = c.dispatch(Event::Completed(
        cmd[0].id,
        Outcome::Commanded(Err(CommandError::NoSuchProcess(7))),
    ));
    assert!(domains(&d).is_empty());
    assert_eq!(c.store().status(Domain::Processes), Status::Error);
    let last = c.store().last_command(Domain::Processes).unwrap();
    assert!(matches!(last.outcome, CommandOutcome::Failed(_)));
    assert!(last.summary().contains("failed"));
    // the listing itself is untouched
    assert_eq!(c.store().len(Domain::Processes), 1);
}

#[test]
fn command_keys_need_a_selection() {
    let (mut c, _) = started();
    c.dispatch(key('2'));
    let d = c.dispatch(key('d'));
    assert!(domains(&d).is_empty());
}

#[test]
fn unknown_completion_is_ignored() {
    let (mut c, _) = started();
    let before = c.in_flight().count();
    let d = c.dispatch(Event::Completed(OpId(9_999), Outcome::Fetched(Ok(cpu(1.0)))));
    assert!(d.effects.is_empty());
    assert!(!d.render);
    assert_eq!(c.in_flight().count(), before);
    assert_eq!(c.store().status(Domain::Cpu), Status::Loading);
}

#[test]
fn duplicate_completion_is_ignored() {
    let (mut c, ops) = started();
    let op = find(&ops, Domain::Cpu);
    c.dispatch(Event::Completed(op.id, Outcome::Fetched(Ok(cpu(10.0)))));
    let d = c.dispatch(Event::Completed(op.id, Outcome::Fetched(Ok(cpu(90.0)))));
    assert!(!d.render);
    assert_eq!(c.store().cpu.data().map(|s| s.usage), Some(10.0));
}

#[test]
fn snapshot_for_wrong_domain_is_dropped() {
    let (mut c, ops) = started();
    let op = find(&ops, Domain::Memory);
    let d = c.dispatch(Event::Completed(op.id, Outcome::Fetched(Ok(cpu(3.0)))));
    assert!(!d.render);
    assert_eq!(c.store().status(Domain::Memory), Status::Loading);
    assert_eq!(c.store().status(Domain::Cpu), Status::Loading);
    assert!(!c.fetching(Domain::Memory));
}

#[test]
fn quit_keys() {
    let (mut c, _) = started();
    assert_eq!(c.dispatch(key('q')).effects, vec![Effect::Quit]);
    let ctrl_c = Event::Input(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert_eq!(c.dispatch(ctrl_c).effects, vec![Effect::Quit]);
}

#[test]
fn view_switching_by_number_and_tab() {
    let (mut c, _) = started();
    c.dispatch(key('6'));
    assert_eq!(c.active(), ViewId::Logs);
    c.dispatch(code(KeyCode::Tab));
    assert_eq!(c.active(), ViewId::Dashboard);
    c.dispatch(code(KeyCode::BackTab));
    assert_eq!(c.active(), ViewId::Logs);
    c.dispatch(Event::SwitchView(ViewId::Services));
    assert_eq!(c.active(), ViewId::Services);
    // switching launches nothing; data already loads in the background
    let d = c.dispatch(key('4'));
    assert!(domains(&d).is_empty());
    assert!(d.render);
}

#[test]
fn logs_filter_key_refetches_with_new_severity() {
    let (mut c, ops) = started();
    let logs = find(&ops, Domain::Logs);
    c.dispatch(Event::Completed(
        logs.id,
        Outcome::Fetched(Ok(Snapshot::Logs(Sample::now(Vec::new())))),
    ));
    c.dispatch(key('6'));
    let d = c.dispatch(key('f'));
    let ops = launched(&d);
    assert_eq!(ops.len(), 1);
    match &ops[0].kind {
        OpKind::Fetch(FetchSpec::Logs(q)) => {
            assert_eq!(q.severity, Some(Severity::Error))
        }
        other => panic!("unexpected launch {other:?}"),
    }
}

fn log_entry(severity: Severity, message: &str) -> LogEntry {
    LogEntry {
        timestamp: "2024-05-01 08:00:00".into(),
        severity,
        source: "cron".into(),
        message: message.into(),
    }
}

fn logs(entries: &[(Severity, &str)]) -> Snapshot {
    Snapshot::Logs(Sample::now(
        entries.iter().map(|(s, m)| log_entry(*s, m)).collect(),
    ))
}

fn logs_severity(op: &Operation) -> Option<Severity> {
    match &op.kind {
        OpKind::Fetch(FetchSpec::Logs(q)) => q.severity,
        other => panic!("unexpected launch {other:?}"),
    }
}

#[test]
fn changed_log_filter_waits_for_running_fetch() {
    let (mut c, ops) = started();
    let startup = find(&ops, Domain::Logs);
    assert_eq!(logs_severity(&startup), None);
    c.dispatch(key('6'));

    // the startup query is still running, so nothing launches yet
    let d = c.dispatch(key('f'));
    assert!(domains(&d).is_empty());
    assert!(c.queued(Domain::Logs).is_some());

    let d = c.dispatch(Event::Completed(
        startup.id,
        Outcome::Fetched(Ok(logs(&[(Severity::Info, "hello")]))),
    ));
    let next = launched(&d);
    assert_eq!(next.len(), 1);
    assert_eq!(logs_severity(&next[0]), Some(Severity::Error));
    assert!(c.fetching(Domain::Logs));
    assert!(c.queued(Domain::Logs).is_none());

    c.dispatch(Event::Completed(
        next[0].id,
        Outcome::Fetched(Ok(logs(&[(Severity::Error, "disk full")]))),
    ));
    let rows = c.store().logs.data().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].severity, Severity::Error);
    assert!(!c.fetching(Domain::Logs));
}

#[test]
fn filter_cycled_back_to_running_query_is_coalesced() {
    let (mut c, ops) = started();
    let startup = find(&ops, Domain::Logs);
    c.dispatch(key('6'));
    // all -> ERROR -> WARN -> INFO -> DEBUG -> all
    for _ in 0..5 {
        assert!(domains(&c.dispatch(key('f'))).is_empty());
    }
    assert!(c.queued(Domain::Logs).is_none());

    let d = c.dispatch(Event::Completed(
        startup.id,
        Outcome::Fetched(Ok(Snapshot::Logs(Sample::now(Vec::new())))),
    ));
    assert!(domains(&d).is_empty());
    assert!(!c.fetching(Domain::Logs));
}

#[test]
fn resize_only_redraws() {
    let (mut c, _) = started();
    let d = c.dispatch(Event::Resize(100, 40));
    assert!(d.render);
    assert!(d.effects.is_empty());
}

#[test]
fn cpu_failing_twice_without_data_keeps_loading() {
    let (mut c, ops) = started();
    let first = find(&ops, Domain::Cpu);
    c.dispatch(Event::Completed(
        first.id,
        Outcome::Fetched(Err(FetchError::PermissionDenied("/proc/stat".into()))),
    ));
    let again = find(&launched(&c.dispatch(Event::Tick)), Domain::Cpu);
    c.dispatch(Event::Completed(
        again.id,
        Outcome::Fetched(Err(FetchError::PermissionDenied("/proc/stat".into()))),
    ));
    assert_eq!(c.store().status(Domain::Cpu), Status::Loading);
    assert!(c.store().cpu.data().is_none());
    assert!(c.store().cpu.last_error().is_some());
}

#[test]
fn stopping_a_unit_refetches_and_shows_it_inactive() {
    let (mut c, ops) = started();
    let op = find(&ops, Domain::Services);
    c.dispatch(Event::Completed(
        op.id,
        Outcome::Fetched(Ok(units(&[("cron.service", "active"), ("nginx.service", "active")]))),
    ));
    c.dispatch(key('3'));
    assert_eq!(c.active(), ViewId::Services);
    c.dispatch(code(KeyCode::Down));
    assert_eq!(c.store().selected(Domain::Services), 1);

    let cmd = launched(&c.dispatch(key('x')));
    assert_eq!(cmd.len(), 1);
    assert_eq!(
        cmd[0].kind,
        OpKind::Command(CommandSpec::Service {
            unit: "nginx.service".into(),
            transition: Transition::Stop,
        })
    );

    let refetch = launched(&c.dispatch(Event::Completed(cmd[0].id, Outcome::Commanded(Ok(())))));
    assert_eq!(refetch.len(), 1);
    assert_eq!(refetch[0].kind, OpKind::Fetch(FetchSpec::Services));

    c.dispatch(Event::Completed(
        refetch[0].id,
        Outcome::Fetched(Ok(units(&[("cron.service", "active"), ("nginx.service", "inactive")]))),
    ));
    assert_eq!(c.store().status(Domain::Services), Status::Ready);
    let rows = c.store().services.data().unwrap();
    assert_eq!(rows[1].name, "nginx.service");
    assert_eq!(rows[1].active_state, "inactive");
    assert_eq!(c.store().selected(Domain::Services), 1);
}
