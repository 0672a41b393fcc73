use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    widgets::Widget,
};

use crate::ops::{CommandSpec, Domain, FetchSpec, Request, Signal, ViewId};
use crate::providers::processes::clamp_nice;
use crate::state::Store;
use crate::ui::listing::{Column, Listing};
use crate::ui::util::short_time;
use crate::views::{error_text, navigate, refresh, View};

const COLS: [Column; 9] = [
    Column::new("PID", Constraint::Length(7)),
    Column::new("Name", Constraint::Length(18)),
    Column::new("CPU %", Constraint::Length(6)),
    Column::new("MEM %", Constraint::Length(6)),
    Column::new("Status", Constraint::Length(9)),
    Column::new("User", Constraint::Length(10)),
    Column::new("NI", Constraint::Length(3)),
    Column::new("Started", Constraint::Length(11)),
    Column::new("Command", Constraint::Min(10)),
];

pub struct ProcessesView;

impl View for ProcessesView {
    fn id(&self) -> ViewId {
        ViewId::Processes
    }

    fn fetches(&self) -> Vec<FetchSpec> {
        vec![FetchSpec::Processes]
    }

    fn handle_key(&mut self, key: KeyEvent, store: &mut Store) -> Vec<Request> {
        let state = &mut store.processes;
        if navigate(state, &key) {
            return Vec::new();
        }
        if key.code == KeyCode::Char('r') {
            return refresh(self.fetches());
        }
        let Some(p) = state.selected_item() else {
            return Vec::new();
        };
        let cmd = match key.code {
            KeyCode::Char('d') => CommandSpec::Terminate {
                pid: p.pid,
                signal: Signal::Term,
            },
            KeyCode::Char('K') => CommandSpec::Terminate {
                pid: p.pid,
                signal: Signal::Kill,
            },
            KeyCode::Char('+') => CommandSpec::Renice {
                pid: p.pid,
                nice: clamp_nice(p.nice + 1),
            },
            KeyCode::Char('-') => CommandSpec::Renice {
                pid: p.pid,
                nice: clamp_nice(p.nice - 1),
            },
            _ => return Vec::new(),
        };
        vec![Request::Command(cmd)]
    }

    fn render(&self, store: &Store, area: Rect, buf: &mut Buffer) {
        let state = &store.processes;
        let rows = state
            .data()
            .map(|procs| {
                procs
                    .iter()
                    .map(|p| {
                        vec![
                            p.pid.to_string(),
                            p.name.clone(),
                            format!("{:>5.1}", p.cpu_percent),
                            format!("{:>5.1}", p.mem_percent),
                            p.status.clone(),
                            p.user.clone(),
                            p.nice.to_string(),
                            short_time(&p.started),
                            p.command_line.clone(),
                        ]
                    })
                    .collect()
            })
            .unwrap_or_default();
        Listing {
            title: format!("Processes ({})", state.len()),
            columns: &COLS,
            rows,
            selected: (!state.is_empty()).then_some(state.selected()),
            status: state.status(),
            error: error_text(state),
        }
        .render(area, buf);
    }

    fn hints(&self) -> &'static str {
        "j/k move  d TERM  K KILL  +/- nice  r refresh"
    }

    fn command_domain(&self) -> Option<Domain> {
        Some(Domain::Processes)
    }
}
