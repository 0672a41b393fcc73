use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    widgets::Widget,
};

use crate::ops::{FetchSpec, LogQuery, Request, ViewId};
use crate::state::Store;
use crate::types::Severity;
use crate::ui::listing::{Column, Listing};
use crate::views::{error_text, navigate, refresh, View};

const COLS: [Column; 4] = [
    Column::new("Time", Constraint::Length(16)),
    Column::new("Level", Constraint::Length(5)),
    Column::new("Source", Constraint::Length(16)),
    Column::new("Message", Constraint::Min(10)),
];

pub struct LogsView {
    base: LogQuery,
    severity: Option<Severity>,
}

impl LogsView {
    pub fn new(base: LogQuery) -> Self {
        let severity = base.severity;
        Self { base, severity }
    }

    pub fn severity(&self) -> Option<Severity> {
        self.severity
    }

    pub fn query(&self) -> LogQuery {
        LogQuery {
            severity: self.severity,
            ..self.base.clone()
        }
    }

    /// all -> ERROR -> WARN -> INFO -> DEBUG -> all
    fn cycle_severity(&mut self) {
        self.severity = match self.severity {
            None => Some(Severity::Error),
            Some(Severity::Error) => Some(Severity::Warn),
            Some(Severity::Warn) => Some(Severity::Info),
            Some(Severity::Info) => Some(Severity::Debug),
            Some(Severity::Debug) => None,
        };
    }
}

impl View for LogsView {
    fn id(&self) -> ViewId {
        ViewId::Logs
    }

    fn fetches(&self) -> Vec<FetchSpec> {
        vec![FetchSpec::Logs(self.query())]
    }

    fn handle_key(&mut self, key: KeyEvent, store: &mut Store) -> Vec<Request> {
        if navigate(&mut store.logs, &key) {
            return Vec::new();
        }
        match key.code {
            KeyCode::Char('r') => refresh(self.fetches()),
            KeyCode::Char('f') => {
                self.cycle_severity();
                refresh(self.fetches())
            }
            _ => Vec::new(),
        }
    }

    fn render(&self, store: &Store, area: Rect, buf: &mut Buffer) {
        let state = &store.logs;
        let rows = state
            .data()
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| {
                        vec![
                            e.timestamp.clone(),
                            e.severity.as_str().to_string(),
                            e.source.clone(),
                            e.message.clone(),
                        ]
                    })
                    .collect()
            })
            .unwrap_or_default();
        let filter = self.severity.map(Severity::as_str).unwrap_or("all");
        Listing {
            title: format!(
                "Logs {} [{filter}] ({})",
                self.base.path.display(),
                state.len()
            ),
            columns: &COLS,
            rows,
            selected: (!state.is_empty()).then_some(state.selected()),
            status: state.status(),
            error: error_text(state),
        }
        .render(area, buf);
    }

    fn hints(&self) -> &'static str {
        "j/k move  f severity filter  r refresh"
    }
}
