use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    widgets::Widget,
};

use crate::ops::{FetchSpec, Request, ViewId};
use crate::state::Store;
use crate::ui::listing::{Column, Listing};
use crate::ui::util::human;
use crate::views::{error_text, navigate, refresh, View};

const IFACE_COLS: [Column; 7] = [
    Column::new("Interface", Constraint::Length(14)),
    Column::new("RX", Constraint::Length(10)),
    Column::new("TX", Constraint::Length(10)),
    Column::new("RX pkts", Constraint::Length(10)),
    Column::new("TX pkts", Constraint::Length(10)),
    Column::new("Err in", Constraint::Length(7)),
    Column::new("Err out", Constraint::Length(7)),
];

const CONN_COLS: [Column; 5] = [
    Column::new("Proto", Constraint::Length(5)),
    Column::new("Local", Constraint::Length(28)),
    Column::new("Remote", Constraint::Length(28)),
    Column::new("State", Constraint::Length(12)),
    Column::new("PID", Constraint::Min(5)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    Interfaces,
    #[default]
    Connections,
}

#[derive(Debug, Default)]
pub struct NetworkView {
    focus: Focus,
}

impl NetworkView {
    pub fn focus(&self) -> Focus {
        self.focus
    }
}

impl View for NetworkView {
    fn id(&self) -> ViewId {
        ViewId::Network
    }

    fn fetches(&self) -> Vec<FetchSpec> {
        vec![FetchSpec::NetStats, FetchSpec::Connections]
    }

    fn handle_key(&mut self, key: KeyEvent, store: &mut Store) -> Vec<Request> {
        match key.code {
            KeyCode::Char('r') => return refresh(self.fetches()),
            KeyCode::Char('i') => self.focus = Focus::Interfaces,
            KeyCode::Char('c') => self.focus = Focus::Connections,
            _ => {
                match self.focus {
                    Focus::Interfaces => navigate(&mut store.net_stats, &key),
                    Focus::Connections => navigate(&mut store.connections, &key),
                };
            }
        }
        Vec::new()
    }

    fn render(&self, store: &Store, area: Rect, buf: &mut Buffer) {
        let ifaces = &store.net_stats;
        let height = (ifaces.len() as u16 + 4).max(5).min(area.height / 2);
        let [top, bottom] =
            Layout::vertical([Constraint::Length(height), Constraint::Min(0)]).areas(area);

        let iface_rows = ifaces
            .data()
            .map(|list| {
                list.iter()
                    .map(|n| {
                        vec![
                            n.interface.clone(),
                            human(n.bytes_recv),
                            human(n.bytes_sent),
                            n.packets_recv.to_string(),
                            n.packets_sent.to_string(),
                            n.errors_in.to_string(),
                            n.errors_out.to_string(),
                        ]
                    })
                    .collect()
            })
            .unwrap_or_default();
        Listing {
            title: "Interfaces".into(),
            columns: &IFACE_COLS,
            rows: iface_rows,
            selected: (self.focus == Focus::Interfaces && !ifaces.is_empty())
                .then_some(ifaces.selected()),
            status: ifaces.status(),
            error: error_text(ifaces),
        }
        .render(top, buf);

        let conns = &store.connections;
        let conn_rows = conns
            .data()
            .map(|list| {
                list.iter()
                    .map(|c| {
                        vec![
                            c.protocol.as_str().to_string(),
                            c.local.to_string(),
                            c.remote.to_string(),
                            c.status.clone(),
                            c.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
                        ]
                    })
                    .collect()
            })
            .unwrap_or_default();
        Listing {
            title: format!("Connections ({})", conns.len()),
            columns: &CONN_COLS,
            rows: conn_rows,
            selected: (self.focus == Focus::Connections && !conns.is_empty())
                .then_some(conns.selected()),
            status: conns.status(),
            error: error_text(conns),
        }
        .render(bottom, buf);
    }

    fn hints(&self) -> &'static str {
        "j/k move  i interfaces  c connections  r refresh"
    }
}
