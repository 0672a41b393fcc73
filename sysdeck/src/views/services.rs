use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    widgets::Widget,
};

use crate::ops::{CommandSpec, Domain, FetchSpec, Request, Transition, ViewId};
use crate::state::Store;
use crate::ui::listing::{Column, Listing};
use crate::views::{error_text, navigate, refresh, View};

const COLS: [Column; 5] = [
    Column::new("Unit", Constraint::Length(32)),
    Column::new("Load", Constraint::Length(9)),
    Column::new("Active", Constraint::Length(10)),
    Column::new("Sub", Constraint::Length(10)),
    Column::new("Description", Constraint::Min(10)),
];

pub struct ServicesView;

impl View for ServicesView {
    fn id(&self) -> ViewId {
        ViewId::Services
    }

    fn fetches(&self) -> Vec<FetchSpec> {
        vec![FetchSpec::Services]
    }

    fn handle_key(&mut self, key: KeyEvent, store: &mut Store) -> Vec<Request> {
        let state = &mut store.services;
        if navigate(state, &key) {
            return Vec::new();
        }
        let transition = match key.code {
            KeyCode::Char('r') => return refresh(self.fetches()),
            KeyCode::Char('s') => Transition::Start,
            KeyCode::Char('x') => Transition::Stop,
            KeyCode::Char('t') => Transition::Restart,
            _ => return Vec::new(),
        };
        match state.selected_item() {
            Some(unit) => vec![Request::Command(CommandSpec::Service {
                unit: unit.name.clone(),
                transition,
            })],
            None => Vec::new(),
        }
    }

    fn render(&self, store: &Store, area: Rect, buf: &mut Buffer) {
        let state = &store.services;
        let rows = state
            .data()
            .map(|units| {
                units
                    .iter()
                    .map(|u| {
                        vec![
                            u.name.clone(),
                            u.load_state.clone(),
                            u.active_state.clone(),
                            u.sub_state.clone(),
                            u.description.clone(),
                        ]
                    })
                    .collect()
            })
            .unwrap_or_default();
        Listing {
            title: format!("Services ({})", state.len()),
            columns: &COLS,
            rows,
            selected: (!state.is_empty()).then_some(state.selected()),
            status: state.status(),
            error: error_text(state),
        }
        .render(area, buf);
    }

    fn hints(&self) -> &'static str {
        "j/k move  s start  x stop  t restart  r refresh"
    }

    fn command_domain(&self) -> Option<Domain> {
        Some(Domain::Services)
    }
}
