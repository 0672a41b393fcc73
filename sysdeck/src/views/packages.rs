use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    widgets::Widget,
};

use crate::ops::{FetchSpec, Request, ViewId};
use crate::state::Store;
use crate::ui::listing::{Column, Listing};
use crate::views::{error_text, navigate, refresh, View};

const COLS: [Column; 4] = [
    Column::new("Package", Constraint::Length(28)),
    Column::new("Version", Constraint::Length(20)),
    Column::new("Size", Constraint::Length(8)),
    Column::new("Description", Constraint::Min(10)),
];

pub struct PackagesView;

impl View for PackagesView {
    fn id(&self) -> ViewId {
        ViewId::Packages
    }

    fn fetches(&self) -> Vec<FetchSpec> {
        vec![FetchSpec::Packages]
    }

    fn handle_key(&mut self, key: KeyEvent, store: &mut Store) -> Vec<Request> {
        if navigate(&mut store.packages, &key) {
            return Vec::new();
        }
        match key.code {
            KeyCode::Char('r') => refresh(self.fetches()),
            _ => Vec::new(),
        }
    }

    fn render(&self, store: &Store, area: Rect, buf: &mut Buffer) {
        let state = &store.packages;
        let (manager, rows) = state
            .data()
            .map(|list| {
                let rows = list
                    .packages
                    .iter()
                    .map(|p| {
                        vec![
                            p.name.clone(),
                            p.version.clone(),
                            p.size.clone(),
                            p.description.clone(),
                        ]
                    })
                    .collect();
                (list.manager.as_str(), rows)
            })
            .unwrap_or(("?", Vec::new()));
        Listing {
            title: format!("Packages [{manager}] ({})", state.len()),
            columns: &COLS,
            rows,
            selected: (!state.is_empty()).then_some(state.selected()),
            status: state.status(),
            error: error_text(state),
        }
        .render(area, buf);
    }
}
