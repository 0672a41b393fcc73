//! The six screens. Each view owns only its UI-local settings; data lives in
//! the `Store` and is changed by key handlers (selection) or by the
//! controller (delivered results).

mod dashboard;
mod logs;
mod network;
mod packages;
mod processes;
mod services;

pub use dashboard::{DashboardView, DASHBOARD_FETCHES};
pub use logs::LogsView;
pub use network::NetworkView;
pub use packages::PackagesView;
pub use processes::ProcessesView;
pub use services::ServicesView;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{buffer::Buffer, layout::Rect};

use crate::config::Config;
use crate::ops::{Domain, FetchSpec, Request, ViewId};
use crate::state::{Store, ViewState};
use crate::types::Rows;

/// Rows moved by PageUp/PageDown.
pub const PAGE: usize = 10;

pub trait View {
    fn id(&self) -> ViewId;

    /// Fetches that populate this view, issued at startup and on 'r'.
    fn fetches(&self) -> Vec<FetchSpec>;

    /// Keys not consumed globally. May move the selection in place and
    /// returns the operations to launch.
    fn handle_key(&mut self, key: KeyEvent, store: &mut Store) -> Vec<Request>;

    fn render(&self, store: &Store, area: Rect, buf: &mut Buffer);

    fn hints(&self) -> &'static str {
        "j/k move  r refresh  1-6 views"
    }

    /// Domain whose command outcomes show in the status line.
    fn command_domain(&self) -> Option<Domain> {
        None
    }
}

/// The view table, indexed by `ViewId::index`.
pub fn all(cfg: &Config) -> Vec<Box<dyn View + Send>> {
    vec![
        Box::new(DashboardView),
        Box::new(ProcessesView),
        Box::new(ServicesView),
        Box::new(NetworkView::default()),
        Box::new(PackagesView),
        Box::new(LogsView::new(cfg.log_query())),
    ]
}

/// Shared cursor keys. Returns true when the key was a navigation key.
pub fn navigate<T: Rows>(state: &mut ViewState<T>, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => state.select_next(),
        KeyCode::Up | KeyCode::Char('k') => state.select_prev(),
        KeyCode::Home | KeyCode::Char('g') => state.select_first(),
        KeyCode::End | KeyCode::Char('G') => state.select_last(),
        KeyCode::PageDown => state.page_down(PAGE),
        KeyCode::PageUp => state.page_up(PAGE),
        _ => return false,
    }
    true
}

pub(crate) fn refresh(fetches: Vec<FetchSpec>) -> Vec<Request> {
    fetches.into_iter().map(Request::Fetch).collect()
}

pub(crate) fn error_text<T: Rows>(state: &ViewState<T>) -> Option<String> {
    state.last_error().map(|e| e.to_string())
}
