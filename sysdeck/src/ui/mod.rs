//! Rendering: a pure function from the active view and the store to a buffer.
//! The terminal draw goes through the same `Widget` impl.

pub mod cpu;
pub mod disks;
pub mod header;
pub mod listing;
pub mod mem;
pub mod net;
pub mod theme;
pub mod util;

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    widgets::Widget,
};

use crate::ops::ViewId;
use crate::state::Store;
use crate::views::View;

/// One frame's inputs.
pub struct Screen<'a> {
    pub active: ViewId,
    pub view: &'a dyn View,
    pub store: &'a Store,
}

impl Widget for &Screen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [top, body, bottom] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(area);
        header::draw_header(buf, top, self.active);
        self.view.render(self.store, body, buf);
        let last = self
            .view
            .command_domain()
            .and_then(|d| self.store.last_command(d));
        header::draw_status(buf, bottom, last, self.view.hints());
    }
}

/// Same inputs give an identical buffer.
pub fn render(screen: &Screen<'_>, width: u16, height: u16) -> Buffer {
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    screen.render(area, &mut buf);
    buf
}

/// Text of one buffer row, for tests and snapshots.
pub fn row_text(buf: &Buffer, y: u16) -> String {
    let area = buf.area;
    (area.x..area.x + area.width)
        .map(|x| buf[(x, y)].symbol())
        .collect()
}
