//! Bordered table panel shared by every listing view: header row, windowed
//! rows that follow the selection, loading indicator and inline error line.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Widget},
};

use crate::state::Status;
use crate::ui::theme;
use crate::ui::util::truncate;

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub title: &'static str,
    pub width: Constraint,
}

impl Column {
    pub const fn new(title: &'static str, width: Constraint) -> Self {
        Self { title, width }
    }
}

pub struct Listing<'a> {
    pub title: String,
    pub columns: &'a [Column],
    pub rows: Vec<Vec<String>>,
    pub selected: Option<usize>,
    pub status: Status,
    pub error: Option<String>,
}

/// Loading text, with the last failure when a fetch already failed.
pub fn loading_text(error: Option<&str>) -> String {
    match error {
        Some(e) => format!("Loading… (retrying: {e})"),
        None => "Loading…".to_string(),
    }
}

/// First visible row so `selected` stays on screen.
pub fn window_start(selected: usize, viewport: usize) -> usize {
    if viewport == 0 {
        return 0;
    }
    selected.saturating_sub(viewport - 1)
}

pub fn inner(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

pub fn draw_loading(buf: &mut Buffer, area: Rect, error: Option<&str>) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let text = truncate(&loading_text(error), area.width as usize);
    buf.set_stringn(
        area.x,
        area.y,
        text,
        area.width as usize,
        Style::default().fg(theme::LOADING_FG),
    );
}

pub fn draw_error_line(buf: &mut Buffer, area: Rect, error: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let y = area.y + area.height - 1;
    let text = truncate(&format!("! {error}"), area.width as usize);
    buf.set_stringn(
        area.x,
        y,
        text,
        area.width as usize,
        Style::default().fg(theme::ERROR_FG),
    );
}

impl Widget for Listing<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Block::default()
            .borders(Borders::ALL)
            .title(self.title.as_str())
            .render(area, buf);
        let inner = inner(area);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        if self.status == Status::Loading {
            draw_loading(buf, inner, self.error.as_deref());
            return;
        }

        let cols = Layout::horizontal(self.columns.iter().map(|c| c.width))
            .spacing(1)
            .split(Rect { height: 1, ..inner });
        for (col, rect) in self.columns.iter().zip(cols.iter()) {
            let w = rect.width as usize;
            buf.set_stringn(rect.x, rect.y, truncate(col.title, w), w, theme::column_header());
        }

        let error_rows = u16::from(self.error.is_some());
        let viewport = inner.height.saturating_sub(1 + error_rows) as usize;
        let selected = self.selected.unwrap_or(0);
        let start = window_start(selected, viewport);

        for (i, row) in self.rows.iter().enumerate().skip(start).take(viewport) {
            let y = inner.y + 1 + (i - start) as u16;
            if self.selected == Some(i) {
                buf.set_style(Rect { y, height: 1, ..inner }, theme::selected_row());
            }
            for (cell, rect) in row.iter().zip(cols.iter()) {
                let w = rect.width as usize;
                buf.set_stringn(rect.x, y, truncate(cell, w), w, Style::default());
            }
        }

        if let Some(e) = &self.error {
            draw_error_line(buf, inner, e);
        }
    }
}
