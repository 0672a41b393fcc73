//! Memory and swap gauges.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Gauge, Widget},
};

use crate::state::{Status, ViewState};
use crate::types::MemorySnapshot;
use crate::ui::listing::{draw_loading, inner};
use crate::ui::util::human;

fn gauge(buf: &mut Buffer, area: Rect, title: &str, used: u64, total: u64, color: Color) {
    let pct = if total > 0 {
        (used as f64 / total as f64 * 100.0).round().min(100.0) as u16
    } else {
        0
    };
    Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .gauge_style(Style::default().fg(color))
        .percent(pct)
        .label(format!("{} / {}", human(used), human(total)))
        .render(area, buf);
}

pub fn draw_mem(buf: &mut Buffer, area: Rect, state: &ViewState<MemorySnapshot>) {
    match state.data() {
        Some(m) => gauge(buf, area, "Memory", m.used, m.total, Color::Magenta),
        None => placeholder(buf, area, "Memory", state),
    }
}

pub fn draw_swap(buf: &mut Buffer, area: Rect, state: &ViewState<MemorySnapshot>) {
    match state.data() {
        Some(m) => gauge(buf, area, "Swap", m.swap_used, m.swap_total, Color::Yellow),
        None => placeholder(buf, area, "Swap", state),
    }
}

fn placeholder(buf: &mut Buffer, area: Rect, title: &str, state: &ViewState<MemorySnapshot>) {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .render(area, buf);
    if state.status() == Status::Loading {
        let err = state.last_error().map(|e| e.to_string());
        draw_loading(buf, inner(area), err.as_deref());
    }
}
