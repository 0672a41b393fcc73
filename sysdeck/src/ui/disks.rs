//! Disk cards with per-mount gauge and title line.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Gauge, Widget},
};

use crate::state::{Status, ViewState};
use crate::types::DiskSnapshot;
use crate::ui::listing::{draw_error_line, draw_loading, inner};
use crate::ui::util::{disk_icon, human, truncate_middle};

pub fn draw_disks(buf: &mut Buffer, area: Rect, state: &ViewState<DiskSnapshot>) {
    Block::default()
        .borders(Borders::ALL)
        .title("Disks")
        .render(area, buf);
    let inner = inner(area);
    let Some(snap) = state.data() else {
        if state.status() == Status::Loading {
            let err = state.last_error().map(|e| e.to_string());
            draw_loading(buf, inner, err.as_deref());
        }
        return;
    };
    if inner.height < 3 {
        return;
    }

    let per_disk_h = 3u16;
    let max_cards = (inner.height / per_disk_h).min(snap.disks.len() as u16) as usize;
    let rows =
        Layout::vertical((0..max_cards).map(|_| Constraint::Length(per_disk_h))).split(inner);

    for (d, slot) in snap.disks.iter().zip(rows.iter()) {
        let pct = d.used_percent.round().clamp(0.0, 100.0) as u16;
        let color = if pct < 70 {
            Color::Green
        } else if pct < 90 {
            Color::Yellow
        } else {
            Color::Red
        };
        let title = format!(
            "{} {}   {} / {}  ({}%)",
            disk_icon(&d.device),
            truncate_middle(&d.mount_point, slot.width.saturating_sub(6) as usize / 2),
            human(d.used),
            human(d.total),
            pct
        );
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .render(*slot, buf);

        let card = Rect {
            x: slot.x + 1,
            y: slot.y + 1,
            width: slot.width.saturating_sub(2),
            height: slot.height.saturating_sub(2),
        };
        if card.height == 0 {
            continue;
        }
        Gauge::default()
            .percent(pct)
            .gauge_style(Style::default().fg(color))
            .render(Rect { height: 1, ..card }, buf);
    }

    if state.status() == Status::Error {
        if let Some(e) = state.last_error() {
            draw_error_line(buf, inner, &e.to_string());
        }
    }
}
