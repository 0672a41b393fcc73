//! Top tab bar and bottom status line.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
};

use crate::ops::{CommandOutcome, CommandResult, ViewId};
use crate::ui::theme;
use crate::ui::util::truncate;

pub fn draw_header(buf: &mut Buffer, area: Rect, active: ViewId) {
    if area.height == 0 {
        return;
    }
    let mut x = area.x;
    let right = area.x + area.width;
    let title = "sysdeck ";
    x = buf
        .set_stringn(x, area.y, title, right.saturating_sub(x) as usize, Style::default())
        .0;
    for id in ViewId::ALL {
        if x >= right {
            break;
        }
        let label = format!(" {} {} ", id.index() + 1, id.title());
        let style = if id == active {
            theme::active_tab()
        } else {
            Style::default().fg(Color::Gray)
        };
        x = buf
            .set_stringn(x, area.y, label, right.saturating_sub(x) as usize, style)
            .0;
    }
    let quit = " q quit";
    let qlen = quit.len() as u16;
    if right >= x + qlen {
        buf.set_string(right - qlen, area.y, quit, Style::default().fg(Color::DarkGray));
    }
}

pub fn draw_status(buf: &mut Buffer, area: Rect, last: Option<&CommandResult>, hints: &str) {
    if area.height == 0 {
        return;
    }
    let (text, style) = match last {
        Some(r) => {
            let fg = match r.outcome {
                CommandOutcome::Succeeded => theme::OK_FG,
                CommandOutcome::Failed(_) => theme::ERROR_FG,
            };
            (r.summary(), Style::default().fg(fg))
        }
        None => (hints.to_string(), Style::default().fg(Color::DarkGray)),
    };
    let w = area.width as usize;
    buf.set_stringn(area.x, area.y, truncate(&text, w), w, style);
}
