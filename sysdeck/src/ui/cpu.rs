//! CPU average sparkline + per-core mini bars.

use std::collections::VecDeque;

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline, Widget},
};

use crate::history::PerCoreHistory;
use crate::state::{Status, ViewState};
use crate::types::CpuSnapshot;
use crate::ui::listing::{draw_error_line, draw_loading, inner};
use crate::ui::theme;
use crate::ui::util::truncate;

pub fn draw_cpu_avg_graph(
    buf: &mut Buffer,
    area: Rect,
    hist: &VecDeque<u64>,
    state: &ViewState<CpuSnapshot>,
) {
    let title = match state.data() {
        Some(c) => format!(
            "CPU avg (now: {:>5.1}%, load {:.2}) {}",
            c.usage,
            c.load_1m,
            truncate(&c.model, 32)
        ),
        None => "CPU avg".into(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    if state.status() == Status::Loading {
        block.render(area, buf);
        let err = state.last_error().map(|e| e.to_string());
        draw_loading(buf, inner(area), err.as_deref());
        return;
    }

    let max_points = area.width.saturating_sub(2) as usize;
    let start = hist.len().saturating_sub(max_points);
    let data: Vec<u64> = hist.iter().skip(start).copied().collect();
    Sparkline::default()
        .block(block)
        .data(&data)
        .max(100)
        .style(Style::default().fg(theme::HEADER_FG))
        .render(area, buf);

    if state.status() == Status::Error {
        if let Some(e) = state.last_error() {
            draw_error_line(buf, inner(area), &e.to_string());
        }
    }
}

pub fn draw_per_core_bars(
    buf: &mut Buffer,
    area: Rect,
    state: &ViewState<CpuSnapshot>,
    per_core_hist: &PerCoreHistory,
) {
    Block::default()
        .borders(Borders::ALL)
        .title("Per-core")
        .render(area, buf);
    let Some(cpu) = state.data() else { return };

    let inner = inner(area);
    if inner.height == 0 {
        return;
    }

    let show_n = (inner.height as usize).min(cpu.per_core.len());
    let rows = Layout::vertical((0..show_n).map(|_| Constraint::Length(1))).split(inner);

    for (i, rect) in rows.iter().enumerate() {
        let [spark_area, label_area] =
            Layout::horizontal([Constraint::Min(6), Constraint::Length(12)]).areas(*rect);

        let curr = cpu.per_core[i].clamp(0.0, 100.0);
        let older = per_core_hist
            .deques
            .get(i)
            .and_then(|d| d.iter().rev().nth(20).copied())
            .map(f32::from)
            .unwrap_or(curr);
        let trend = if curr > older + 0.2 {
            "↑"
        } else if curr + 0.2 < older {
            "↓"
        } else {
            "╌"
        };
        let fg = theme::load_color(curr as f64);

        let hist: Vec<u64> = per_core_hist
            .deques
            .get(i)
            .map(|d| {
                let start = d.len().saturating_sub(spark_area.width as usize);
                d.iter().skip(start).map(|&v| u64::from(v)).collect()
            })
            .unwrap_or_default();
        Sparkline::default()
            .data(&hist)
            .max(100)
            .style(Style::default().fg(fg))
            .render(spark_area, buf);

        let label = format!("cpu{i:<2}{trend}{curr:>5.1}%");
        let line = Line::from(Span::styled(
            label,
            Style::default().fg(fg).add_modifier(Modifier::BOLD),
        ));
        Paragraph::new(line).right_aligned().render(label_area, buf);
    }
}
