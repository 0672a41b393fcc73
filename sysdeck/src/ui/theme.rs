//! Shared UI theme constants.

use ratatui::style::{Color, Modifier, Style};

pub const HEADER_FG: Color = Color::Cyan;
pub const ERROR_FG: Color = Color::Red;
pub const LOADING_FG: Color = Color::DarkGray;
pub const OK_FG: Color = Color::Green;

pub fn column_header() -> Style {
    Style::default().fg(HEADER_FG).add_modifier(Modifier::BOLD)
}

pub fn selected_row() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}

pub fn active_tab() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(HEADER_FG)
        .add_modifier(Modifier::BOLD)
}

/// Green/yellow/red by load percentage.
pub fn load_color(pct: f64) -> Color {
    match pct {
        x if x < 25.0 => Color::Green,
        x if x < 60.0 => Color::Yellow,
        _ => Color::Red,
    }
}
