use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Color,
};

use crate::ops::{FetchSpec, Request, ViewId};
use crate::state::Store;
use crate::ui::{cpu, disks, mem, net};
use crate::views::{refresh, View};

/// Domains sampled on every tick.
pub const DASHBOARD_FETCHES: [FetchSpec; 4] = [
    FetchSpec::Cpu,
    FetchSpec::Memory,
    FetchSpec::Disk,
    FetchSpec::NetStats,
];

pub struct DashboardView;

impl View for DashboardView {
    fn id(&self) -> ViewId {
        ViewId::Dashboard
    }

    fn fetches(&self) -> Vec<FetchSpec> {
        DASHBOARD_FETCHES.to_vec()
    }

    fn handle_key(&mut self, key: KeyEvent, _store: &mut Store) -> Vec<Request> {
        match key.code {
            KeyCode::Char('r') => refresh(self.fetches()),
            _ => Vec::new(),
        }
    }

    fn render(&self, store: &Store, area: Rect, buf: &mut Buffer) {
        let [top, mem_row, swap_row, bottom] = Layout::vertical([
            Constraint::Ratio(1, 3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(6),
        ])
        .areas(area);

        let [avg, per_core] =
            Layout::horizontal([Constraint::Percentage(66), Constraint::Percentage(34)])
                .areas(top);
        cpu::draw_cpu_avg_graph(buf, avg, &store.cpu_hist, &store.cpu);
        cpu::draw_per_core_bars(buf, per_core, &store.cpu, &store.per_core_hist);

        mem::draw_mem(buf, mem_row, &store.memory);
        mem::draw_swap(buf, swap_row, &store.memory);

        let [disk_area, net_area] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(bottom);
        disks::draw_disks(buf, disk_area, &store.disk);

        let [rx, tx] = Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(net_area);
        let rates = &store.net_rates;
        let rx_now = rates.rx_hist.back().copied().unwrap_or(0);
        let tx_now = rates.tx_hist.back().copied().unwrap_or(0);
        net::draw_net_spark(
            buf,
            rx,
            &format!("Download (KB/s): now {rx_now} | peak {}", rates.rx_peak),
            &rates.rx_hist,
            Color::Green,
        );
        net::draw_net_spark(
            buf,
            tx,
            &format!("Upload (KB/s): now {tx_now} | peak {}", rates.tx_peak),
            &rates.tx_hist,
            Color::Blue,
        );
    }

    fn hints(&self) -> &'static str {
        "r refresh  1-6/Tab views  q quit"
    }
}
