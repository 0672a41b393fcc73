//! Small utilities to manage bounded history buffers for charts.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::types::{NetStats, Sample};

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    if dq.len() == cap {
        dq.pop_front();
    }
    dq.push_back(v);
}

// Keeps a history deque per core with a fixed capacity
#[derive(Debug, Clone)]
pub struct PerCoreHistory {
    pub deques: Vec<VecDeque<u16>>,
    cap: usize,
}

impl PerCoreHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            deques: Vec::new(),
            cap,
        }
    }

    // Ensure we have one deque per core; resize on CPU topology changes
    pub fn ensure_cores(&mut self, n: usize) {
        if self.deques.len() == n {
            return;
        }
        self.deques = (0..n).map(|_| VecDeque::with_capacity(self.cap)).collect();
    }

    // Push a new sample set for all cores (values 0..=100)
    pub fn push_samples(&mut self, samples: &[f32]) {
        self.ensure_cores(samples.len());
        for (dq, v) in self.deques.iter_mut().zip(samples) {
            let val = v.clamp(0.0, 100.0).round() as u16;
            push_capped(dq, val, self.cap);
        }
    }
}

/// Download/upload rates in KB/s, diffed from successive interface samples.
#[derive(Debug, Clone)]
pub struct NetRates {
    last: Option<(u64, u64, DateTime<Utc>)>,
    pub rx_hist: VecDeque<u64>,
    pub tx_hist: VecDeque<u64>,
    pub rx_peak: u64,
    pub tx_peak: u64,
    cap: usize,
}

impl NetRates {
    pub fn new(cap: usize) -> Self {
        Self {
            last: None,
            rx_hist: VecDeque::with_capacity(cap),
            tx_hist: VecDeque::with_capacity(cap),
            rx_peak: 0,
            tx_peak: 0,
            cap,
        }
    }

    pub fn push(&mut self, sample: &Sample<Vec<NetStats>>) {
        let rx_total = sample.data.iter().map(|n| n.bytes_recv).sum::<u64>();
        let tx_total = sample.data.iter().map(|n| n.bytes_sent).sum::<u64>();
        let now = sample.taken_at;
        let (rx_kb, tx_kb) = match self.last {
            Some((prx, ptx, pts)) if now > pts => {
                let dt = (now - pts).num_milliseconds().max(1) as f64 / 1000.0;
                let rx = (rx_total.saturating_sub(prx) as f64 / dt / 1024.0).round() as u64;
                let tx = (tx_total.saturating_sub(ptx) as f64 / dt / 1024.0).round() as u64;
                (rx, tx)
            }
            _ => (0, 0),
        };
        self.last = Some((rx_total, tx_total, now));
        push_capped(&mut self.rx_hist, rx_kb, self.cap);
        push_capped(&mut self.tx_hist, tx_kb, self.cap);
        self.rx_peak = self.rx_peak.max(rx_kb);
        self.tx_peak = self.tx_peak.max(tx_kb);
    }
}
