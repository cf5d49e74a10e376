use std::collections::BTreeSet;

use crate::format::format_hashrate;
use crate::model::{DiskUsage, PerformanceMetrics, PoolSnapshot};
use crate::view::Tone;

pub const DISK_WARNING_PCT: f64 = 80.0;
pub const DISK_CRITICAL_PCT: f64 = 90.0;
pub const CPU_HIGH_PCT: f64 = 90.0;
pub const MEMORY_HIGH_PCT: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertKind {
    PoolRunning,
    WaitingForMiners,
    MinersConnected,
    PoolHashrate,
    NodePeers,
    PoolUnreachable,
    CheckPoolService,
    DiskCritical,
    DiskWarning,
    HighCpu,
    HighMemory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlertLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl AlertLevel {
    pub fn tone(&self) -> Tone {
        match self {
            AlertLevel::Success => Tone::Good,
            AlertLevel::Info => Tone::Neutral,
            AlertLevel::Warning => Tone::Caution,
            AlertLevel::Error => Tone::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub kind: AlertKind,
    pub level: AlertLevel,
    pub message: String,
}

impl Alert {
    fn new(kind: AlertKind, level: AlertLevel, message: impl Into<String>) -> Self {
        Self { kind, level, message: message.into() }
    }
}

/// Evaluates every advisory condition in a fixed order.
///
/// Conditions are independent: all that apply are returned, in evaluation
/// order. Pool health is judged from the chain height the snapshot reports.
pub fn evaluate(
    pool: Option<&PoolSnapshot>,
    disk: Option<&DiskUsage>,
    perf: Option<&PerformanceMetrics>,
) -> Vec<Alert> {
    let mut out = Vec::new();

    match pool.filter(|p| p.block_height().unwrap_or(0) > 0) {
        Some(pool) => {
            out.push(Alert::new(AlertKind::PoolRunning, AlertLevel::Success, "✓ Pool running normally"));
            if let Some(stats) = &pool.pool_stats {
                let miners = stats.connected_miners.unwrap_or(0);
                let hashrate = stats.pool_hashrate.unwrap_or(0.0);
                if miners == 0 && hashrate == 0.0 {
                    out.push(Alert::new(
                        AlertKind::WaitingForMiners,
                        AlertLevel::Info,
                        "ℹ Waiting for miners to connect",
                    ));
                } else if miners > 0 {
                    out.push(Alert::new(
                        AlertKind::MinersConnected,
                        AlertLevel::Success,
                        format!("✓ {} miner(s) connected", miners),
                    ));
                }
                if hashrate > 0.0 {
                    out.push(Alert::new(
                        AlertKind::PoolHashrate,
                        AlertLevel::Success,
                        format!("✓ Pool hashrate: {}", format_hashrate(hashrate)),
                    ));
                }
            }
            if let Some(peers) = pool.connected_peers().filter(|p| *p > 0) {
                out.push(Alert::new(
                    AlertKind::NodePeers,
                    AlertLevel::Success,
                    format!("✓ Node connected to {} peers", peers),
                ));
            }
        }
        None => {
            out.push(Alert::new(AlertKind::PoolUnreachable, AlertLevel::Error, "✗ Unable to retrieve pool data"));
            out.push(Alert::new(
                AlertKind::CheckPoolService,
                AlertLevel::Info,
                "ℹ Check if Miningcore is running: docker-compose ps",
            ));
        }
    }

    if let Some(pct) = disk.and_then(|d| d.usage_percent) {
        if pct >= DISK_CRITICAL_PCT {
            out.push(Alert::new(
                AlertKind::DiskCritical,
                AlertLevel::Error,
                format!("⚠ CRITICAL: Disk usage at {}%", pct),
            ));
        } else if pct >= DISK_WARNING_PCT {
            out.push(Alert::new(
                AlertKind::DiskWarning,
                AlertLevel::Warning,
                format!("⚠ WARNING: Disk usage at {}%", pct),
            ));
        }
    }

    if let Some(cpu) = perf.and_then(|p| p.cpu_percent()) {
        if cpu >= CPU_HIGH_PCT {
            out.push(Alert::new(AlertKind::HighCpu, AlertLevel::Warning, format!("⚠ High CPU usage: {}%", cpu)));
        }
    }

    if let Some(mem) = perf.and_then(|p| p.memory()).and_then(|m| m.usage_percent) {
        if mem >= MEMORY_HIGH_PCT {
            out.push(Alert::new(
                AlertKind::HighMemory,
                AlertLevel::Warning,
                format!("⚠ High memory usage: {}%", mem),
            ));
        }
    }

    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Raised(Alert),
    Cleared(AlertKind),
}

/// Remembers which warning/error alerts were active last cycle so each
/// episode is reported once when it starts and once when it ends.
#[derive(Debug, Default, Clone)]
pub struct AlertLatch {
    active: BTreeSet<AlertKind>,
}

impl AlertLatch {
    pub fn observe(&mut self, alerts: &[Alert]) -> Vec<Transition> {
        let firing: Vec<&Alert> = alerts.iter().filter(|a| a.level >= AlertLevel::Warning).collect();
        let now: BTreeSet<AlertKind> = firing.iter().map(|a| a.kind).collect();

        let mut out: Vec<Transition> = firing
            .into_iter()
            .filter(|a| !self.active.contains(&a.kind))
            .map(|a| Transition::Raised(a.clone()))
            .collect();
        out.extend(self.active.difference(&now).map(|k| Transition::Cleared(*k)));

        self.active = now;
        out
    }
}
