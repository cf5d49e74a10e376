//! The surface render functions write into.
//!
//! Renderers never look regions up themselves: they call named setters on a
//! [`ViewSink`]. A sink silently ignores regions its layout does not have, so
//! the public and admin pages share one set of render functions.

use anyhow::Result;
use std::collections::HashMap;
use std::fmt::Write as _;

use crate::history::sparkline_points;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    // status indicators
    ApiStatus,
    NodeStatus,
    PoolStatus,
    NodeConnection,
    DbStatus,
    // pool stats
    ConnectedMiners,
    PoolHashrate,
    SharesPerSecond,
    TotalBlocks,
    TotalPaid,
    PoolEffort,
    EffortGauge,
    TimeToBlock,
    PoolAddress,
    // network stats
    NetworkType,
    BlockHeight,
    NetworkHashrate,
    NetworkDifficulty,
    ConnectedPeers,
    LastNetworkBlock,
    // admin derived stats
    PoolNetworkShare,
    ValidShares,
    InvalidShares,
    ShareRate,
    AvgBlockTime,
    PoolEfficiency,
    ExpectedBlocks,
    ActualBlocks,
    LuckFactor,
    // lists and tables
    BlocksList,
    MinersList,
    BlocksTable,
    MinersTable,
    // history widgets
    HashrateSparkline,
    SharesSparkline,
    HashrateChart,
    // system resources
    DiskPercent,
    DiskUsed,
    DiskTotal,
    DiskProgress,
    CpuUsage,
    MemoryUsage,
    LoadAverage,
    PostgresSize,
    NodeSize,
    LogsSize,
    BackupsSize,
    DockerContainers,
    Alerts,
    LastUpdate,
}

impl Region {
    /// Element id used by the original HTML pages.
    pub fn id(&self) -> &'static str {
        match self {
            Region::ApiStatus => "api-status",
            Region::NodeStatus => "node-status",
            Region::PoolStatus => "pool-status",
            Region::NodeConnection => "node-connection",
            Region::DbStatus => "db-status",
            Region::ConnectedMiners => "connected-miners",
            Region::PoolHashrate => "pool-hashrate",
            Region::SharesPerSecond => "shares-per-second",
            Region::TotalBlocks => "total-blocks",
            Region::TotalPaid => "total-paid",
            Region::PoolEffort => "pool-effort",
            Region::EffortGauge => "gauge-fill",
            Region::TimeToBlock => "time-to-block",
            Region::PoolAddress => "pool-address",
            Region::NetworkType => "network-type",
            Region::BlockHeight => "block-height",
            Region::NetworkHashrate => "network-hashrate",
            Region::NetworkDifficulty => "network-difficulty",
            Region::ConnectedPeers => "connected-peers",
            Region::LastNetworkBlock => "last-network-block",
            Region::PoolNetworkShare => "pool-network-share",
            Region::ValidShares => "valid-shares",
            Region::InvalidShares => "invalid-shares",
            Region::ShareRate => "share-rate",
            Region::AvgBlockTime => "avg-block-time",
            Region::PoolEfficiency => "pool-efficiency",
            Region::ExpectedBlocks => "expected-blocks",
            Region::ActualBlocks => "actual-blocks",
            Region::LuckFactor => "luck-factor",
            Region::BlocksList => "blocks-list",
            Region::MinersList => "miners-list",
            Region::BlocksTable => "blocks-table-body",
            Region::MinersTable => "miners-table-body",
            Region::HashrateSparkline => "hashrate-sparkline",
            Region::SharesSparkline => "shares-sparkline",
            Region::HashrateChart => "hashrate-chart",
            Region::DiskPercent => "disk-percent",
            Region::DiskUsed => "disk-used",
            Region::DiskTotal => "disk-total",
            Region::DiskProgress => "disk-progress",
            Region::CpuUsage => "cpu-usage",
            Region::MemoryUsage => "memory-usage",
            Region::LoadAverage => "load-average",
            Region::PostgresSize => "postgres-size",
            Region::NodeSize => "node-size",
            Region::LogsSize => "logs-size",
            Region::BackupsSize => "backups-size",
            Region::DockerContainers => "docker-containers-list",
            Region::Alerts => "alerts-list",
            Region::LastUpdate => "last-update-time",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Region::ApiStatus => "API",
            Region::NodeStatus => "Node",
            Region::PoolStatus => "Pool status",
            Region::NodeConnection => "Node connection",
            Region::DbStatus => "Database",
            Region::ConnectedMiners => "Miners",
            Region::PoolHashrate => "Pool hashrate",
            Region::SharesPerSecond => "Shares/s",
            Region::TotalBlocks => "Blocks found",
            Region::TotalPaid => "Total paid",
            Region::PoolEffort => "Effort",
            Region::EffortGauge => "Effort gauge",
            Region::TimeToBlock => "Time to block",
            Region::PoolAddress => "Pool address",
            Region::NetworkType => "Network",
            Region::BlockHeight => "Block height",
            Region::NetworkHashrate => "Network hashrate",
            Region::NetworkDifficulty => "Difficulty",
            Region::ConnectedPeers => "Peers",
            Region::LastNetworkBlock => "Last network block",
            Region::PoolNetworkShare => "Network share",
            Region::ValidShares => "Valid shares",
            Region::InvalidShares => "Invalid shares",
            Region::ShareRate => "Share rate",
            Region::AvgBlockTime => "Avg block time",
            Region::PoolEfficiency => "Efficiency",
            Region::ExpectedBlocks => "Expected blocks/day",
            Region::ActualBlocks => "Actual blocks/day",
            Region::LuckFactor => "Luck",
            Region::BlocksList | Region::BlocksTable => "Recent blocks",
            Region::MinersList | Region::MinersTable => "Top miners",
            Region::HashrateSparkline => "Hashrate trend",
            Region::SharesSparkline => "Shares trend",
            Region::HashrateChart => "Hashrate chart",
            Region::DiskPercent => "Disk",
            Region::DiskUsed => "Disk used",
            Region::DiskTotal => "Disk total",
            Region::DiskProgress => "Disk usage",
            Region::CpuUsage => "CPU",
            Region::MemoryUsage => "Memory",
            Region::LoadAverage => "Load average",
            Region::PostgresSize => "PostgreSQL",
            Region::NodeSize => "Node data",
            Region::LogsSize => "Logs",
            Region::BackupsSize => "Backups",
            Region::DockerContainers => "Containers",
            Region::Alerts => "Alerts",
            Region::LastUpdate => "Last update",
        }
    }
}

/// Severity colouring shared by status dots, gauges, bars and alert rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Good,
    Caution,
    Alert,
    Critical,
    Neutral,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Good => "online",
            Tone::Caution => "warning",
            Tone::Alert => "alert",
            Tone::Critical => "offline",
            Tone::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub tone: Option<Tone>,
    pub cells: Vec<String>,
}

impl Row {
    pub fn new(cells: Vec<String>) -> Self {
        Self { tone: None, cells }
    }

    pub fn toned(tone: Tone, cells: Vec<String>) -> Self {
        Self { tone: Some(tone), cells }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rows {
    /// Nothing to list; carries the message shown instead.
    Empty(String),
    Filled(Vec<Row>),
}

/// A filled arc or bar: `fraction` in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    pub fraction: f64,
    pub tone: Tone,
    pub label: String,
}

pub trait ViewSink {
    fn has(&self, region: Region) -> bool;
    fn set_text(&mut self, region: Region, value: &str);
    fn set_status(&mut self, region: Region, tone: Tone, label: &str);
    fn set_rows(&mut self, region: Region, rows: Rows);
    fn set_gauge(&mut self, region: Region, gauge: Gauge);
    fn set_series(&mut self, region: Region, samples: &[f64]);
    fn set_points(&mut self, region: Region, points: &[(String, f64)]);
    /// Publishes everything written since the previous commit.
    fn commit(&mut self) -> Result<()>;
}

/// The regions a page provides, in display order.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub name: &'static str,
    pub regions: &'static [Region],
}

pub const PUBLIC_LAYOUT: Layout = Layout {
    name: "public",
    regions: &[
        Region::ApiStatus,
        Region::ConnectedMiners,
        Region::PoolHashrate,
        Region::HashrateSparkline,
        Region::SharesPerSecond,
        Region::SharesSparkline,
        Region::TotalBlocks,
        Region::TotalPaid,
        Region::PoolEffort,
        Region::EffortGauge,
        Region::TimeToBlock,
        Region::NetworkType,
        Region::BlockHeight,
        Region::NetworkHashrate,
        Region::NetworkDifficulty,
        Region::ConnectedPeers,
        Region::LastNetworkBlock,
        Region::PoolAddress,
        Region::HashrateChart,
        Region::BlocksList,
        Region::MinersList,
        Region::LastUpdate,
    ],
};

pub const ADMIN_LAYOUT: Layout = Layout {
    name: "admin",
    regions: &[
        Region::ApiStatus,
        Region::NodeStatus,
        Region::PoolStatus,
        Region::NodeConnection,
        Region::DbStatus,
        Region::ConnectedMiners,
        Region::PoolHashrate,
        Region::NetworkType,
        Region::BlockHeight,
        Region::NetworkHashrate,
        Region::NetworkDifficulty,
        Region::ConnectedPeers,
        Region::LastNetworkBlock,
        Region::PoolAddress,
        Region::PoolNetworkShare,
        Region::ValidShares,
        Region::InvalidShares,
        Region::ShareRate,
        Region::AvgBlockTime,
        Region::PoolEfficiency,
        Region::ExpectedBlocks,
        Region::ActualBlocks,
        Region::LuckFactor,
        Region::HashrateChart,
        Region::BlocksTable,
        Region::MinersTable,
        Region::DiskPercent,
        Region::DiskUsed,
        Region::DiskTotal,
        Region::DiskProgress,
        Region::CpuUsage,
        Region::MemoryUsage,
        Region::LoadAverage,
        Region::PostgresSize,
        Region::NodeSize,
        Region::LogsSize,
        Region::BackupsSize,
        Region::DockerContainers,
        Region::Alerts,
        Region::LastUpdate,
    ],
};

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    Status { tone: Tone, label: String },
    Rows(Rows),
    Gauge(Gauge),
    Series(Vec<f64>),
    Points(Vec<(String, f64)>),
}

/// Keeps the latest content of every region of one layout.
///
/// Writes to regions outside the layout are dropped. The text rendering is
/// what the terminal binaries print after each cycle.
#[derive(Debug, Clone)]
pub struct BufferedView {
    layout: Layout,
    content: HashMap<Region, Content>,
    commits: u64,
}

impl BufferedView {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            content: HashMap::new(),
            commits: 0,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn commits(&self) -> u64 {
        self.commits
    }

    pub fn get(&self, region: Region) -> Option<&Content> {
        self.content.get(&region)
    }

    pub fn text(&self, region: Region) -> Option<&str> {
        match self.content.get(&region) {
            Some(Content::Text(t)) => Some(t),
            _ => None,
        }
    }

    pub fn status(&self, region: Region) -> Option<(Tone, &str)> {
        match self.content.get(&region) {
            Some(Content::Status { tone, label }) => Some((*tone, label)),
            _ => None,
        }
    }

    pub fn rows(&self, region: Region) -> Option<&Rows> {
        match self.content.get(&region) {
            Some(Content::Rows(r)) => Some(r),
            _ => None,
        }
    }

    pub fn gauge(&self, region: Region) -> Option<&Gauge> {
        match self.content.get(&region) {
            Some(Content::Gauge(g)) => Some(g),
            _ => None,
        }
    }

    pub fn series(&self, region: Region) -> Option<&[f64]> {
        match self.content.get(&region) {
            Some(Content::Series(s)) => Some(s),
            _ => None,
        }
    }

    pub fn points(&self, region: Region) -> Option<&[(String, f64)]> {
        match self.content.get(&region) {
            Some(Content::Points(p)) => Some(p),
            _ => None,
        }
    }

    fn put(&mut self, region: Region, content: Content) {
        if self.has(region) {
            self.content.insert(region, content);
        }
    }

    /// Plain-text frame of the whole layout.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "== pool dashboard ({}) ==", self.layout.name);
        for region in self.layout.regions {
            let label = region.label();
            match self.content.get(region) {
                None => {
                    let _ = writeln!(out, "{:<20} --", label);
                }
                Some(Content::Text(t)) => {
                    let _ = writeln!(out, "{:<20} {}", label, t);
                }
                Some(Content::Status { tone, label: text }) => {
                    let _ = writeln!(out, "{:<20} [{}] {}", label, tone.as_str(), text);
                }
                Some(Content::Gauge(g)) => {
                    let filled = (g.fraction.clamp(0.0, 1.0) * 20.0).round() as usize;
                    let _ = writeln!(
                        out,
                        "{:<20} [{}{}] {} ({})",
                        label,
                        "#".repeat(filled),
                        ".".repeat(20 - filled),
                        g.label,
                        g.tone.as_str()
                    );
                }
                Some(Content::Series(s)) => {
                    let _ = writeln!(out, "{:<20} {}", label, spark_bars(s));
                }
                Some(Content::Points(p)) => {
                    let values: Vec<f64> = p.iter().map(|(_, v)| *v).collect();
                    let span = match (p.first(), p.last()) {
                        (Some(a), Some(b)) => format!("{}..{}", a.0, b.0),
                        _ => String::new(),
                    };
                    let _ = writeln!(out, "{:<20} {} {}", label, spark_bars(&values), span);
                }
                Some(Content::Rows(rows)) => {
                    let _ = writeln!(out, "{}:", label);
                    match rows {
                        Rows::Empty(msg) => {
                            let _ = writeln!(out, "  {}", msg);
                        }
                        Rows::Filled(rows) => {
                            for row in rows {
                                let tag = row.tone.map(|t| format!("[{}] ", t.as_str())).unwrap_or_default();
                                let _ = writeln!(out, "  {}{}", tag, row.cells.join(" | "));
                            }
                        }
                    }
                }
            }
        }
        out
    }
}

fn spark_bars(samples: &[f64]) -> String {
    const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    sparkline_points(samples, samples.len() as f64, 7.0)
        .into_iter()
        .map(|(_, y)| BARS[(7.0 - y).round().clamp(0.0, 7.0) as usize])
        .collect()
}

impl ViewSink for BufferedView {
    fn has(&self, region: Region) -> bool {
        self.layout.regions.contains(&region)
    }

    fn set_text(&mut self, region: Region, value: &str) {
        self.put(region, Content::Text(value.to_string()));
    }

    fn set_status(&mut self, region: Region, tone: Tone, label: &str) {
        self.put(region, Content::Status { tone, label: label.to_string() });
    }

    fn set_rows(&mut self, region: Region, rows: Rows) {
        self.put(region, Content::Rows(rows));
    }

    fn set_gauge(&mut self, region: Region, gauge: Gauge) {
        self.put(region, Content::Gauge(gauge));
    }

    fn set_series(&mut self, region: Region, samples: &[f64]) {
        self.put(region, Content::Series(samples.to_vec()));
    }

    fn set_points(&mut self, region: Region, points: &[(String, f64)]) {
        self.put(region, Content::Points(points.to_vec()));
    }

    fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }
}
