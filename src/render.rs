//! Render functions: fetched data in, view regions out.
//!
//! Each function writes whole regions and tolerates absent data with
//! placeholders. Regions missing from the active layout are skipped by the
//! sink, and the few renderers with side effects check `has` first.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::alerts::Alert;
use crate::cycle::PoolHealth;
use crate::format::{
    format_difficulty, format_duration_estimate, format_fixed, format_hashrate, format_number,
    format_time_ago, truncate_address,
};
use crate::history::{Chart, History};
use crate::model::{Block, BlockStatus, ComponentSizes, DiskUsage, DockerStats, Miner, PerformanceMetrics, PoolSnapshot};
use crate::view::{Gauge, Region, Row, Rows, Tone, ViewSink};

/// Target block interval of the network, in seconds.
pub const BLOCK_TIME_SECS: f64 = 120.0;
pub const BLOCKS_PER_DAY: f64 = 86_400.0 / BLOCK_TIME_SECS;
/// Effort at which the gauge arc is full.
pub const GAUGE_MAX_EFFORT: f64 = 200.0;

const PLACEHOLDER: &str = "--";

pub fn render_system_status(sink: &mut dyn ViewSink, health: &PoolHealth) {
    if health.pool_working {
        sink.set_status(Region::PoolStatus, Tone::Good, "Online");
        sink.set_status(Region::ApiStatus, Tone::Good, "Online");
    } else {
        if health.api_responding {
            sink.set_status(Region::PoolStatus, Tone::Caution, "Starting...");
        } else {
            sink.set_status(Region::PoolStatus, Tone::Critical, "Offline");
        }
        sink.set_status(Region::ApiStatus, Tone::Critical, "Offline");
    }

    if health.node_connected {
        sink.set_status(Region::NodeConnection, Tone::Good, "Connected");
        sink.set_status(Region::NodeStatus, Tone::Good, "Online");
    } else if health.pool_working {
        sink.set_status(Region::NodeConnection, Tone::Caution, "Syncing...");
        sink.set_status(Region::NodeStatus, Tone::Neutral, "Syncing");
    } else {
        sink.set_status(Region::NodeConnection, Tone::Critical, "Disconnected");
        sink.set_status(Region::NodeStatus, Tone::Critical, "Offline");
    }

    if health.pool_present {
        sink.set_status(Region::DbStatus, Tone::Good, "Healthy");
    } else {
        sink.set_status(Region::DbStatus, Tone::Caution, "Unknown");
    }
}

/// Worst-case indicators after a failed cycle.
pub fn render_failure(sink: &mut dyn ViewSink) {
    sink.set_status(Region::PoolStatus, Tone::Critical, "Offline");
    sink.set_status(Region::ApiStatus, Tone::Critical, "Offline");
    sink.set_status(Region::NodeConnection, Tone::Critical, "Disconnected");
    sink.set_status(Region::NodeStatus, Tone::Critical, "Offline");
    sink.set_status(Region::DbStatus, Tone::Critical, "Error");
}

pub fn render_pool_stats(sink: &mut dyn ViewSink, pool: &PoolSnapshot, coin: &str, now: DateTime<Utc>) {
    let stats = pool.stats();
    let network = pool.network();

    sink.set_text(Region::ConnectedMiners, &stats.connected_miners.unwrap_or(0).to_string());
    sink.set_text(Region::PoolHashrate, &format_hashrate(stats.pool_hashrate.unwrap_or(0.0)));
    sink.set_text(Region::SharesPerSecond, &format_fixed(stats.shares_per_second, 3));
    sink.set_text(Region::TotalBlocks, &pool.total_blocks.unwrap_or(0).to_string());
    sink.set_text(Region::TotalPaid, &format!("{} {}", format_fixed(pool.total_paid, 4), coin));
    sink.set_text(Region::PoolEffort, &format!("{}%", format_fixed(pool.pool_effort, 2)));

    sink.set_text(Region::NetworkType, network.network_type.as_deref().unwrap_or("mainnet"));
    sink.set_text(Region::BlockHeight, &format_number(network.block_height.unwrap_or(0) as f64));
    sink.set_text(Region::NetworkHashrate, &format_hashrate(network.network_hashrate.unwrap_or(0.0)));
    sink.set_text(Region::NetworkDifficulty, &format_difficulty(network.network_difficulty.unwrap_or(0.0)));
    let peers = match network.connected_peers {
        Some(p) if p > 0 => p.to_string(),
        _ => PLACEHOLDER.to_string(),
    };
    sink.set_text(Region::ConnectedPeers, &peers);
    sink.set_text(Region::LastNetworkBlock, &format_time_ago(network.last_network_block_time, now));
    sink.set_text(Region::PoolAddress, pool.address.as_deref().unwrap_or("Loading..."));

    render_effort_gauge(sink, pool.pool_effort.unwrap_or(0.0));
    render_time_to_block(sink, pool);
}

pub fn effort_tone(effort: f64) -> Tone {
    if effort < 50.0 {
        Tone::Good
    } else if effort < 100.0 {
        Tone::Caution
    } else if effort < 150.0 {
        Tone::Alert
    } else {
        Tone::Critical
    }
}

pub fn render_effort_gauge(sink: &mut dyn ViewSink, effort: f64) {
    if !sink.has(Region::EffortGauge) {
        return;
    }
    let capped = effort.clamp(0.0, GAUGE_MAX_EFFORT);
    sink.set_gauge(
        Region::EffortGauge,
        Gauge {
            fraction: capped / GAUGE_MAX_EFFORT,
            tone: effort_tone(effort),
            label: format!("{:.1}%", effort),
        },
    );
}

/// Expected wait for the pool's next block at the current hashrate share.
pub fn time_to_block(pool: &PoolSnapshot) -> Option<String> {
    let share = pool.network_share()?;
    let expected_hours = BLOCK_TIME_SECS / share / 3600.0;
    Some(format_duration_estimate(expected_hours))
}

pub fn render_time_to_block(sink: &mut dyn ViewSink, pool: &PoolSnapshot) {
    if !sink.has(Region::TimeToBlock) {
        return;
    }
    let text = time_to_block(pool).unwrap_or_else(|| "calculating...".to_string());
    sink.set_text(Region::TimeToBlock, &text);
}

/// Operator-only figures derived from the snapshot.
pub fn render_admin_stats(sink: &mut dyn ViewSink, pool: &PoolSnapshot) {
    let share = pool.network_share();

    let network_share = share
        .map(|s| format!("{:.4}%", s * 100.0))
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    sink.set_text(Region::PoolNetworkShare, &network_share);
    sink.set_text(Region::ValidShares, PLACEHOLDER);
    sink.set_text(Region::InvalidShares, PLACEHOLDER);
    sink.set_text(Region::ShareRate, &format!("{:.3}/s", pool.shares_per_second()));
    sink.set_text(Region::AvgBlockTime, "120s (2m)");

    let efficiency = match pool.pool_effort {
        Some(effort) if effort != 0.0 && !effort.is_nan() => format!("{:.2}%", 100.0 / effort * 100.0),
        _ => PLACEHOLDER.to_string(),
    };
    sink.set_text(Region::PoolEfficiency, &efficiency);

    let expected = share
        .map(|s| format!("{:.2}", BLOCKS_PER_DAY * s))
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    sink.set_text(Region::ExpectedBlocks, &expected);
    sink.set_text(Region::ActualBlocks, PLACEHOLDER);
    sink.set_text(Region::LuckFactor, PLACEHOLDER);
}

fn status_tone(status: &BlockStatus) -> Option<Tone> {
    match status {
        BlockStatus::Confirmed => Some(Tone::Good),
        BlockStatus::Pending => Some(Tone::Caution),
        BlockStatus::Orphaned => Some(Tone::Critical),
        BlockStatus::Other(_) => None,
    }
}

fn block_reward(block: &Block, coin: &str) -> String {
    match block.reward {
        Some(r) => format!("{:.4} {}", r, coin),
        None => PLACEHOLDER.to_string(),
    }
}

fn block_height(block: &Block) -> String {
    match block.block_height {
        Some(h) => format_number(h as f64),
        None => PLACEHOLDER.to_string(),
    }
}

fn toned(tone: Option<Tone>, cells: Vec<String>) -> Row {
    Row { tone, cells }
}

/// Public page: compact block list.
pub fn render_blocks_list(sink: &mut dyn ViewSink, blocks: &[Block], coin: &str, now: DateTime<Utc>) {
    if blocks.is_empty() {
        sink.set_rows(Region::BlocksList, Rows::Empty("No blocks found yet. Keep mining!".to_string()));
        return;
    }
    let rows = blocks
        .iter()
        .map(|b| {
            toned(
                status_tone(&b.status),
                vec![
                    format!("Block #{}", block_height(b)),
                    b.status.as_str().to_string(),
                    block_reward(b, coin),
                    format_time_ago(b.created, now),
                ],
            )
        })
        .collect();
    sink.set_rows(Region::BlocksList, Rows::Filled(rows));
}

/// Admin page: full block table.
pub fn render_blocks_table(sink: &mut dyn ViewSink, blocks: &[Block], coin: &str, now: DateTime<Utc>) {
    if blocks.is_empty() {
        sink.set_rows(Region::BlocksTable, Rows::Empty("No blocks found".to_string()));
        return;
    }
    let rows = blocks
        .iter()
        .map(|b| {
            let effort = match b.effort {
                Some(e) if e != 0.0 => format!("{:.2}%", e),
                _ => PLACEHOLDER.to_string(),
            };
            toned(
                status_tone(&b.status),
                vec![
                    format!("#{}", block_height(b)),
                    b.status.as_str().to_string(),
                    block_reward(b, coin),
                    effort,
                    format_time_ago(b.created, now),
                    truncate_address(b.miner.as_deref().unwrap_or("Unknown"), 8, 6),
                ],
            )
        })
        .collect();
    sink.set_rows(Region::BlocksTable, Rows::Filled(rows));
}

pub fn render_miners_list(sink: &mut dyn ViewSink, miners: &[Miner]) {
    if miners.is_empty() {
        sink.set_rows(Region::MinersList, Rows::Empty("No active miners".to_string()));
        return;
    }
    let rows = miners
        .iter()
        .map(|m| {
            Row::new(vec![
                truncate_address(&m.miner, 16, 12),
                format_hashrate(m.hashrate.unwrap_or(0.0)),
                format!("{} shares/s", format_fixed(m.shares_per_second, 3)),
            ])
        })
        .collect();
    sink.set_rows(Region::MinersList, Rows::Filled(rows));
}

pub fn render_miners_table(sink: &mut dyn ViewSink, miners: &[Miner]) {
    if miners.is_empty() {
        sink.set_rows(Region::MinersTable, Rows::Empty("No active miners".to_string()));
        return;
    }
    let rows = miners
        .iter()
        .map(|m| {
            let workers = match m.worker_count {
                Some(w) if w > 0 => w,
                _ => 1,
            };
            Row::new(vec![
                truncate_address(&m.miner, 12, 8),
                format_hashrate(m.hashrate.unwrap_or(0.0)),
                workers.to_string(),
                format_fixed(m.shares_per_second, 3),
                PLACEHOLDER.to_string(),
            ])
        })
        .collect();
    sink.set_rows(Region::MinersTable, Rows::Filled(rows));
}

pub fn render_sparklines(sink: &mut dyn ViewSink, history: &History) {
    sink.set_series(Region::HashrateSparkline, &history.hashrates.to_vec());
    sink.set_series(Region::SharesSparkline, &history.shares.to_vec());
}

/// Appends the current hashrate to the chart, if this page shows one.
pub fn render_chart(sink: &mut dyn ViewSink, chart: &mut dyn Chart, label: &str, hashrate: f64) -> Result<()> {
    if !sink.has(Region::HashrateChart) {
        return Ok(());
    }
    chart.append_point(label, hashrate)?;
    sink.set_points(Region::HashrateChart, &chart.points());
    Ok(())
}

pub fn disk_tone(usage_percent: f64) -> Tone {
    if usage_percent >= 90.0 {
        Tone::Critical
    } else if usage_percent >= 80.0 {
        Tone::Caution
    } else {
        Tone::Good
    }
}

pub fn render_system_resources(sink: &mut dyn ViewSink, disk: Option<&DiskUsage>, perf: Option<&PerformanceMetrics>) {
    if let Some(disk) = disk {
        let pct = disk.usage_percent.unwrap_or(0.0);
        sink.set_text(Region::DiskPercent, &format!("{}%", pct));
        sink.set_text(Region::DiskUsed, disk.used.as_deref().unwrap_or(PLACEHOLDER));
        sink.set_text(Region::DiskTotal, disk.total.as_deref().unwrap_or(PLACEHOLDER));
        sink.set_gauge(
            Region::DiskProgress,
            Gauge {
                fraction: (pct / 100.0).clamp(0.0, 1.0),
                tone: disk_tone(pct),
                label: format!("{}%", pct),
            },
        );
    }

    let Some(metrics) = perf else {
        return;
    };
    if let Some(cpu) = metrics.cpu_percent() {
        sink.set_text(Region::CpuUsage, &format!("{}%", cpu));
    }
    if let Some(mem) = metrics.memory() {
        let pct = mem.usage_percent.map(|p| p.to_string()).unwrap_or_else(|| PLACEHOLDER.to_string());
        sink.set_text(
            Region::MemoryUsage,
            &format!(
                "{}% ({} / {})",
                pct,
                mem.used.as_deref().unwrap_or(PLACEHOLDER),
                mem.total.as_deref().unwrap_or(PLACEHOLDER)
            ),
        );
    }
    if let Some(load) = metrics.load_average() {
        let parts = [&load.one, &load.five, &load.fifteen]
            .iter()
            .map(|v| v.as_deref().unwrap_or(PLACEHOLDER))
            .collect::<Vec<_>>()
            .join(" ");
        sink.set_text(Region::LoadAverage, &parts);
    }
}

/// Component sizes come from the disk report, or the components endpoint when
/// the disk report carries none.
pub fn render_component_sizes(sink: &mut dyn ViewSink, disk: Option<&DiskUsage>, sizes: Option<&ComponentSizes>) {
    let from_disk = disk.and_then(|d| d.components.as_ref()).map(|c| {
        [c.postgresql.clone(), c.ergo_node.clone(), c.logs.clone(), c.backups.clone()]
    });
    let from_endpoint = sizes.filter(|s| s.components.is_object()).map(|s| {
        ["postgresql", "ergoNode", "logs", "backups"]
            .map(|key| s.components.get(key).and_then(|v| v.as_str()).map(str::to_string))
    });
    let Some([postgres, node, logs, backups]) = from_disk.or(from_endpoint) else {
        return;
    };
    sink.set_text(Region::PostgresSize, postgres.as_deref().unwrap_or("N/A"));
    sink.set_text(Region::NodeSize, node.as_deref().unwrap_or("N/A"));
    sink.set_text(Region::LogsSize, logs.as_deref().unwrap_or("N/A"));
    sink.set_text(Region::BackupsSize, backups.as_deref().unwrap_or("N/A"));
}

pub fn render_docker_containers(sink: &mut dyn ViewSink, docker: Option<&DockerStats>) {
    let containers = docker.map(|d| d.containers.as_slice()).unwrap_or_default();
    if containers.is_empty() {
        sink.set_rows(Region::DockerContainers, Rows::Empty("No containers running".to_string()));
        return;
    }
    let rows = containers
        .iter()
        .map(|c| {
            Row::new(vec![
                format!("{}:", c.name.as_deref().unwrap_or("Unknown")),
                c.cpu.clone().unwrap_or_else(|| "0%".to_string()),
                c.memory.clone().unwrap_or_else(|| "N/A".to_string()),
            ])
        })
        .collect();
    sink.set_rows(Region::DockerContainers, Rows::Filled(rows));
}

pub fn render_alerts(sink: &mut dyn ViewSink, alerts: &[Alert]) {
    if alerts.is_empty() {
        sink.set_rows(Region::Alerts, Rows::Empty("No alerts".to_string()));
        return;
    }
    let rows = alerts
        .iter()
        .map(|a| Row::toned(a.level.tone(), vec![a.message.clone()]))
        .collect();
    sink.set_rows(Region::Alerts, Rows::Filled(rows));
}

pub fn render_last_update(sink: &mut dyn ViewSink, clock: &str) {
    sink.set_text(Region::LastUpdate, clock);
}
