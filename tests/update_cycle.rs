//! Update cycle against a scripted pool API.
//!
//! Each test drives `Dashboard::tick` with a fake that returns fixed data per
//! endpoint, then inspects the buffered view the way a reader of the page would.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pooldash::api::PoolApi;
use pooldash::config::DashboardConfig;
use pooldash::cycle::{CycleReport, Dashboard, Surface};
use pooldash::history::Chart;
use pooldash::model::{
    AdminStats, Block, BlockStatus, ComponentSizes, ContainerStats, DiskUsage, DockerStats, Miner,
    NetworkStats, PerformanceReport, PoolSnapshot, PoolStats,
};
use pooldash::view::{BufferedView, Gauge, Region, Rows, Tone, ViewSink, ADMIN_LAYOUT, PUBLIC_LAYOUT};

#[derive(Default, Clone)]
struct ScriptedApi {
    pool: Option<PoolSnapshot>,
    blocks: Vec<Block>,
    miners: Vec<Miner>,
    healthy: bool,
    disk: Option<DiskUsage>,
    docker: Option<DockerStats>,
}

#[async_trait]
impl PoolApi for ScriptedApi {
    async fn pool(&self) -> Option<PoolSnapshot> {
        self.pool.clone()
    }
    async fn blocks(&self) -> Vec<Block> {
        self.blocks.clone()
    }
    async fn miners(&self) -> Vec<Miner> {
        self.miners.clone()
    }
    async fn health(&self) -> bool {
        self.healthy
    }
    async fn admin_stats(&self) -> Option<AdminStats> {
        None
    }
    async fn disk(&self) -> Option<DiskUsage> {
        self.disk.clone()
    }
    async fn components(&self) -> Option<ComponentSizes> {
        None
    }
    async fn performance(&self) -> Option<PerformanceReport> {
        None
    }
    async fn docker(&self) -> Option<DockerStats> {
        self.docker.clone()
    }
}

fn snapshot(height: u64) -> PoolSnapshot {
    PoolSnapshot {
        pool_stats: Some(PoolStats {
            connected_miners: Some(2),
            pool_hashrate: Some(2_340_000.0),
            shares_per_second: Some(0.4),
        }),
        network_stats: Some(NetworkStats {
            block_height: Some(height),
            network_hashrate: Some(1.0e12),
            connected_peers: Some(9),
            ..NetworkStats::default()
        }),
        ..PoolSnapshot::default()
    }
}

fn miner() -> Miner {
    Miner {
        miner: "9fRusAarL1KkrWQVsxSRVYnvWxaAT2A96cKtNn9tvPh5XUyCisr".to_string(),
        hashrate: Some(2_340_000.0),
        worker_count: Some(2),
        shares_per_second: Some(0.4),
    }
}

fn config() -> DashboardConfig {
    DashboardConfig {
        refresh_ms: 10,
        ..DashboardConfig::default()
    }
}

const STATUS_REGIONS: [Region; 5] = [
    Region::PoolStatus,
    Region::ApiStatus,
    Region::NodeConnection,
    Region::NodeStatus,
    Region::DbStatus,
];

#[tokio::test]
async fn test_failed_blocks_fetch_leaves_other_panels_intact() {
    let api = ScriptedApi {
        pool: Some(snapshot(1_250_000)),
        blocks: Vec::new(),
        miners: vec![miner()],
        ..ScriptedApi::default()
    };
    let mut view = BufferedView::new(PUBLIC_LAYOUT);
    let mut dash = Dashboard::new(config(), Surface::Public);

    let report = dash.tick(&api, &mut view, Utc::now()).await;

    assert!(!report.failed);
    assert_eq!(report.blocks, 0);
    assert!(matches!(view.rows(Region::BlocksList), Some(Rows::Empty(_))));
    assert!(matches!(view.rows(Region::MinersList), Some(Rows::Filled(rows)) if rows.len() == 1));
    assert_eq!(view.text(Region::PoolHashrate), Some("2.34 MH/s"));
    assert_eq!(view.text(Region::BlockHeight), Some("1,250,000"));
    assert_eq!(view.status(Region::ApiStatus).map(|s| s.0), Some(Tone::Good));
    assert_eq!(view.commits(), 1);
}

#[tokio::test]
async fn test_zero_height_never_shows_online() {
    let api = ScriptedApi {
        pool: Some(snapshot(0)),
        healthy: true,
        ..ScriptedApi::default()
    };
    let mut view = BufferedView::new(ADMIN_LAYOUT);
    let mut dash = Dashboard::new(config(), Surface::Admin);

    let report = dash.tick(&api, &mut view, Utc::now()).await;

    assert!(!report.health.pool_working);
    for region in [Region::PoolStatus, Region::ApiStatus] {
        let (tone, _) = view.status(region).expect("status rendered");
        assert_ne!(tone, Tone::Good, "{:?} rendered online", region);
    }
    assert_eq!(view.status(Region::PoolStatus), Some((Tone::Caution, "Starting...")));
    // Peers are reported independently of chain height.
    assert_eq!(view.status(Region::NodeConnection), Some((Tone::Good, "Connected")));

    let mut idle = snapshot(0);
    if let Some(network) = idle.network_stats.as_mut() {
        network.connected_peers = Some(0);
    }
    let api = ScriptedApi {
        pool: Some(idle),
        ..ScriptedApi::default()
    };
    dash.tick(&api, &mut view, Utc::now()).await;
    for region in [Region::PoolStatus, Region::ApiStatus, Region::NodeConnection, Region::NodeStatus] {
        let (tone, _) = view.status(region).expect("status rendered");
        assert_ne!(tone, Tone::Good, "{:?} rendered online", region);
    }
}

#[tokio::test]
async fn test_missing_height_on_public_page_is_offline() {
    let mut pool = snapshot(1);
    pool.network_stats = None;
    let api = ScriptedApi {
        pool: Some(pool),
        ..ScriptedApi::default()
    };
    let mut view = BufferedView::new(PUBLIC_LAYOUT);
    let mut dash = Dashboard::new(config(), Surface::Public);

    dash.tick(&api, &mut view, Utc::now()).await;

    assert_eq!(view.status(Region::ApiStatus).map(|s| s.0), Some(Tone::Critical));
}

#[tokio::test]
async fn test_history_grows_only_with_snapshots() {
    let mut dash = Dashboard::new(config(), Surface::Public);
    let mut view = BufferedView::new(PUBLIC_LAYOUT);

    dash.tick(&ScriptedApi::default(), &mut view, Utc::now()).await;
    assert!(dash.history().hashrates.is_empty());
    assert!(dash.chart().points().is_empty());

    let api = ScriptedApi {
        pool: Some(snapshot(10)),
        ..ScriptedApi::default()
    };
    for _ in 0..30 {
        dash.tick(&api, &mut view, Utc::now()).await;
    }
    assert_eq!(dash.history().hashrates.len(), 30);
    assert_eq!(dash.chart().points().len(), dash.chart().capacity());
    assert_eq!(view.series(Region::HashrateSparkline).map(|s| s.len()), Some(30));
}

struct BrokenChart;

impl Chart for BrokenChart {
    fn append_point(&mut self, _label: &str, _value: f64) -> Result<()> {
        Err(anyhow!("canvas unavailable"))
    }
    fn capacity(&self) -> usize {
        0
    }
    fn points(&self) -> Vec<(String, f64)> {
        Vec::new()
    }
}

#[tokio::test]
async fn test_chart_failure_forces_worst_state() {
    let api = ScriptedApi {
        pool: Some(snapshot(1_250_000)),
        healthy: true,
        ..ScriptedApi::default()
    };
    let mut view = BufferedView::new(ADMIN_LAYOUT);
    let mut dash = Dashboard::with_chart(config(), Surface::Admin, Box::new(BrokenChart));

    let report = dash.tick(&api, &mut view, Utc::now()).await;

    assert!(report.failed);
    for region in STATUS_REGIONS {
        assert_eq!(view.status(region).map(|s| s.0), Some(Tone::Critical), "{:?}", region);
    }
    assert_eq!(view.status(Region::DbStatus), Some((Tone::Critical, "Error")));
}

/// Buffers like the real view but refuses to publish.
struct StuckSink {
    inner: BufferedView,
}

impl ViewSink for StuckSink {
    fn has(&self, region: Region) -> bool {
        self.inner.has(region)
    }
    fn set_text(&mut self, region: Region, text: &str) {
        self.inner.set_text(region, text)
    }
    fn set_status(&mut self, region: Region, tone: Tone, label: &str) {
        self.inner.set_status(region, tone, label)
    }
    fn set_rows(&mut self, region: Region, rows: Rows) {
        self.inner.set_rows(region, rows)
    }
    fn set_gauge(&mut self, region: Region, gauge: Gauge) {
        self.inner.set_gauge(region, gauge)
    }
    fn set_series(&mut self, region: Region, samples: &[f64]) {
        self.inner.set_series(region, samples)
    }
    fn set_points(&mut self, region: Region, points: &[(String, f64)]) {
        self.inner.set_points(region, points)
    }
    fn commit(&mut self) -> Result<()> {
        Err(anyhow!("terminal closed"))
    }
}

#[tokio::test]
async fn test_commit_failure_is_reported_not_fatal() {
    let api = ScriptedApi {
        pool: Some(snapshot(5)),
        ..ScriptedApi::default()
    };
    let mut sink = StuckSink { inner: BufferedView::new(PUBLIC_LAYOUT) };
    let mut dash = Dashboard::new(config(), Surface::Public);

    let report = dash.tick(&api, &mut sink, Utc::now()).await;

    assert!(report.failed);
    assert_eq!(sink.inner.status(Region::ApiStatus), Some((Tone::Critical, "Offline")));
}

#[tokio::test]
async fn test_admin_page_shows_resources_and_alerts() {
    let api = ScriptedApi {
        pool: Some(snapshot(900)),
        healthy: true,
        disk: Some(DiskUsage {
            total: Some("100 GB".to_string()),
            used: Some("92 GB".to_string()),
            usage_percent: Some(92.0),
            ..DiskUsage::default()
        }),
        docker: Some(DockerStats {
            containers: vec![ContainerStats {
                name: Some("miningcore".to_string()),
                cpu: Some("3.1%".to_string()),
                memory: None,
            }],
        }),
        blocks: vec![Block {
            block_height: Some(880),
            status: BlockStatus::Confirmed,
            ..Block::default()
        }],
        ..ScriptedApi::default()
    };
    let mut view = BufferedView::new(ADMIN_LAYOUT);
    let mut dash = Dashboard::new(config(), Surface::Admin);

    let report = dash.tick(&api, &mut view, Utc::now()).await;

    assert!(!report.failed);
    assert_eq!(view.gauge(Region::DiskProgress).map(|g| g.tone), Some(Tone::Critical));
    let Some(Rows::Filled(containers)) = view.rows(Region::DockerContainers) else {
        panic!("containers not rendered");
    };
    assert_eq!(containers[0].cells, vec!["miningcore:", "3.1%", "N/A"]);

    let Some(Rows::Filled(alerts)) = view.rows(Region::Alerts) else {
        panic!("alerts not rendered");
    };
    let messages: Vec<&str> = alerts.iter().map(|r| r.cells[0].as_str()).collect();
    assert_eq!(messages.first(), Some(&"✓ Pool running normally"));
    assert_eq!(messages.last(), Some(&"⚠ CRITICAL: Disk usage at 92%"));
    assert_eq!(report.alerts, alerts.len());
    assert!(matches!(view.rows(Region::BlocksTable), Some(Rows::Filled(rows)) if rows.len() == 1));
    assert!(view.text(Region::LastUpdate).is_some());
}

#[tokio::test]
async fn test_run_ticks_until_shutdown() {
    let api = ScriptedApi {
        pool: Some(snapshot(3)),
        ..ScriptedApi::default()
    };
    let mut view = BufferedView::new(PUBLIC_LAYOUT);
    let mut dash = Dashboard::new(config(), Surface::Public);
    let mut reports: Vec<CycleReport> = Vec::new();

    dash.run(Arc::new(api), &mut view, tokio::time::sleep(Duration::from_millis(80)), |_, report| {
        reports.push(*report)
    })
    .await
    .unwrap();

    assert!(!reports.is_empty());
    assert_eq!(view.commits() as usize, reports.len());
    assert!(reports.iter().all(|r| r.health.pool_working));
}

/// Answers every pool request except the second, which never completes.
struct StallingApi {
    inner: ScriptedApi,
    pool_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl PoolApi for StallingApi {
    async fn pool(&self) -> Option<PoolSnapshot> {
        if self.pool_calls.fetch_add(1, Ordering::SeqCst) == 1 {
            std::future::pending::<()>().await;
        }
        self.inner.pool().await
    }
    async fn blocks(&self) -> Vec<Block> {
        self.inner.blocks().await
    }
    async fn miners(&self) -> Vec<Miner> {
        self.inner.miners().await
    }
    async fn health(&self) -> bool {
        self.inner.health().await
    }
    async fn admin_stats(&self) -> Option<AdminStats> {
        None
    }
    async fn disk(&self) -> Option<DiskUsage> {
        None
    }
    async fn components(&self) -> Option<ComponentSizes> {
        None
    }
    async fn performance(&self) -> Option<PerformanceReport> {
        None
    }
    async fn docker(&self) -> Option<DockerStats> {
        None
    }
}

#[tokio::test]
async fn test_hung_fetch_does_not_stall_later_ticks_or_shutdown() {
    let pool_calls = Arc::new(AtomicUsize::new(0));
    let api = StallingApi {
        inner: ScriptedApi {
            pool: Some(snapshot(7)),
            ..ScriptedApi::default()
        },
        pool_calls: Arc::clone(&pool_calls),
    };
    let mut view = BufferedView::new(PUBLIC_LAYOUT);
    let mut dash = Dashboard::new(config(), Surface::Public);
    let mut rendered = 0usize;

    let finished = tokio::time::timeout(
        Duration::from_secs(3),
        dash.run(Arc::new(api), &mut view, tokio::time::sleep(Duration::from_millis(300)), |_, _| {
            rendered += 1
        }),
    )
    .await;

    assert!(matches!(finished, Ok(Ok(()))), "run did not return after shutdown");
    assert!(pool_calls.load(Ordering::SeqCst) >= 3);
    assert!(rendered >= 2, "only {} ticks rendered", rendered);
    assert_eq!(view.status(Region::ApiStatus).map(|s| s.0), Some(Tone::Good));
}
