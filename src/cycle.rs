//! The poll-and-render update cycle.
//!
//! A tick fetches everything its surface needs concurrently, waits for all of
//! it, derives pool health from the data and then renders in a fixed order.
//! Ticks are not serialized: the timer keeps firing while earlier ticks are
//! still waiting on the network.
//! Nothing in a tick is fatal: fetches degrade to fallbacks, and a failing
//! render forces every status indicator to its worst state.

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use crate::alerts::{self, AlertLatch, Transition};
use crate::api::PoolApi;
use crate::config::DashboardConfig;
use crate::format::{format_chart_label, format_clock};
use crate::history::{Chart, History, LineChart};
use crate::logging::{self, obj, v_bool, v_num, v_str, Domain, ProfileScope};
use crate::model::{
    AdminStats, Block, ComponentSizes, DiskUsage, DockerStats, Miner, PerformanceReport, PoolSnapshot,
};
use crate::render;
use crate::view::ViewSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Public,
    Admin,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Public => "public",
            Surface::Admin => "admin",
        }
    }
}

/// Health flags every indicator is rendered from.
///
/// `pool_working` follows the chain height in the snapshot, not the health
/// endpoint: a pool whose node reports height 0 is shown as not working.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolHealth {
    pub pool_present: bool,
    pub pool_working: bool,
    pub node_connected: bool,
    pub api_responding: bool,
}

impl PoolHealth {
    pub fn derive(pool: Option<&PoolSnapshot>, health_check_ok: bool) -> Self {
        Self {
            pool_present: pool.is_some(),
            pool_working: pool.and_then(|p| p.block_height()).map_or(false, |h| h > 0),
            node_connected: pool.and_then(|p| p.connected_peers()).map_or(false, |n| n > 0),
            api_responding: health_check_ok || pool.is_some(),
        }
    }
}

/// Results of one tick's fetches, each already reduced to its fallback on failure.
#[derive(Debug, Default)]
pub struct Fetched {
    pub pool: Option<PoolSnapshot>,
    pub blocks: Vec<Block>,
    pub miners: Vec<Miner>,
    pub healthy: bool,
    pub admin_stats: Option<AdminStats>,
    pub disk: Option<DiskUsage>,
    pub components: Option<ComponentSizes>,
    pub performance: Option<PerformanceReport>,
    pub docker: Option<DockerStats>,
}

pub async fn fetch_all(api: &dyn PoolApi, surface: Surface) -> Fetched {
    let _scope = ProfileScope::with_context("fetch", &[("surface", v_str(surface.as_str()))]);
    match surface {
        Surface::Public => {
            let (pool, blocks, miners) = tokio::join!(api.pool(), api.blocks(), api.miners());
            Fetched { pool, blocks, miners, ..Fetched::default() }
        }
        Surface::Admin => {
            let (pool, blocks, miners, healthy, admin_stats, disk, components, performance, docker) = tokio::join!(
                api.pool(),
                api.blocks(),
                api.miners(),
                api.health(),
                api.admin_stats(),
                api.disk(),
                api.components(),
                api.performance(),
                api.docker(),
            );
            Fetched { pool, blocks, miners, healthy, admin_stats, disk, components, performance, docker }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub health: PoolHealth,
    pub blocks: usize,
    pub miners: usize,
    pub alerts: usize,
    pub failed: bool,
}

/// Per-session dashboard state: settings, sparkline history, chart, alert latch.
pub struct Dashboard {
    config: DashboardConfig,
    surface: Surface,
    history: History,
    chart: Box<dyn Chart + Send>,
    latch: AlertLatch,
}

impl Dashboard {
    pub fn new(config: DashboardConfig, surface: Surface) -> Self {
        let chart = Box::new(LineChart::new(config.chart_max_points));
        Self::with_chart(config, surface, chart)
    }

    pub fn with_chart(config: DashboardConfig, surface: Surface, chart: Box<dyn Chart + Send>) -> Self {
        Self {
            config,
            surface,
            history: History::default(),
            chart,
            latch: AlertLatch::default(),
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn chart(&self) -> &dyn Chart {
        self.chart.as_ref()
    }

    /// Fetches and renders one tick in place.
    pub async fn tick(&mut self, api: &dyn PoolApi, sink: &mut dyn ViewSink, now: DateTime<Utc>) -> CycleReport {
        let fetched = fetch_all(api, self.surface).await;
        self.apply(fetched, sink, now)
    }

    /// Renders one tick's settled fetches.
    pub fn apply(&mut self, fetched: Fetched, sink: &mut dyn ViewSink, now: DateTime<Utc>) -> CycleReport {
        let health = PoolHealth::derive(fetched.pool.as_ref(), fetched.healthy);

        logging::debug(
            Domain::Cycle,
            "health",
            obj(&[
                ("surface", v_str(self.surface.as_str())),
                ("pool_present", v_bool(health.pool_present)),
                ("pool_working", v_bool(health.pool_working)),
                ("node_connected", v_bool(health.node_connected)),
                ("api_responding", v_bool(health.api_responding)),
                ("block_height", v_num(fetched.pool.as_ref().and_then(|p| p.block_height()).unwrap_or(0) as f64)),
            ]),
        );
        if let Some(stats) = &fetched.admin_stats {
            logging::debug(Domain::Api, "admin_stats", obj(&[("stats", stats.clone())]));
        }

        let mut report = CycleReport {
            health,
            blocks: fetched.blocks.len(),
            miners: fetched.miners.len(),
            alerts: 0,
            failed: false,
        };
        match self.render(&fetched, &health, sink, now) {
            Ok(alert_count) => report.alerts = alert_count,
            Err(err) => {
                render::render_failure(sink);
                let _ = sink.commit();
                logging::error(
                    Domain::Render,
                    "render_failed",
                    obj(&[("surface", v_str(self.surface.as_str())), ("msg", v_str(&format!("{:#}", err)))]),
                );
                report.failed = true;
            }
        }
        report
    }

    fn render(
        &mut self,
        fetched: &Fetched,
        health: &PoolHealth,
        sink: &mut dyn ViewSink,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let coin = self.config.coin_symbol.as_str();
        let local = now.with_timezone(&Local);

        render::render_system_status(sink, health);

        if let Some(pool) = &fetched.pool {
            render::render_pool_stats(sink, pool, coin, now);
            render::render_admin_stats(sink, pool);
        }

        render::render_blocks_list(sink, &fetched.blocks, coin, now);
        render::render_blocks_table(sink, &fetched.blocks, coin, now);
        render::render_miners_list(sink, &fetched.miners);
        render::render_miners_table(sink, &fetched.miners);

        if let Some(pool) = &fetched.pool {
            let hashrate = pool.pool_hashrate();
            self.history.record(hashrate, pool.shares_per_second());
            render::render_sparklines(sink, &self.history);
            render::render_chart(sink, self.chart.as_mut(), &format_chart_label(&local), hashrate)?;
        }

        let perf = fetched.performance.as_ref().and_then(|p| p.metrics.as_ref());
        if self.surface == Surface::Admin {
            render::render_system_resources(sink, fetched.disk.as_ref(), perf);
            render::render_component_sizes(sink, fetched.disk.as_ref(), fetched.components.as_ref());
            render::render_docker_containers(sink, fetched.docker.as_ref());
        }

        let alerts = alerts::evaluate(fetched.pool.as_ref(), fetched.disk.as_ref(), perf);
        for transition in self.latch.observe(&alerts) {
            match transition {
                Transition::Raised(alert) => logging::warn(
                    Domain::Alert,
                    "alert_raised",
                    obj(&[("kind", v_str(&format!("{:?}", alert.kind))), ("msg", v_str(&alert.message))]),
                ),
                Transition::Cleared(kind) => {
                    logging::info(Domain::Alert, "alert_cleared", obj(&[("kind", v_str(&format!("{:?}", kind)))]))
                }
            }
        }
        render::render_alerts(sink, &alerts);

        render::render_last_update(sink, &format_clock(&local));
        sink.commit()?;
        Ok(alerts.len())
    }

    /// Ticks immediately, then every refresh interval until `shutdown` resolves.
    ///
    /// Each tick's fetches run as their own task, so a slow or hung request
    /// delays only its own render; later ticks keep firing and rendering.
    /// Renders happen here, one at a time, in the order fetches settle.
    /// Fetches still in flight at shutdown are aborted. `present` sees the
    /// sink after every render.
    pub async fn run<S, F, P>(
        &mut self,
        api: Arc<dyn PoolApi>,
        sink: &mut S,
        shutdown: F,
        mut present: P,
    ) -> Result<()>
    where
        S: ViewSink,
        F: Future<Output = ()>,
        P: FnMut(&S, &CycleReport),
    {
        let mut ticker = tokio::time::interval(self.config.refresh_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: JoinSet<Fetched> = JoinSet::new();
        tokio::pin!(shutdown);

        logging::info(
            Domain::System,
            "dashboard_started",
            obj(&[
                ("surface", v_str(self.surface.as_str())),
                ("pool_id", v_str(&self.config.pool_id)),
                ("refresh_ms", v_num(self.config.refresh_ms as f64)),
            ]),
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let api = Arc::clone(&api);
                    let surface = self.surface;
                    in_flight.spawn(async move { fetch_all(api.as_ref(), surface).await });
                    if in_flight.len() > 1 {
                        logging::debug(
                            Domain::Cycle,
                            "ticks_overlapping",
                            obj(&[("in_flight", v_num(in_flight.len() as f64))]),
                        );
                    }
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => match joined {
                    Ok(fetched) => {
                        let report = self.apply(fetched, sink, Utc::now());
                        present(&*sink, &report);
                    }
                    Err(err) => logging::error(
                        Domain::Cycle,
                        "fetch_task_failed",
                        obj(&[("msg", v_str(&err.to_string()))]),
                    ),
                },
            }
        }

        let abandoned = in_flight.len();
        in_flight.shutdown().await;
        logging::info(
            Domain::System,
            "dashboard_stopped",
            obj(&[("surface", v_str(self.surface.as_str())), ("abandoned_ticks", v_num(abandoned as f64))]),
        );
        Ok(())
    }
}

/// Resolves on Ctrl-C. A failure to install the handler is logged and the
/// loop then runs until the process is killed.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        logging::error(Domain::System, "signal_handler_failed", obj(&[("msg", v_str(&err.to_string()))]));
        std::future::pending::<()>().await;
    }
}
