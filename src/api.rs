//! Pool API client.
//!
//! Every call degrades instead of failing: transport errors, non-2xx statuses
//! and undecodable bodies become `None` / an empty list plus a warn record.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::DashboardConfig;
use crate::logging::{self, obj, v_num, v_str, Domain};
use crate::model::{
    AdminStats, Block, ComponentSizes, DiskUsage, DockerStats, Miner, PerformanceReport,
    PoolResponse, PoolSnapshot,
};

const PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Pool,
    Blocks,
    Miners,
    Health,
    AdminStats,
    Disk,
    Components,
    Performance,
    Docker,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Pool => "pool",
            Endpoint::Blocks => "blocks",
            Endpoint::Miners => "miners",
            Endpoint::Health => "health",
            Endpoint::AdminStats => "admin_stats",
            Endpoint::Disk => "disk",
            Endpoint::Components => "components",
            Endpoint::Performance => "performance",
            Endpoint::Docker => "docker",
        }
    }

    fn segments<'a>(&self, pool_id: &'a str) -> Vec<&'a str> {
        match self {
            Endpoint::Pool => vec!["pools", pool_id],
            Endpoint::Blocks => vec!["pools", pool_id, "blocks"],
            Endpoint::Miners => vec!["pools", pool_id, "miners"],
            Endpoint::Health => vec!["health-check"],
            Endpoint::AdminStats => vec!["admin", "stats", "gc"],
            Endpoint::Disk => vec!["admin", "system", "disk"],
            Endpoint::Components => vec!["admin", "system", "components"],
            Endpoint::Performance => vec!["admin", "system", "performance"],
            Endpoint::Docker => vec!["admin", "system", "docker"],
        }
    }

    fn is_paged(&self) -> bool {
        matches!(self, Endpoint::Blocks | Endpoint::Miners)
    }
}

#[async_trait]
pub trait PoolApi: Send + Sync {
    async fn pool(&self) -> Option<PoolSnapshot>;
    async fn blocks(&self) -> Vec<Block>;
    async fn miners(&self) -> Vec<Miner>;
    /// `true` iff the health check answered with a success status.
    async fn health(&self) -> bool;
    async fn admin_stats(&self) -> Option<AdminStats>;
    async fn disk(&self) -> Option<DiskUsage>;
    async fn components(&self) -> Option<ComponentSizes>;
    async fn performance(&self) -> Option<PerformanceReport>;
    async fn docker(&self) -> Option<DockerStats>;
}

pub struct HttpPoolApi {
    client: Client,
    base: Url,
    pool_id: String,
}

impl HttpPoolApi {
    pub fn new(cfg: &DashboardConfig) -> Result<Self> {
        let base = Url::parse(&cfg.api_base)
            .with_context(|| format!("invalid POOL_API_BASE {:?}", cfg.api_base))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("POOL_API_BASE {:?} cannot carry a path", cfg.api_base));
        }
        Ok(Self {
            client: Client::builder().timeout(cfg.http_timeout()).build()?,
            base,
            pool_id: cfg.pool_id.clone(),
        })
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("api base cannot carry a path"))?
            .pop_if_empty()
            .extend(endpoint.segments(&self.pool_id));
        if endpoint.is_paged() {
            url.query_pairs_mut()
                .append_pair("page", "0")
                .append_pair("pageSize", &PAGE_SIZE.to_string());
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T> {
        let url = self.endpoint_url(endpoint)?;
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP {}", status.as_u16()));
        }
        Ok(resp.json::<T>().await?)
    }

    /// Fetches and decodes `endpoint`, or logs why not and returns `None`.
    async fn fetch<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Option<T> {
        match self.get_json(endpoint).await {
            Ok(value) => Some(value),
            Err(err) => {
                report_failure(endpoint, &err);
                None
            }
        }
    }
}

fn report_failure(endpoint: Endpoint, err: &anyhow::Error) {
    logging::warn(
        Domain::Api,
        "fetch_failed",
        obj(&[
            ("endpoint", v_str(endpoint.name())),
            ("msg", v_str(&format!("{:#}", err))),
        ]),
    );
}

#[async_trait]
impl PoolApi for HttpPoolApi {
    async fn pool(&self) -> Option<PoolSnapshot> {
        let resp: PoolResponse = self.fetch(Endpoint::Pool).await?;
        if resp.pool.is_none() {
            report_failure(Endpoint::Pool, &anyhow!("response has no pool object"));
        }
        resp.pool
    }

    async fn blocks(&self) -> Vec<Block> {
        self.fetch(Endpoint::Blocks).await.unwrap_or_default()
    }

    async fn miners(&self) -> Vec<Miner> {
        self.fetch(Endpoint::Miners).await.unwrap_or_default()
    }

    async fn health(&self) -> bool {
        let sent = match self.endpoint_url(Endpoint::Health) {
            Ok(url) => self.client.get(url).send().await.map_err(anyhow::Error::from),
            Err(err) => Err(err),
        };
        match sent {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                logging::debug(
                    Domain::Api,
                    "health_unhealthy",
                    obj(&[("endpoint", v_str("health")), ("status", v_num(resp.status().as_u16() as f64))]),
                );
                false
            }
            Err(err) => {
                report_failure(Endpoint::Health, &err);
                false
            }
        }
    }

    async fn admin_stats(&self) -> Option<AdminStats> {
        self.fetch(Endpoint::AdminStats).await
    }

    async fn disk(&self) -> Option<DiskUsage> {
        self.fetch(Endpoint::Disk).await
    }

    async fn components(&self) -> Option<ComponentSizes> {
        self.fetch(Endpoint::Components).await
    }

    async fn performance(&self) -> Option<PerformanceReport> {
        self.fetch(Endpoint::Performance).await
    }

    async fn docker(&self) -> Option<DockerStats> {
        self.fetch(Endpoint::Docker).await
    }
}
