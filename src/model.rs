//! Wire models for the pool API and the dashboard server's system endpoints.
//!
//! Every field is optional: the renderers show placeholders for anything the
//! API leaves out instead of rejecting the whole payload.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoolStats {
    pub connected_miners: Option<u64>,
    pub pool_hashrate: Option<f64>,
    pub shares_per_second: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkStats {
    pub block_height: Option<u64>,
    pub network_hashrate: Option<f64>,
    pub network_difficulty: Option<f64>,
    pub connected_peers: Option<u32>,
    pub last_network_block_time: Option<DateTime<Utc>>,
    pub network_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoolSnapshot {
    pub pool_stats: Option<PoolStats>,
    pub network_stats: Option<NetworkStats>,
    pub address: Option<String>,
    pub total_blocks: Option<u64>,
    pub total_paid: Option<f64>,
    pub pool_effort: Option<f64>,
}

/// Envelope of `GET /pools/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PoolResponse {
    pub pool: Option<PoolSnapshot>,
}

impl PoolSnapshot {
    pub fn stats(&self) -> PoolStats {
        self.pool_stats.clone().unwrap_or_default()
    }

    pub fn network(&self) -> NetworkStats {
        self.network_stats.clone().unwrap_or_default()
    }

    pub fn pool_hashrate(&self) -> f64 {
        self.pool_stats.as_ref().and_then(|s| s.pool_hashrate).unwrap_or(0.0)
    }

    pub fn shares_per_second(&self) -> f64 {
        self.pool_stats.as_ref().and_then(|s| s.shares_per_second).unwrap_or(0.0)
    }

    pub fn block_height(&self) -> Option<u64> {
        self.network_stats.as_ref().and_then(|n| n.block_height)
    }

    pub fn connected_peers(&self) -> Option<u32> {
        self.network_stats.as_ref().and_then(|n| n.connected_peers)
    }

    /// Pool/network hashrate ratio, when both sides are known and non-zero.
    pub fn network_share(&self) -> Option<f64> {
        let pool = self.pool_hashrate();
        let network = self.network_stats.as_ref().and_then(|n| n.network_hashrate).unwrap_or(0.0);
        if pool > 0.0 && network > 0.0 {
            Some(pool / network)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStatus {
    Pending,
    Confirmed,
    Orphaned,
    Other(String),
}

impl From<String> for BlockStatus {
    fn from(raw: String) -> Self {
        match raw.to_lowercase().as_str() {
            "pending" => BlockStatus::Pending,
            "confirmed" => BlockStatus::Confirmed,
            "orphaned" => BlockStatus::Orphaned,
            _ => BlockStatus::Other(raw),
        }
    }
}

impl<'de> Deserialize<'de> for BlockStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(BlockStatus::from(String::deserialize(deserializer)?))
    }
}

impl Default for BlockStatus {
    fn default() -> Self {
        BlockStatus::Other("unknown".to_string())
    }
}

impl BlockStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BlockStatus::Pending => "pending",
            BlockStatus::Confirmed => "confirmed",
            BlockStatus::Orphaned => "orphaned",
            BlockStatus::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Block {
    pub block_height: Option<u64>,
    pub status: BlockStatus,
    pub reward: Option<f64>,
    pub effort: Option<f64>,
    pub created: Option<DateTime<Utc>>,
    pub miner: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Miner {
    pub miner: String,
    pub hashrate: Option<f64>,
    pub worker_count: Option<u32>,
    pub shares_per_second: Option<f64>,
}

/// A system metric the server reports either as a value or as `"N/A"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Reading<T> {
    Value(T),
    Unavailable(String),
}

impl<T> Reading<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Reading::Value(v) => Some(v),
            Reading::Unavailable(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskComponents {
    pub postgresql: Option<String>,
    pub ergo_node: Option<String>,
    pub logs: Option<String>,
    pub backups: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskUsage {
    pub total: Option<String>,
    pub used: Option<String>,
    pub free: Option<String>,
    pub usage_percent: Option<f64>,
    pub components: Option<DiskComponents>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ComponentSizes {
    pub components: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryUsage {
    pub total: Option<String>,
    pub used: Option<String>,
    pub usage_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoadAverage {
    #[serde(rename = "1min")]
    pub one: Option<String>,
    #[serde(rename = "5min")]
    pub five: Option<String>,
    #[serde(rename = "15min")]
    pub fifteen: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceMetrics {
    pub cpu_usage: Option<Reading<f64>>,
    pub memory: Option<Reading<MemoryUsage>>,
    pub load_average: Option<Reading<LoadAverage>>,
}

impl PerformanceMetrics {
    pub fn cpu_percent(&self) -> Option<f64> {
        self.cpu_usage.as_ref().and_then(|r| r.value().copied())
    }

    pub fn memory(&self) -> Option<&MemoryUsage> {
        self.memory.as_ref().and_then(|r| r.value())
    }

    pub fn load_average(&self) -> Option<&LoadAverage> {
        self.load_average.as_ref().and_then(|r| r.value())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PerformanceReport {
    pub metrics: Option<PerformanceMetrics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContainerStats {
    pub name: Option<String>,
    pub cpu: Option<String>,
    pub memory: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DockerStats {
    pub containers: Vec<ContainerStats>,
}

/// Miningcore's GC/admin counters; shown only in diagnostics.
pub type AdminStats = Value;
