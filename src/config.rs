use std::time::Duration;

/// Runtime settings for both dashboard surfaces.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub api_base: String,
    pub pool_id: String,
    pub refresh_ms: u64,
    pub chart_max_points: usize,
    pub session_timeout_ms: i64,
    pub password_enabled: bool,
    pub password: String,
    pub session_db: String,
    pub coin_symbol: String,
    /// Per-request deadline; a request that never answers is dropped after this.
    pub http_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8888/api".to_string(),
            pool_id: "ergo-solo".to_string(),
            refresh_ms: 10_000,
            chart_max_points: 24,
            session_timeout_ms: 3_600_000,
            password_enabled: false,
            password: String::new(),
            session_db: "./dashboard-session.sqlite".to_string(),
            coin_symbol: "ERG".to_string(),
            http_timeout_secs: 10,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            api_base: std::env::var("POOL_API_BASE").unwrap_or(d.api_base),
            pool_id: std::env::var("POOL_ID").unwrap_or(d.pool_id),
            refresh_ms: std::env::var("REFRESH_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.refresh_ms),
            chart_max_points: std::env::var("CHART_MAX_POINTS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.chart_max_points),
            session_timeout_ms: std::env::var("SESSION_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.session_timeout_ms),
            password_enabled: std::env::var("ADMIN_PASSWORD_ENABLED").map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")).unwrap_or(d.password_enabled),
            password: std::env::var("ADMIN_PASSWORD").unwrap_or(d.password),
            session_db: std::env::var("SESSION_DB").unwrap_or(d.session_db),
            coin_symbol: std::env::var("COIN_SYMBOL").unwrap_or(d.coin_symbol),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.http_timeout_secs),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms.max(1))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    /// The configured password, if the gate should ask for one at all.
    pub fn required_password(&self) -> Option<&str> {
        if self.password_enabled && !self.password.is_empty() {
            Some(&self.password)
        } else {
            None
        }
    }
}
