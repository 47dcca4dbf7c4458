use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub query: QueryConfig,
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Request header carrying the tenant id.
    #[serde(default = "default_tenant_header")]
    pub tenant_header: String,
}

fn default_tenant_header() -> String {
    "Hawkular-Tenant".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
    /// Data retention for metrics without their own dataRetention.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_retention_days() -> u32 {
    7
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Window used when a query omits `start`.
    #[serde(default = "default_range_hours")]
    pub default_range_hours: u32,
    /// Upper bound on the bucket count of a single stats query.
    #[serde(default = "default_max_buckets")]
    pub max_buckets: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_range_hours: default_range_hours(),
            max_buckets: default_max_buckets(),
        }
    }
}

fn default_range_hours() -> u32 {
    8
}

fn default_max_buckets() -> usize {
    10_000
}

impl QueryConfig {
    pub fn default_range_ms(&self) -> i64 {
        i64::from(self.default_range_hours) * 3600 * 1000
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    pub interval_secs: u64,
    /// Optional cron expression for VACUUM (e.g. "0 0 3 * * *"). Uses local time.
    #[serde(default)]
    pub vacuum_schedule: Option<String>,
    pub vacuum_interval_secs: u64,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.server.tenant_header.trim().is_empty(),
            "server.tenant_header must be non-empty"
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.database.retention_days > 0,
            "database.retention_days must be > 0, got {}",
            self.database.retention_days
        );
        anyhow::ensure!(
            self.query.default_range_hours > 0,
            "query.default_range_hours must be > 0, got {}",
            self.query.default_range_hours
        );
        anyhow::ensure!(
            self.query.max_buckets > 0,
            "query.max_buckets must be > 0, got {}",
            self.query.max_buckets
        );
        anyhow::ensure!(
            self.retention.interval_secs > 0,
            "retention.interval_secs must be > 0, got {}",
            self.retention.interval_secs
        );
        anyhow::ensure!(
            self.retention.vacuum_interval_secs > 0,
            "retention.vacuum_interval_secs must be > 0, got {}",
            self.retention.vacuum_interval_secs
        );
        if let Some(schedule) = &self.retention.vacuum_schedule {
            cron::Schedule::from_str(schedule).map_err(|e| {
                anyhow::anyhow!(
                    "retention.vacuum_schedule is not a valid cron expression [{schedule}]: {e}"
                )
            })?;
        }
        Ok(())
    }
}
