// SQLite-backed MetricsStore. Definitions carry tags as a versioned BLOB; data points are one row
// per (tenant, type, name, timestamp).

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::{debug, instrument};

use super::filter::TagFilter;
use super::{MetricsStore, StoreError, StoreResult, blob, stats};
use crate::models::{DataPoint, MetricDefinition, MetricId, MetricType, NumericBucketPoint};
use crate::params::{Buckets, MetricSelector, Tags};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS metric_definitions (
                tenant_id TEXT NOT NULL,
                metric_type TEXT NOT NULL,
                name TEXT NOT NULL,
                tags BLOB NOT NULL,
                data_retention INTEGER,
                PRIMARY KEY (tenant_id, metric_type, name)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS data_points (
                tenant_id TEXT NOT NULL,
                metric_type TEXT NOT NULL,
                name TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                value REAL NOT NULL,
                PRIMARY KEY (tenant_id, metric_type, name, timestamp)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_data_points_timestamp ON data_points(timestamp)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn series(&self, id: &MetricId, start: i64, end: i64) -> StoreResult<Vec<DataPoint>> {
        let rows = sqlx::query(
            "SELECT timestamp, value FROM data_points
             WHERE tenant_id = $1 AND metric_type = $2 AND name = $3
               AND timestamp >= $4 AND timestamp <= $5
             ORDER BY timestamp ASC",
        )
        .bind(&id.tenant_id)
        .bind(id.metric_type.base().text())
        .bind(&id.name)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(DataPoint::new(row.try_get("timestamp")?, row.try_get("value")?));
        }
        if id.metric_type.is_rate() {
            return Ok(stats::rates(&out));
        }
        Ok(out)
    }

    /// Read-modify-write of a definition's tags. The write only lands if the stored BLOB is
    /// still the one that was read; otherwise the update is retried on the fresh value.
    /// A missing definition is left alone.
    async fn update_tags(
        &self,
        id: &MetricId,
        apply: impl Fn(&mut BTreeMap<String, String>) + Send + Sync,
    ) -> StoreResult<()> {
        loop {
            let row = sqlx::query(
                "SELECT tags FROM metric_definitions
                 WHERE tenant_id = $1 AND metric_type = $2 AND name = $3",
            )
            .bind(&id.tenant_id)
            .bind(id.metric_type.text())
            .bind(&id.name)
            .fetch_optional(&self.pool)
            .await?;
            let Some(row) = row else {
                return Ok(());
            };
            let stored: Vec<u8> = row.try_get("tags")?;
            let mut tags = blob::decode_tags(&stored)?;
            apply(&mut tags);

            let updated = sqlx::query(
                "UPDATE metric_definitions SET tags = $1
                 WHERE tenant_id = $2 AND metric_type = $3 AND name = $4 AND tags = $5",
            )
            .bind(blob::encode_tags(&tags)?)
            .bind(&id.tenant_id)
            .bind(id.metric_type.text())
            .bind(&id.name)
            .bind(&stored)
            .execute(&self.pool)
            .await?
            .rows_affected();
            if updated == 1 {
                return Ok(());
            }
            debug!(metric = %id, "tags changed concurrently, retrying");
        }
    }

    fn parse_definition_row(row: &SqliteRow) -> StoreResult<MetricDefinition> {
        let type_text: String = row.try_get("metric_type")?;
        let metric_type = MetricType::from_text(&type_text)
            .ok_or_else(|| StoreError::Codec(format!("unknown metric type [{type_text}]")))?;
        let tags: Vec<u8> = row.try_get("tags")?;
        let data_retention: Option<i64> = row.try_get("data_retention")?;
        Ok(MetricDefinition {
            tenant_id: row.try_get("tenant_id")?,
            id: row.try_get("name")?,
            metric_type,
            tags: blob::decode_tags(&tags)?,
            data_retention: data_retention.map(|d| d as u32),
        })
    }
}

#[async_trait]
impl MetricsStore for SqliteStore {
    #[instrument(skip(self, metric), fields(repo = "sqlite", operation = "create_metric", metric = %metric.metric_id()))]
    async fn create_metric(&self, metric: &MetricDefinition) -> StoreResult<()> {
        let id = metric.metric_id();
        let inserted = sqlx::query(
            "INSERT INTO metric_definitions (tenant_id, metric_type, name, tags, data_retention)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (tenant_id, metric_type, name) DO NOTHING",
        )
        .bind(&id.tenant_id)
        .bind(id.metric_type.text())
        .bind(&id.name)
        .bind(blob::encode_tags(&metric.tags)?)
        .bind(metric.data_retention.map(i64::from))
        .execute(&self.pool)
        .await?
        .rows_affected();
        if inserted == 1 {
            return Ok(());
        }

        match self.find_metric(&id).await? {
            Some(stored)
                if stored.tags == metric.tags && stored.data_retention == metric.data_retention =>
            {
                debug!("definition already present with identical attributes");
                Ok(())
            }
            _ => Err(StoreError::AlreadyExists(id)),
        }
    }

    async fn find_metric(&self, id: &MetricId) -> StoreResult<Option<MetricDefinition>> {
        let row = sqlx::query(
            "SELECT tenant_id, metric_type, name, tags, data_retention FROM metric_definitions
             WHERE tenant_id = $1 AND metric_type = $2 AND name = $3",
        )
        .bind(&id.tenant_id)
        .bind(id.metric_type.text())
        .bind(&id.name)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::parse_definition_row).transpose()
    }

    #[instrument(skip(self, tags), fields(repo = "sqlite", operation = "find_metrics"))]
    async fn find_metrics(
        &self,
        tenant_id: &str,
        metric_type: MetricType,
        tags: Option<&Tags>,
    ) -> StoreResult<Vec<MetricDefinition>> {
        let filter = tags.map(TagFilter::compile).transpose()?;
        let rows = sqlx::query(
            "SELECT tenant_id, metric_type, name, tags, data_retention FROM metric_definitions
             WHERE tenant_id = $1 AND metric_type = $2 ORDER BY name ASC",
        )
        .bind(tenant_id)
        .bind(metric_type.text())
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let def = Self::parse_definition_row(&row)?;
            if filter.as_ref().is_none_or(|f| f.matches(&def.tags)) {
                out.push(def);
            }
        }
        Ok(out)
    }

    async fn get_metric_tags(&self, id: &MetricId) -> StoreResult<Option<BTreeMap<String, String>>> {
        Ok(self.find_metric(id).await?.map(|m| m.tags))
    }

    #[instrument(skip(self, tags), fields(repo = "sqlite", operation = "add_tags", metric = %id))]
    async fn add_tags(&self, id: &MetricId, tags: &BTreeMap<String, String>) -> StoreResult<()> {
        if tags.iter().any(|(k, v)| k.is_empty() || v.is_empty()) {
            return Err(StoreError::InvalidArgument(
                "Tag keys and values must not be empty".into(),
            ));
        }
        sqlx::query(
            "INSERT INTO metric_definitions (tenant_id, metric_type, name, tags, data_retention)
             VALUES ($1, $2, $3, $4, NULL)
             ON CONFLICT (tenant_id, metric_type, name) DO NOTHING",
        )
        .bind(&id.tenant_id)
        .bind(id.metric_type.text())
        .bind(&id.name)
        .bind(blob::encode_tags(&BTreeMap::new())?)
        .execute(&self.pool)
        .await?;
        self.update_tags(id, |current| {
            current.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        })
        .await
    }

    #[instrument(skip(self, keys), fields(repo = "sqlite", operation = "delete_tags", metric = %id))]
    async fn delete_tags(&self, id: &MetricId, keys: &[String]) -> StoreResult<()> {
        self.update_tags(id, |current| {
            for key in keys {
                current.remove(key);
            }
        })
        .await
    }

    #[instrument(skip(self, points), fields(repo = "sqlite", operation = "add_data_points", metric = %id, points_count = points.len()))]
    async fn add_data_points(&self, id: &MetricId, points: &[DataPoint]) -> StoreResult<()> {
        if id.metric_type.is_rate() {
            return Err(StoreError::InvalidArgument(format!(
                "Cannot store data points of type {}",
                id.metric_type
            )));
        }
        if points.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT OR IGNORE INTO metric_definitions (tenant_id, metric_type, name, tags, data_retention)
             VALUES ($1, $2, $3, $4, NULL)",
        )
        .bind(&id.tenant_id)
        .bind(id.metric_type.text())
        .bind(&id.name)
        .bind(blob::encode_tags(&BTreeMap::new())?)
        .execute(&mut *tx)
        .await?;

        for p in points {
            sqlx::query(
                "INSERT OR REPLACE INTO data_points (tenant_id, metric_type, name, timestamp, value)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&id.tenant_id)
            .bind(id.metric_type.text())
            .bind(&id.name)
            .bind(p.timestamp)
            .bind(p.value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "sqlite", operation = "find_data_points", metric = %id))]
    async fn find_data_points(
        &self,
        id: &MetricId,
        start: i64,
        end: i64,
    ) -> StoreResult<Vec<DataPoint>> {
        let raw = MetricId::new(id.tenant_id.clone(), id.metric_type.base(), id.name.clone());
        self.series(&raw, start, end).await
    }

    #[instrument(skip(self), fields(repo = "sqlite", operation = "find_rate_points", metric = %id))]
    async fn find_rate_points(
        &self,
        id: &MetricId,
        start: i64,
        end: i64,
    ) -> StoreResult<Vec<DataPoint>> {
        let rate = MetricId::new(id.tenant_id.clone(), MetricType::CounterRate, id.name.clone());
        self.series(&rate, start, end).await
    }

    #[instrument(skip(self, buckets, percentiles), fields(repo = "sqlite", operation = "find_stats", metric = %id, buckets = buckets.count()))]
    async fn find_stats(
        &self,
        id: &MetricId,
        buckets: &Buckets,
        percentiles: &[f64],
    ) -> StoreResult<Vec<NumericBucketPoint>> {
        let points = self.series(id, buckets.start(), buckets.end()).await?;
        Ok(stats::bucket_stats(&points, buckets, percentiles))
    }

    #[instrument(skip(self, selector, buckets, percentiles), fields(repo = "sqlite", operation = "find_numeric_stats"))]
    async fn find_numeric_stats(
        &self,
        tenant_id: &str,
        metric_type: MetricType,
        selector: &MetricSelector,
        buckets: &Buckets,
        percentiles: &[f64],
        stacked: bool,
    ) -> StoreResult<Vec<NumericBucketPoint>> {
        let names: Vec<String> = match selector {
            MetricSelector::Names(names) => names.clone(),
            MetricSelector::Tags(tags) => self
                .find_metrics(tenant_id, metric_type.base(), Some(tags))
                .await?
                .into_iter()
                .map(|m| m.id)
                .collect(),
        };
        debug!(series = names.len(), "selected series");

        let mut series = Vec::with_capacity(names.len());
        for name in names {
            let id = MetricId::new(tenant_id, metric_type, name);
            series.push(self.series(&id, buckets.start(), buckets.end()).await?);
        }
        Ok(if stacked {
            stats::stacked_stats(&series, buckets, percentiles)
        } else {
            stats::pooled_stats(&series, buckets, percentiles)
        })
    }

    #[instrument(skip(self), fields(repo = "sqlite", operation = "prune_expired"))]
    async fn prune_expired(&self, now_ms: i64, default_retention_days: u32) -> StoreResult<u64> {
        let r = sqlx::query(
            r#"
            DELETE FROM data_points
            WHERE timestamp < $1 - COALESCE(
                (SELECT d.data_retention FROM metric_definitions d
                 WHERE d.tenant_id = data_points.tenant_id
                   AND d.metric_type = data_points.metric_type
                   AND d.name = data_points.name),
                $2) * $3
            "#,
        )
        .bind(now_ms)
        .bind(i64::from(default_retention_days))
        .bind(MS_PER_DAY)
        .execute(&self.pool)
        .await?;
        Ok(r.rows_affected())
    }

    #[instrument(skip(self), fields(repo = "sqlite", operation = "vacuum"))]
    async fn vacuum(&self) -> StoreResult<()> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }
}
