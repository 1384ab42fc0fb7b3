use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

use crate::db::postgres::PgPool;
use crate::error::GatewayError;
use crate::logging::types::{FilterValue, LogFilter, NewRequestLog, RequestLog};

const SELECT_COLUMNS: &str =
    "SELECT id, provider, model, prompt, output, latency_ms, status, created_at FROM request_logs";

// created_at 不回退：与库内最新时间取较大者
const INSERT_SQL: &str = "INSERT INTO request_logs (provider, model, prompt, output, latency_ms, status, created_at)
     VALUES ($1, $2, $3, $4, $5, $6,
             GREATEST(clock_timestamp(), COALESCE((SELECT MAX(created_at) FROM request_logs), clock_timestamp())))
     RETURNING id, created_at";

fn list_query(filter: &LogFilter) -> (String, Vec<FilterValue>) {
    let (where_sql, values) = filter.where_clause(|n| format!("${}", n));
    (
        format!(
            "{}{} ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS, where_sql
        ),
        values,
    )
}

#[derive(Clone)]
pub struct PgLogStore {
    pub pool: Arc<PgPool>,
}

impl PgLogStore {
    pub async fn connect(pg_url: &str, pool_size: usize) -> Result<Self, GatewayError> {
        let pool = PgPool::connect(pg_url, pool_size).await?;
        let store = Self {
            pool: Arc::new(pool),
        };
        // init tables
        let client = store.pool.pick();
        client
            .batch_execute(
                r#"CREATE TABLE IF NOT EXISTS request_logs (
                id BIGSERIAL PRIMARY KEY,
                provider VARCHAR(50) NOT NULL,
                model VARCHAR(100) NOT NULL,
                prompt TEXT NOT NULL,
                output TEXT,
                latency_ms DOUBLE PRECISION NOT NULL,
                status VARCHAR(50) NOT NULL DEFAULT 'ok',
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            CREATE INDEX IF NOT EXISTS idx_request_logs_provider ON request_logs(provider);
            CREATE INDEX IF NOT EXISTS idx_request_logs_model ON request_logs(model);
            CREATE INDEX IF NOT EXISTS idx_request_logs_created_at ON request_logs(created_at);"#,
            )
            .await?;
        tracing::info!("Postgres request_logs table ready");
        Ok(store)
    }

    pub async fn insert_request_log(&self, log: NewRequestLog) -> Result<RequestLog, GatewayError> {
        let client = self.pool.pick();
        let row = client
            .query_one(
                INSERT_SQL,
                &[
                    &log.provider,
                    &log.model,
                    &log.prompt,
                    &log.output,
                    &log.latency_ms,
                    &log.status,
                ],
            )
            .await?;

        Ok(RequestLog {
            id: row.try_get(0)?,
            provider: log.provider,
            model: log.model,
            prompt: log.prompt,
            output: Some(log.output),
            latency_ms: log.latency_ms,
            status: log.status,
            created_at: row.try_get(1)?,
        })
    }

    pub async fn list_request_logs(
        &self,
        filter: &LogFilter,
    ) -> Result<Vec<RequestLog>, GatewayError> {
        let (sql, values) = list_query(filter);

        let owned: Vec<Box<dyn ToSql + Sync + Send>> = values
            .into_iter()
            .map(|v| -> Box<dyn ToSql + Sync + Send> {
                match v {
                    FilterValue::Text(s) => Box::new(s),
                    FilterValue::Time(t) => Box::new(t),
                }
            })
            .collect();
        let params: Vec<&(dyn ToSql + Sync)> = owned
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let client = self.pool.pick();
        let rows = client.query(sql.as_str(), &params).await?;
        rows.iter().map(Self::row_to_request_log).collect()
    }

    fn row_to_request_log(row: &Row) -> Result<RequestLog, GatewayError> {
        let created_at: DateTime<Utc> = row.try_get(7)?;
        Ok(RequestLog {
            id: row.try_get(0)?,
            provider: row.try_get(1)?,
            model: row.try_get(2)?,
            prompt: row.try_get(3)?,
            output: row.try_get(4)?,
            latency_ms: row.try_get(5)?,
            status: row.try_get(6)?,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn list_query_without_filters_orders_newest_first() {
        let (sql, values) = list_query(&LogFilter::default());
        assert_eq!(
            sql,
            "SELECT id, provider, model, prompt, output, latency_ms, status, created_at \
             FROM request_logs ORDER BY created_at DESC, id DESC"
        );
        assert!(values.is_empty());
    }

    #[test]
    fn list_query_numbers_placeholders_in_filter_order() {
        let to = Utc.with_ymd_and_hms(2026, 1, 20, 0, 0, 0).unwrap();
        let (sql, values) = list_query(&LogFilter {
            model: None,
            provider: Some("gemini".into()),
            date_from: None,
            date_to: Some(to),
        });
        assert!(sql.ends_with(
            " WHERE provider = $1 AND created_at <= $2 ORDER BY created_at DESC, id DESC"
        ));
        assert_eq!(
            values,
            vec![FilterValue::Text("gemini".into()), FilterValue::Time(to)]
        );
    }

    #[test]
    fn insert_clamps_to_latest_created_at_and_returns_assigned_columns() {
        assert!(INSERT_SQL.contains(
            "GREATEST(clock_timestamp(), COALESCE((SELECT MAX(created_at) FROM request_logs)"
        ));
        assert!(INSERT_SQL.contains("VALUES ($1, $2, $3, $4, $5, $6,"));
        assert!(INSERT_SQL.trim_end().ends_with("RETURNING id, created_at"));
    }
}
