use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{Connection, OptionalExtension, Result, Row, params_from_iter};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::logging::time::{parse_datetime_string, to_storage_string};
use crate::logging::types::{FilterValue, LogFilter, NewRequestLog, RequestLog};

const SELECT_COLUMNS: &str =
    "SELECT id, provider, model, prompt, output, latency_ms, status, created_at FROM request_logs";

#[derive(Clone)]
pub struct DatabaseLogger {
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseLogger {
    pub async fn new(database_path: &str) -> Result<Self> {
        // 确保数据库文件的目录存在
        if let Some(parent) = std::path::Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    return Err(rusqlite::Error::SqliteFailure(
                        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                        Some(format!("Failed to create directory: {}", e)),
                    ));
                }
                tracing::info!("Created database directory: {}", parent.display());
            }
        }

        let conn = Connection::open(database_path)?;
        tracing::info!("Database initialized at: {}", database_path);

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS request_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                provider TEXT NOT NULL,
                model TEXT NOT NULL,
                prompt TEXT NOT NULL,
                output TEXT,
                latency_ms REAL NOT NULL,
                status TEXT NOT NULL DEFAULT 'ok',
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_request_logs_provider ON request_logs(provider);
            CREATE INDEX IF NOT EXISTS idx_request_logs_model ON request_logs(model);
            CREATE INDEX IF NOT EXISTS idx_request_logs_created_at ON request_logs(created_at);",
        )?;

        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn insert_request_log(&self, log: NewRequestLog) -> Result<RequestLog> {
        let conn = self.connection.lock().await;

        // created_at 不回退：时钟回拨时沿用库内最新时间
        let latest: Option<String> = conn
            .query_row("SELECT MAX(created_at) FROM request_logs", [], |row| {
                row.get::<_, Option<String>>(0)
            })
            .optional()?
            .flatten();
        let now = Utc::now().trunc_subsecs(6);
        let created_at = latest
            .and_then(|s| parse_datetime_string(&s).ok())
            .filter(|last| *last > now)
            .unwrap_or(now);

        conn.execute(
            "INSERT INTO request_logs (
                provider, model, prompt, output, latency_ms, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                &log.provider,
                &log.model,
                &log.prompt,
                &log.output,
                log.latency_ms,
                &log.status,
                to_storage_string(&created_at),
            ),
        )?;

        Ok(RequestLog {
            id: conn.last_insert_rowid(),
            provider: log.provider,
            model: log.model,
            prompt: log.prompt,
            output: Some(log.output),
            latency_ms: log.latency_ms,
            status: log.status,
            created_at,
        })
    }

    pub async fn list_request_logs(&self, filter: &LogFilter) -> Result<Vec<RequestLog>> {
        let conn = self.connection.lock().await;

        let (where_sql, values) = filter.where_clause(|n| format!("?{}", n));
        let sql = format!(
            "{}{} ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS, where_sql
        );
        let params: Vec<String> = values
            .into_iter()
            .map(|v| match v {
                FilterValue::Text(s) => s,
                FilterValue::Time(t) => to_storage_string(&t),
            })
            .collect();

        let mut stmt = conn.prepare(&sql)?;
        let log_iter = stmt.query_map(params_from_iter(params.iter()), row_to_request_log)?;

        let mut logs = Vec::new();
        for log in log_iter {
            logs.push(log?);
        }

        Ok(logs)
    }

    pub async fn get_request_log(&self, id: i64) -> Result<Option<RequestLog>> {
        let conn = self.connection.lock().await;
        conn.query_row(
            &format!("{} WHERE id = ?1", SELECT_COLUMNS),
            [id],
            row_to_request_log,
        )
        .optional()
    }
}

fn row_to_request_log(row: &Row<'_>) -> Result<RequestLog> {
    let raw_created_at: String = row.get(7)?;
    let created_at: DateTime<Utc> = parse_datetime_string(&raw_created_at).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(RequestLog {
        id: row.get(0)?,
        provider: row.get(1)?,
        model: row.get(2)?,
        prompt: row.get(3)?,
        output: row.get(4)?,
        latency_ms: row.get(5)?,
        status: row.get(6)?,
        created_at,
    })
}
