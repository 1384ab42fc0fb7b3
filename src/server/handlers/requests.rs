use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::logging::time::{ceil_to_storage_precision, parse_optional_bound};
use crate::logging::{LogFilter, RequestLog};
use crate::server::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct RequestsQuery {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
}

impl RequestsQuery {
    // 空字符串等同于未提供；无法解析的日期直接忽略。
    // 上界截断即可：存储值本身只有微秒精度
    pub fn to_filter(&self) -> LogFilter {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        LogFilter {
            model: non_empty(&self.model),
            provider: non_empty(&self.provider),
            date_from: parse_optional_bound(self.date_from.as_deref())
                .map(ceil_to_storage_precision),
            date_to: parse_optional_bound(self.date_to.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLogEntry {
    pub id: i64,
    pub provider: String,
    pub model: String,
    pub latency_ms: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub prompt: String,
    pub output: Option<String>,
}

impl From<RequestLog> for RequestLogEntry {
    fn from(log: RequestLog) -> Self {
        Self {
            id: log.id,
            provider: log.provider,
            model: log.model,
            latency_ms: log.latency_ms,
            status: log.status,
            created_at: log.created_at,
            prompt: log.prompt,
            output: log.output,
        }
    }
}

pub async fn list_requests(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<RequestsQuery>,
) -> Result<Json<Vec<RequestLogEntry>>, GatewayError> {
    let filter = query.to_filter();
    let logs = app_state.log_store.list_request_logs(&filter).await?;
    Ok(Json(logs.into_iter().map(RequestLogEntry::from).collect()))
}
