use std::sync::Arc;
use std::time::Instant;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::logging::RequestLog;
use crate::server::AppState;
use crate::server::request_logging::{Invocation, log_invocation};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeRequest {
    /// Recorded as-is; the serving backend comes from configuration.
    pub provider: String,
    pub model: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub id: i64,
    pub provider: String,
    pub model: String,
    pub output: String,
    pub latency_ms: f64,
    pub created_at: DateTime<Utc>,
}

impl From<RequestLog> for InvokeResponse {
    fn from(log: RequestLog) -> Self {
        Self {
            id: log.id,
            provider: log.provider,
            model: log.model,
            output: log.output.unwrap_or_default(),
            latency_ms: log.latency_ms,
            created_at: log.created_at,
        }
    }
}

pub async fn invoke(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<InvokeRequest>,
) -> Result<Json<InvokeResponse>, GatewayError> {
    let provider = app_state.providers.resolve_active()?;

    let started = Instant::now();
    let output = provider
        .generate(&request.model, &request.prompt)
        .await
        .inspect_err(|e| {
            tracing::warn!(
                provider = app_state.providers.active_name(),
                model = %request.model,
                "generation failed: {}",
                e
            )
        })?;
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

    let log = log_invocation(
        &app_state,
        Invocation {
            provider: &request.provider,
            model: &request.model,
            prompt: &request.prompt,
            output,
            latency_ms,
        },
    )
    .await?;

    tracing::info!(
        id = log.id,
        model = %log.model,
        latency_ms = log.latency_ms,
        "invoke ok"
    );

    Ok(Json(log.into()))
}
