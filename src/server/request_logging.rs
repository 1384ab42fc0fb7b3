use crate::error::Result;
use crate::logging::types::STATUS_OK;
use crate::logging::{NewRequestLog, RequestLog};
use crate::server::AppState;

/// One successful invoke call as it is submitted to storage.
pub struct Invocation<'a> {
    pub provider: &'a str,
    pub model: &'a str,
    pub prompt: &'a str,
    pub output: String,
    pub latency_ms: f64,
}

// 仅在生成成功后调用；provider/model 记录调用方传入的原值
pub async fn log_invocation(app_state: &AppState, invocation: Invocation<'_>) -> Result<RequestLog> {
    let log = NewRequestLog {
        provider: invocation.provider.to_string(),
        model: invocation.model.to_string(),
        prompt: invocation.prompt.to_string(),
        output: invocation.output,
        latency_ms: invocation.latency_ms,
        status: STATUS_OK.to_string(),
    };

    let stored = app_state.log_store.insert_request_log(log).await;
    if let Err(e) = &stored {
        tracing::error!("Failed to log request: {}", e);
    }
    stored
}
