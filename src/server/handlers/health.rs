use axum::Json;
use serde_json::{Value, json};

// 不依赖存储与供应商配置
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
