pub mod handlers;
pub(crate) mod request_logging;
pub mod storage_traits;

use crate::config::Settings;
use crate::error::{GatewayError, Result as AppResult};
use crate::logging::DatabaseLogger;
use crate::logging::postgres_store::PgLogStore;
use crate::providers::gemini::{self, GeminiProvider};
use crate::providers::ProviderRegistry;
use crate::server::storage_traits::RequestLogStore;
use axum::Router;
use axum::http::HeaderValue;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Settings,
    pub log_store: Arc<dyn RequestLogStore + Send + Sync>,
    pub providers: Arc<ProviderRegistry>,
}

pub async fn create_app(config: Settings) -> AppResult<Router> {
    // Choose store based on Postgres availability
    let log_store: Arc<dyn RequestLogStore + Send + Sync> =
        if let Some(pg_url) = &config.logging.pg_url {
            let pool_size = config.logging.pg_pool_size.unwrap_or(4);
            let store = PgLogStore::connect(pg_url, pool_size).await?;
            tracing::info!("Using PostgreSQL for request logs");
            Arc::new(store)
        } else {
            Arc::new(DatabaseLogger::new(&config.logging.database_path).await?)
        };

    let providers = build_registry(&config)?;
    tracing::info!(
        "Active provider: {} (registered: {:?})",
        providers.active_name(),
        providers.names()
    );

    let app_state = AppState {
        config,
        log_store,
        providers: Arc::new(providers),
    };

    build_router(app_state)
}

// 启动时一次性注册；新增后端只需在此登记
pub fn build_registry(config: &Settings) -> AppResult<ProviderRegistry> {
    let mut registry = ProviderRegistry::new(config.provider.active.clone());
    registry.register(
        gemini::PROVIDER_NAME,
        Arc::new(GeminiProvider::from_settings(config)?),
    );
    Ok(registry)
}

pub fn build_router(app_state: AppState) -> AppResult<Router> {
    let cors = cors_layer(&app_state.config.cors.allowed_origin)?;

    Ok(handlers::routes()
        .with_state(Arc::new(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

fn cors_layer(allowed_origin: &str) -> AppResult<CorsLayer> {
    let origin = HeaderValue::from_str(allowed_origin.trim()).map_err(|e| {
        GatewayError::Config(format!("Invalid ALLOWED_ORIGINS {:?}: {}", allowed_origin, e))
    })?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods(Any)
        .allow_headers(Any))
}
