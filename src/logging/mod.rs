pub mod database;
pub mod postgres_store;
pub mod time;
pub mod types;

pub use database::DatabaseLogger;
pub use postgres_store::PgLogStore;
pub use types::{LogFilter, NewRequestLog, RequestLog};
