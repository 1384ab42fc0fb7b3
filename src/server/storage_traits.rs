use std::future::Future;
use std::pin::Pin;

use crate::error::Result;
use crate::logging::{DatabaseLogger, LogFilter, NewRequestLog, PgLogStore, RequestLog};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// 请求日志存储抽象（SQLite、Postgres 各有实现）；只追加，不更新不删除
pub trait RequestLogStore: Send + Sync {
    fn insert_request_log<'a>(&'a self, log: NewRequestLog) -> BoxFuture<'a, Result<RequestLog>>;
    fn list_request_logs<'a>(
        &'a self,
        filter: &'a LogFilter,
    ) -> BoxFuture<'a, Result<Vec<RequestLog>>>;
}

impl RequestLogStore for DatabaseLogger {
    fn insert_request_log<'a>(&'a self, log: NewRequestLog) -> BoxFuture<'a, Result<RequestLog>> {
        Box::pin(async move { Ok(self.insert_request_log(log).await?) })
    }

    fn list_request_logs<'a>(
        &'a self,
        filter: &'a LogFilter,
    ) -> BoxFuture<'a, Result<Vec<RequestLog>>> {
        Box::pin(async move { Ok(self.list_request_logs(filter).await?) })
    }
}

impl RequestLogStore for PgLogStore {
    fn insert_request_log<'a>(&'a self, log: NewRequestLog) -> BoxFuture<'a, Result<RequestLog>> {
        Box::pin(async move { self.insert_request_log(log).await })
    }

    fn list_request_logs<'a>(
        &'a self,
        filter: &'a LogFilter,
    ) -> BoxFuture<'a, Result<Vec<RequestLog>>> {
        Box::pin(async move { self.list_request_logs(filter).await })
    }
}
