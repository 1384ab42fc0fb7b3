use chrono::{DateTime, Utc};

// 成功路径上写入的唯一状态；失败的调用不会落库
pub const STATUS_OK: &str = "ok";

#[derive(Debug, Clone, PartialEq)]
pub struct RequestLog {
    pub id: i64,
    pub provider: String,
    pub model: String,
    pub prompt: String,
    pub output: Option<String>,
    pub latency_ms: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A row before storage assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewRequestLog {
    pub provider: String,
    pub model: String,
    pub prompt: String,
    pub output: String,
    pub latency_ms: f64,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogFilter {
    pub model: Option<String>,
    pub provider: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Time(DateTime<Utc>),
}

impl LogFilter {
    /// Builds ` WHERE a AND b ...` (or an empty string) with positional
    /// placeholders produced by `placeholder(n)`, n starting at 1.
    pub fn where_clause<F>(&self, placeholder: F) -> (String, Vec<FilterValue>)
    where
        F: Fn(usize) -> String,
    {
        let mut conditions = Vec::new();
        let mut values = Vec::new();

        let mut push = |column_op: &str, value: FilterValue| {
            values.push(value);
            conditions.push(format!("{} {}", column_op, placeholder(values.len())));
        };

        if let Some(model) = &self.model {
            push("model =", FilterValue::Text(model.clone()));
        }
        if let Some(provider) = &self.provider {
            push("provider =", FilterValue::Text(provider.clone()));
        }
        if let Some(from) = self.date_from {
            push("created_at >=", FilterValue::Time(from));
        }
        if let Some(to) = self.date_to {
            push("created_at <=", FilterValue::Time(to));
        }

        if conditions.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", conditions.join(" AND ")), values)
        }
    }
}
