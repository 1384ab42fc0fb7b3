use crate::error::GatewayError;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc};

/// 存储格式：固定微秒精度的 RFC3339（UTC, `Z`），字符串比较即时间比较
pub fn to_storage_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// 解析 ISO-8601 时间字符串为 UTC：
/// - RFC3339（带时区偏移或 `Z`）
/// - 日期与时间之间允许空格；偏移可写作 `+HH` / `+HHMM`
/// - 无时区的时间按 UTC 解释
/// - 仅日期 `YYYY-MM-DD` 视为当日 00:00 UTC
pub fn parse_datetime_string(s: &str) -> crate::error::Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // "YYYY-MM-DD HH:..." → "YYYY-MM-DDTHH:..."
    let normalized = match s.as_bytes().get(10) {
        Some(b' ') => format!("{}T{}", &s[..10], &s[11..]),
        _ => s.to_string(),
    };

    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M%:z",
        "%Y-%m-%dT%H:%M%z",
    ] {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    // Postgres 风格的 "+00" 短偏移
    if let Some(padded) = pad_short_offset(&normalized) {
        if let Ok(dt) = DateTime::parse_from_str(&padded, "%Y-%m-%dT%H:%M:%S%.f%:z") {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    let date = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .map_err(|e| GatewayError::TimeParse(format!("{}: {}", s, e)))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| GatewayError::TimeParse(format!("{}: invalid date", s)))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

/// Query-string flavour: empty or unparseable input means "no bound".
pub fn parse_optional_bound(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match parse_datetime_string(raw) {
        Ok(dt) => Some(dt),
        Err(e) => {
            tracing::debug!("ignoring date filter: {}", e);
            None
        }
    }
}

/// 下界向上取整到存储精度（微秒），避免亚微秒部分被截断后放入更早的行
pub fn ceil_to_storage_precision(dt: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = dt.trunc_subsecs(6);
    if truncated < dt {
        truncated + Duration::microseconds(1)
    } else {
        truncated
    }
}

fn pad_short_offset(raw: &str) -> Option<String> {
    // 只处理时间部分的偏移，避免把日期里的 '-' 当成偏移
    let time_start = raw.find('T')?;
    let pos = raw[time_start..].rfind(['+', '-'])? + time_start;
    let (prefix, offset) = raw.split_at(pos);
    (offset.len() == 3).then(|| format!("{prefix}{offset}:00"))
}
