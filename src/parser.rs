use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

/// Placeholder message for structured entries that carry no `msg`/`message`.
pub const NO_MESSAGE: &str = "No message";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    NoLevel,
}

impl LogLevel {
    pub fn is_error(self) -> bool {
        matches!(self, LogLevel::Error)
    }

    /// Map a Pino-style severity to a level. Numeric thresholds: >=50 error,
    /// >=40 warn, >=20 debug, else info. String severities are matched
    /// case-insensitively; FATAL folds into error, WARNING into warn, TRACE
    /// into debug. Anything else (including a missing field) is info.
    pub fn from_severity(severity: Option<&Value>) -> LogLevel {
        match severity {
            Some(Value::Number(n)) => {
                let n = n.as_f64().unwrap_or(0.0);
                if n >= 50.0 {
                    LogLevel::Error
                } else if n >= 40.0 {
                    LogLevel::Warn
                } else if n >= 20.0 {
                    LogLevel::Debug
                } else {
                    LogLevel::Info
                }
            }
            Some(Value::String(s)) => match s.to_ascii_uppercase().as_str() {
                "ERROR" | "FATAL" => LogLevel::Error,
                "WARN" | "WARNING" => LogLevel::Warn,
                "DEBUG" | "TRACE" => LogLevel::Debug,
                "NO_LEVEL" => LogLevel::NoLevel,
                _ => LogLevel::Info,
            },
            _ => LogLevel::Info,
        }
    }
}

/// One parsed log line or block. Immutable once created; `id` is unique and
/// strictly increasing in source order.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: usize,
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub data: Value,
    pub raw: String,
    pub is_json: bool,
}

/// Parse raw log text into entries using the default resynchronization rule:
/// a broken (non-JSON) block ends at the next line whose trimmed form starts
/// with `{`. A legitimate non-JSON line starting with `{` will end the block
/// early; callers with different framing can supply their own predicate via
/// [`parse_with_boundary`].
pub fn parse(text: &str) -> Vec<LogEntry> {
    parse_with_boundary(text, |line| line.trim_start().starts_with('{'))
}

/// Parse with a caller-supplied boundary predicate. `is_entry_start` receives
/// each candidate line while a broken block is being accumulated; returning
/// true closes the block and resumes normal per-line parsing at that line.
pub fn parse_with_boundary<F>(text: &str, is_entry_start: F) -> Vec<LogEntry>
where
    F: Fn(&str) -> bool,
{
    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<LogEntry> = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let raw = lines[i];
        if raw.trim().is_empty() {
            i += 1;
            continue;
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(data) => {
                out.push(json_entry(out.len(), raw, data));
                i += 1;
            }
            Err(_) => {
                // Broken block: stack trace or malformed line. Accumulate
                // verbatim until the boundary predicate signals a new entry.
                let mut block = raw.to_string();
                let mut j = i + 1;
                while j < lines.len() && !is_entry_start(lines[j]) {
                    block.push('\n');
                    block.push_str(lines[j]);
                    j += 1;
                }
                out.push(text_entry(out.len(), block));
                i = j;
            }
        }
    }
    out
}

fn json_entry(id: usize, raw: &str, data: Value) -> LogEntry {
    let level = LogLevel::from_severity(data.get("level"));
    let timestamp = ["time", "timestamp", "ts"]
        .iter()
        .filter_map(|k| data.get(*k))
        .find(|v| !v.is_null())
        .and_then(timestamp_from_value)
        .unwrap_or_else(Utc::now);
    let message = ["msg", "message"]
        .iter()
        .filter_map(|k| data.get(*k))
        .find(|v| !v.is_null())
        .map(stringify)
        .unwrap_or_else(|| NO_MESSAGE.to_string());
    LogEntry {
        id,
        level,
        timestamp,
        message,
        data,
        raw: raw.to_string(),
        is_json: true,
    }
}

fn text_entry(id: usize, raw: String) -> LogEntry {
    LogEntry {
        id,
        level: LogLevel::Info,
        timestamp: Utc::now(),
        message: raw.clone(),
        data: serde_json::json!({ "message": raw }),
        raw,
        is_json: false,
    }
}

fn stringify(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn timestamp_from_value(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        // Pino emits epoch milliseconds
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        Value::String(s) => parse_ts_candidate(s),
        _ => None,
    }
}

fn parse_ts_candidate(s: &str) -> Option<DateTime<Utc>> {
    parse_ts_string(s).or_else(|| parse_ts_digits(s))
}

fn parse_ts_string(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let fmts = [
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ];
    for f in fmts.iter() {
        if let Ok(dt) = DateTime::parse_from_str(s, f) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, f) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    None
}

fn parse_ts_digits(s: &str) -> Option<DateTime<Utc>> {
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match s.len() {
        10 => s.parse::<i64>().ok().and_then(|v| DateTime::from_timestamp(v, 0)),
        13 => s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis),
        16 => s.parse::<i64>().ok().and_then(DateTime::from_timestamp_micros),
        _ => None,
    }
}
