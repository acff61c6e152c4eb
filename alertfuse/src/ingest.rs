// alertfuse/src/ingest.rs
//
// Alert normalizer — JSON / JSONL / CSV exports from IDS, EDR and SIEM tools
// into canonical `Alert` records.
//
// Field aliases (first non-null, non-empty value wins):
//   timestamp   timestamp | time | event_time | @timestamp   (required)
//   source_ip   src_ip | source_ip | ip
//   dest_ip     dest_ip | dst_ip | destination_ip
//   user        user | username | account
//   host        host | hostname | computer
//   alert_type  alert_type | type | name | signature         (default "unknown")
//   technique   mitre_technique | mitre | technique
//
// Timestamps: RFC 3339, naive ISO-8601 (taken as UTC), or epoch seconds.
// Any bad record aborts the whole batch; nothing is partially applied.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::events::Alert;

const TIMESTAMP_FIELDS:  &[&str] = &["timestamp", "time", "event_time", "@timestamp"];
const SOURCE_IP_FIELDS:  &[&str] = &["src_ip", "source_ip", "ip"];
const DEST_IP_FIELDS:    &[&str] = &["dest_ip", "dst_ip", "destination_ip"];
const USER_FIELDS:       &[&str] = &["user", "username", "account"];
const HOST_FIELDS:       &[&str] = &["host", "hostname", "computer"];
const ALERT_TYPE_FIELDS: &[&str] = &["alert_type", "type", "name", "signature"];
const MITRE_FIELDS:      &[&str] = &["mitre_technique", "mitre", "technique"];

const UNKNOWN_ALERT_TYPE: &str = "unknown";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file type '{0}' (expected .json, .jsonl or .csv)")]
    UnsupportedFormat(String),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid JSON on line {line}: {source}")]
    JsonLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("JSON payload must be a list of alerts")]
    NotAList,
    #[error("alert #{index} must be an object")]
    NotAnObject { index: usize },
    #[error("alert #{index} is missing a timestamp")]
    MissingTimestamp { index: usize },
    #[error("alert #{index} has an unparseable timestamp: {value}")]
    InvalidTimestamp { index: usize, value: String },
    #[error("malformed CSV: {0}")]
    Csv(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;

// ── Record normalization ──────────────────────────────────────────────────────

fn first_present<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text_field(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_present(record, keys).map(as_text)
}

/// Parse one timestamp value into UTC. `None` when the value is not a
/// recognizable instant.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                DateTime::from_timestamp(secs, 0)
            } else {
                n.as_f64().and_then(from_epoch_f64)
            }
        }
        Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }
}

fn from_epoch_f64(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}

fn parse_timestamp_str(raw: &str) -> Option<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
    }
    // CSV carries epoch values as text
    if let Ok(secs) = text.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    text.parse::<f64>().ok().and_then(from_epoch_f64)
}

/// Normalize one raw record. `index` is only used for error messages.
pub fn normalize_record(index: usize, record: Map<String, Value>) -> Result<Alert> {
    let ts_value = first_present(&record, TIMESTAMP_FIELDS)
        .ok_or(IngestError::MissingTimestamp { index })?;
    let timestamp = parse_timestamp(ts_value).ok_or_else(|| IngestError::InvalidTimestamp {
        index,
        value: as_text(ts_value),
    })?;

    Ok(Alert {
        timestamp,
        source_ip:       text_field(&record, SOURCE_IP_FIELDS),
        dest_ip:         text_field(&record, DEST_IP_FIELDS),
        user:            text_field(&record, USER_FIELDS),
        host:            text_field(&record, HOST_FIELDS),
        alert_type:      text_field(&record, ALERT_TYPE_FIELDS)
                             .unwrap_or_else(|| UNKNOWN_ALERT_TYPE.to_string()),
        mitre_technique: text_field(&record, MITRE_FIELDS),
        raw:             record,
    })
}

fn normalize_values(values: Vec<Value>) -> Result<Vec<Alert>> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(record) => normalize_record(index, record),
            _ => Err(IngestError::NotAnObject { index }),
        })
        .collect()
}

// ── Formats ───────────────────────────────────────────────────────────────────

/// A JSON array of alert objects, or an object wrapping one under `alerts`.
pub fn alerts_from_json(content: &str) -> Result<Vec<Alert>> {
    let payload: Value = serde_json::from_str(content)?;
    let records = match payload {
        Value::Object(mut wrapper) if wrapper.contains_key("alerts") => {
            wrapper.remove("alerts").unwrap_or(Value::Null)
        }
        other => other,
    };
    match records {
        Value::Array(values) => normalize_values(values),
        _ => Err(IngestError::NotAList),
    }
}

/// One alert object per line; blank lines are skipped.
pub fn alerts_from_jsonl(content: &str) -> Result<Vec<Alert>> {
    let mut values = Vec::new();
    for (n, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .map_err(|source| IngestError::JsonLine { line: n + 1, source })?;
        values.push(value);
    }
    normalize_values(values)
}

/// Header row + data rows. Cells become string fields of the raw record;
/// short rows leave trailing fields absent, extra cells are dropped.
pub fn alerts_from_csv(content: &str) -> Result<Vec<Alert>> {
    let mut rows = split_csv(content)?.into_iter();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<String> = header.into_iter().map(|h| h.trim().to_string()).collect();

    rows.enumerate()
        .map(|(index, row)| {
            let record: Map<String, Value> = header
                .iter()
                .zip(row)
                .map(|(k, v)| (k.clone(), Value::String(v)))
                .collect();
            normalize_record(index, record)
        })
        .collect()
}

/// Minimal RFC 4180 reader: quoted fields may hold commas, newlines and `""`.
fn split_csv(content: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    let mut finish_row = |row: &mut Vec<String>, field: &mut String| {
        row.push(std::mem::take(field));
        let done = std::mem::take(row);
        // blank line → single empty cell
        if !(done.len() == 1 && done[0].is_empty()) {
            rows.push(done);
        }
    };

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', true) => in_quotes = false,
            ('"', false) if field.is_empty() => in_quotes = true,
            (',', false) => row.push(std::mem::take(&mut field)),
            ('\r', false) => {}
            ('\n', false) => finish_row(&mut row, &mut field),
            (c, _) => field.push(c),
        }
    }
    if in_quotes {
        return Err(IngestError::Csv("unterminated quoted field".into()));
    }
    if !field.is_empty() || !row.is_empty() {
        finish_row(&mut row, &mut field);
    }
    Ok(rows)
}

// ── Files ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    JsonLines,
    Csv,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "jsonl" => Ok(Self::JsonLines),
            "csv" => Ok(Self::Csv),
            _ => Err(IngestError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

pub fn parse_alerts(content: &str, format: InputFormat) -> Result<Vec<Alert>> {
    match format {
        InputFormat::Json => alerts_from_json(content),
        InputFormat::JsonLines => alerts_from_jsonl(content),
        InputFormat::Csv => alerts_from_csv(content),
    }
}

/// Read and normalize every alert in `path`; the format follows the extension.
pub async fn load_alerts(path: &Path) -> Result<Vec<Alert>> {
    let format = InputFormat::from_path(path)?;
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| IngestError::Io { path: path.to_path_buf(), source })?;

    debug!(path = %path.display(), ?format, bytes = content.len(), "parsing alert file");
    let alerts = parse_alerts(&content, format)?;
    info!("Loaded {} alerts from {}", alerts.len(), path.display());
    Ok(alerts)
}
