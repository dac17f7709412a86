//! Status normalizer: raw job payloads into canonical [`JobRecord`]s.
//!
//! Every lookup here is total. A missing or oddly-typed field degrades
//! to an empty string, `None`, or zero; it never produces an error.

use std::num::IntErrorKind;

use serde_json::Value;
use vidgen_core::job_status::JobStatus;
use vidgen_core::types::{JobId, UnixSeconds};

use crate::payload::{JobFields, RawJobPayload};

/// Canonical view of a remote video job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    /// `None` when no id could be derived from the payload.
    pub id: Option<JobId>,
    pub status: JobStatus,
    /// Always within `0..=100`.
    pub progress: u8,
    pub size: String,
    pub seconds: String,
    pub model: String,
    pub prompt: Option<String>,
    pub created_at: Option<UnixSeconds>,
    pub updated_at: Option<UnixSeconds>,
    pub asset_url: Option<String>,
    /// The canonical field map the record was built from.
    pub raw: JobFields,
}

impl JobRecord {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Raw payload as a JSON value, for diagnostics and metadata export.
    pub fn raw_json(&self) -> Value {
        Value::Object(self.raw.clone())
    }

    /// Pretty-printed raw payload.
    pub fn metadata_json(&self) -> String {
        serde_json::to_string_pretty(&self.raw).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Normalize any payload shape into a [`JobRecord`].
pub fn normalize(payload: impl Into<RawJobPayload>) -> JobRecord {
    normalize_fields(payload.into().into_fields())
}

/// Normalize an already-canonical field map.
pub fn normalize_fields(fields: JobFields) -> JobRecord {
    let status = JobStatus::parse(fields.get("status").and_then(Value::as_str).unwrap_or(""));
    let progress = normalize_progress(&fields, &status);

    JobRecord {
        id: extract_id(&fields),
        progress,
        size: text_field(&fields, &["size", "resolution"]),
        seconds: text_field(&fields, &["seconds", "duration"]),
        model: text_field(&fields, &["model"]),
        prompt: fields
            .get("prompt")
            .and_then(Value::as_str)
            .map(str::to_string),
        created_at: unix_field(&fields, &["created_at", "created"]),
        updated_at: unix_field(&fields, &["updated_at"]),
        asset_url: extract_asset_url(&fields),
        status,
        raw: fields,
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Resolve job progress to a percentage in `[0, 100]`.
///
/// Order: `progress`, then `percent_complete`, then a status-based
/// fallback (100 for success, 0 for everything else).
pub fn normalize_progress(fields: &JobFields, status: &JobStatus) -> u8 {
    ["progress", "percent_complete"]
        .iter()
        .find_map(|key| fields.get(*key).and_then(percent_from_value))
        .unwrap_or(if status.is_success() { 100 } else { 0 })
}

/// Interpret a number or integer string as a clamped percentage.
/// Floats truncate toward zero; integer strings beyond `i64` still clamp.
fn percent_from_value(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n
            .as_i64()
            .map(|i| i as f64)
            .or_else(|| n.as_u64().map(|u| u as f64))
            .or_else(|| n.as_f64())?
            .trunc(),
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(i) => i as f64,
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => return Some(100),
                IntErrorKind::NegOverflow => return Some(0),
                _ => return None,
            },
        },
        _ => return None,
    };
    Some(raw.clamp(0.0, 100.0) as u8)
}

// ---------------------------------------------------------------------------
// Asset URL
// ---------------------------------------------------------------------------

/// Find a downloadable media URL in the payload.
///
/// Tries `assets[0].url`, `output[0].url`, `download_url`, then
/// `assets.video.url`; the first string starting with `http` wins.
pub fn extract_asset_url(fields: &JobFields) -> Option<String> {
    let candidates = [
        fields.get("assets").and_then(|a| a.get(0)).and_then(|a| a.get("url")),
        fields.get("output").and_then(|o| o.get(0)).and_then(|o| o.get("url")),
        fields.get("download_url"),
        fields
            .get("assets")
            .and_then(|a| a.get("video"))
            .and_then(|v| v.get("url")),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|url| url.starts_with("http"))
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// String or integer `id`; empty strings count as absent.
fn extract_id(fields: &JobFields) -> Option<JobId> {
    match fields.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// First non-empty string or number among `keys`, rendered as text.
fn text_field(fields: &JobFields, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| match fields.get(*key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

/// First timestamp among `keys`, as integer seconds.
fn unix_field(fields: &JobFields, keys: &[&str]) -> Option<UnixSeconds> {
    keys.iter().find_map(|key| match fields.get(*key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
