//! Raw job payload shapes accepted by the normalizer.
//!
//! The video service (and code that talks to it) hands back jobs in
//! several shapes: a JSON object, a typed [`VideoObject`], or just a job
//! id. [`RawJobPayload`] names each shape explicitly, and
//! [`RawJobPayload::into_fields`] turns any of them into one canonical
//! key/value map for the normalizer to read.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Canonical key/value view of a job payload.
pub type JobFields = Map<String, Value>;

/// A job payload in whatever shape it arrived.
#[derive(Debug, Clone)]
pub enum RawJobPayload {
    /// An untyped JSON object.
    Mapping(JobFields),
    /// A typed video object as documented by the service.
    Object(VideoObject),
    /// A bare job id.
    Scalar(String),
    /// Nothing usable at all.
    Empty,
}

/// Video job object as returned by `POST /videos`.
///
/// Fields whose wire type varies between service versions are kept as
/// [`Value`]; anything undocumented lands in `extra`. Known fields sent
/// as `null` are listed in `null_fields` so they survive flattening.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoObject {
    pub id: Option<String>,
    pub object: Option<String>,
    pub status: Option<String>,
    pub model: Option<String>,
    pub prompt: Option<String>,
    pub progress: Option<Value>,
    pub seconds: Option<Value>,
    pub size: Option<String>,
    pub created_at: Option<Value>,
    pub completed_at: Option<Value>,
    pub expires_at: Option<Value>,
    pub error: Option<Value>,
    #[serde(flatten)]
    pub extra: JobFields,
    #[serde(skip)]
    pub null_fields: Vec<String>,
}

impl RawJobPayload {
    /// Prefer the typed [`VideoObject`] shape, falling back to the raw
    /// mapping when the value does not fit it.
    pub fn typed_or_mapping(value: Value) -> Self {
        if value.is_object() {
            if let Ok(mut object) = VideoObject::deserialize(&value) {
                object.null_fields = null_keys(&value);
                return Self::Object(object);
            }
        }
        Self::from(value)
    }

    /// Flatten any payload shape into [`JobFields`].
    pub fn into_fields(self) -> JobFields {
        match self {
            Self::Mapping(fields) => fields,
            Self::Object(object) => object.into_fields(),
            Self::Scalar(id) => {
                let mut fields = JobFields::new();
                fields.insert("id".into(), Value::String(id));
                fields
            }
            Self::Empty => JobFields::new(),
        }
    }
}

impl VideoObject {
    fn into_fields(self) -> JobFields {
        let mut fields = self.extra;
        let text = [
            ("id", self.id),
            ("object", self.object),
            ("status", self.status),
            ("model", self.model),
            ("prompt", self.prompt),
            ("size", self.size),
        ];
        for (key, value) in text {
            if let Some(v) = value {
                fields.insert(key.into(), Value::String(v));
            }
        }
        let loose = [
            ("progress", self.progress),
            ("seconds", self.seconds),
            ("created_at", self.created_at),
            ("completed_at", self.completed_at),
            ("expires_at", self.expires_at),
            ("error", self.error),
        ];
        for (key, value) in loose {
            if let Some(v) = value {
                fields.insert(key.into(), v);
            }
        }
        for key in self.null_fields {
            fields.entry(key).or_insert(Value::Null);
        }
        fields
    }
}

fn null_keys(value: &Value) -> Vec<String> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter(|(_, v)| v.is_null())
                .map(|(k, _)| k.clone())
                .collect()
        })
        .unwrap_or_default()
}

impl From<Value> for RawJobPayload {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Object(fields) => Self::Mapping(fields),
            Value::String(id) => Self::Scalar(id),
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Scalar(n.to_string()),
            other => {
                let mut fields = JobFields::new();
                fields.insert("value".into(), other);
                Self::Mapping(fields)
            }
        }
    }
}

impl From<JobFields> for RawJobPayload {
    fn from(fields: JobFields) -> Self {
        Self::Mapping(fields)
    }
}

impl From<VideoObject> for RawJobPayload {
    fn from(object: VideoObject) -> Self {
        Self::Object(object)
    }
}

impl From<&str> for RawJobPayload {
    fn from(id: &str) -> Self {
        Self::Scalar(id.to_string())
    }
}

impl From<String> for RawJobPayload {
    fn from(id: String) -> Self {
        Self::Scalar(id)
    }
}

impl From<i64> for RawJobPayload {
    fn from(id: i64) -> Self {
        Self::Scalar(id.to_string())
    }
}
