//! Video creation request: presets, defaults, and local validation.
//!
//! Everything here runs before a request leaves the process, so a bad
//! prompt or duration never costs a network round trip.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// Size presets offered to users as `(label, WIDTHxHEIGHT)`.
pub const SIZE_PRESETS: &[(&str, &str)] = &[
    ("Landscape · 16:9 (1280x720)", "1280x720"),
    ("Portrait · 9:16 (720x1280)", "720x1280"),
    ("Square · 1:1 (1024x1024)", "1024x1024"),
    ("Vertical HD · 9:16 (1080x1920)", "1080x1920"),
    ("Wide HD · 16:9 (1920x1080)", "1920x1080"),
];

/// Size used when a preset label is not recognised.
pub const DEFAULT_SIZE: &str = "1280x720";

/// Generation models offered to users.
pub const MODELS: &[&str] = &["sora-2", "sora-2-pro"];

pub const DEFAULT_MODEL: &str = "sora-2";

/// Shortest clip the service accepts, in seconds.
pub const MIN_DURATION_SECS: u32 = 2;
/// Longest clip the service accepts, in seconds.
pub const MAX_DURATION_SECS: u32 = 25;
pub const DEFAULT_DURATION_SECS: u32 = 12;

/// Image extensions accepted as an input reference.
pub const REFERENCE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Resolve a preset label to its `WIDTHxHEIGHT` value, falling back to
/// [`DEFAULT_SIZE`].
pub fn size_for_label(label: &str) -> &'static str {
    SIZE_PRESETS
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, size)| *size)
        .unwrap_or(DEFAULT_SIZE)
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// An optional image the render should start from.
#[derive(Debug, Clone)]
pub struct InputReference {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl InputReference {
    /// MIME type derived from the file extension.
    pub fn mime_type(&self) -> &'static str {
        match extension(&self.file_name).as_deref() {
            Some("png") => "image/png",
            _ => "image/jpeg",
        }
    }
}

/// Parameters for a new render job.
#[derive(Debug, Clone)]
pub struct CreateVideoRequest {
    pub prompt: String,
    pub model: String,
    pub seconds: u32,
    /// `WIDTHxHEIGHT`, e.g. `1280x720`.
    pub size: String,
    pub input_reference: Option<InputReference>,
}

impl CreateVideoRequest {
    /// A request with the default model, size, and duration.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: DEFAULT_MODEL.to_string(),
            seconds: DEFAULT_DURATION_SECS,
            size: DEFAULT_SIZE.to_string(),
            input_reference: None,
        }
    }

    /// Run every local check. The prompt is validated in its trimmed form,
    /// which is also what gets sent.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_prompt(&self.prompt)?;
        validate_model(&self.model)?;
        validate_duration(self.seconds)?;
        validate_size(&self.size)?;
        if let Some(reference) = &self.input_reference {
            validate_reference_name(&reference.file_name)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

/// An API key must be configured before any request is attempted.
pub fn validate_api_key(api_key: &str) -> Result<(), CoreError> {
    if api_key.trim().is_empty() {
        return Err(CoreError::Validation(
            "API key is missing. Set OPENAI_API_KEY before generating".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_prompt(prompt: &str) -> Result<(), CoreError> {
    if prompt.trim().is_empty() {
        return Err(CoreError::Validation("Prompt cannot be empty".to_string()));
    }
    Ok(())
}

pub fn validate_model(model: &str) -> Result<(), CoreError> {
    if model.trim().is_empty() {
        return Err(CoreError::Validation(format!(
            "Model must not be empty. Known models: {}",
            MODELS.join(", ")
        )));
    }
    Ok(())
}

/// Duration must fall within [`MIN_DURATION_SECS`]..=[`MAX_DURATION_SECS`].
pub fn validate_duration(seconds: u32) -> Result<(), CoreError> {
    if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&seconds) {
        return Err(CoreError::Validation(format!(
            "Duration must be between {MIN_DURATION_SECS} and {MAX_DURATION_SECS} seconds, got {seconds}"
        )));
    }
    Ok(())
}

/// Size must be `WIDTHxHEIGHT` with positive integer dimensions.
pub fn validate_size(size: &str) -> Result<(), CoreError> {
    parse_size(size).map(|_| ()).ok_or_else(|| {
        CoreError::Validation(format!(
            "Size must look like WIDTHxHEIGHT (e.g. {DEFAULT_SIZE}), got: '{size}'"
        ))
    })
}

/// Parse `WIDTHxHEIGHT` into its dimensions.
pub fn parse_size(size: &str) -> Option<(u32, u32)> {
    let (w, h) = size.trim().split_once('x')?;
    let w: u32 = w.parse().ok()?;
    let h: u32 = h.parse().ok()?;
    (w > 0 && h > 0).then_some((w, h))
}

pub fn validate_reference_name(file_name: &str) -> Result<(), CoreError> {
    match extension(file_name) {
        Some(ext) if REFERENCE_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(CoreError::Validation(format!(
            "Reference image must be one of: {}. Got: '{file_name}'",
            REFERENCE_EXTENSIONS.join(", ")
        ))),
    }
}

fn extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}
