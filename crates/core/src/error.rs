use crate::types::JobId;

/// Errors raised before any request reaches the video service.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A job id that the session has no cached record for.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: JobId },

    /// Bad user input: empty prompt, out-of-range duration, malformed size.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The session already has a request in flight.
    #[error("Conflict: {0}")]
    Conflict(String),
}
