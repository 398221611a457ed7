//! Job-level error taxonomy.
//!
//! Every failure a job can hit maps onto one of these variants. The
//! handler boundary converts them into the uniform result payload; no
//! error is ever raised past it.

/// Errors produced while processing a single generation job.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// A numeric or image field in the request was present but malformed.
    #[error("Invalid parameter '{field}': {reason}")]
    InvalidParameter {
        /// Request key the value was supplied under.
        field: &'static str,
        reason: String,
    },

    /// An image field did not contain valid base64.
    #[error("Failed to decode base64 image '{field}': {source}")]
    Decode {
        field: &'static str,
        source: base64::DecodeError,
    },

    /// The workflow template is missing a path the binding table expects.
    #[error("Workflow template does not match expected schema: missing {path}")]
    SchemaMismatch { path: String },

    /// The generation engine stayed unreachable through the liveness ceiling.
    #[error("Generation engine unreachable after {attempts} liveness attempts")]
    EngineUnavailable { attempts: u32 },

    /// The engine rejected the workflow submission.
    #[error("Engine rejected workflow ({status}): {body}")]
    Submission { status: u16, body: String },

    /// The engine never reported the prompt id within the poll ceiling.
    #[error("Generation did not finish within {attempts} poll attempts")]
    Timeout { attempts: u32 },

    /// Filesystem failure (job directory, image files, template read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The workflow template was not parseable JSON.
    #[error("Workflow template is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for failures outside the named taxonomy.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}
