use std::fmt;

/// Broad category of a remote analysis failure, derived from the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFailureKind {
    /// The profile id is not known to the service.
    UnknownProfile,
    /// Authentication or authorization was rejected.
    Auth,
    /// The service rejected the submitted document.
    MalformedInput,
    /// Transport error, 5xx, or the operation reported failure.
    Service,
}

impl fmt::Display for RemoteFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteFailureKind::UnknownProfile => write!(f, "unknown profile"),
            RemoteFailureKind::Auth => write!(f, "auth"),
            RemoteFailureKind::MalformedInput => write!(f, "malformed input"),
            RemoteFailureKind::Service => write!(f, "service"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocrevError {
    #[error("analysis result is not a JSON object")]
    MalformedResult,

    #[error("classifier output contained no usable document label")]
    NoLabelFound,

    #[error("no extraction profile is mapped for document label '{label}'")]
    UnroutableDocument { label: String },

    #[error("remote call failed ({kind}) for profile '{profile_id}': {message}")]
    RemoteCall {
        kind: RemoteFailureKind,
        profile_id: String,
        message: String,
    },

    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("pdftoppm not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftoppmNotFound,

    #[error("pdftoppm failed with exit code {code}: {stderr}")]
    PdftoppmFailed { code: i32, stderr: String },

    #[error("document is {size_mb:.1} MB, above the {limit_mb} MB limit")]
    DocumentTooLarge { size_mb: f64, limit_mb: u64 },

    #[error("missing required environment variable {0}")]
    MissingConfig(&'static str),

    #[error("field path '{path}' does not address a field")]
    BadFieldPath { path: String },

    #[error("edit at '{path}' would change the value kind")]
    KindMismatch { path: String },

    #[error("invalid session state: expected {expected}, was {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
