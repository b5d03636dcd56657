pub mod content_api;

use crate::error::DocrevError;
use serde_json::Value;

/// Remote classification/extraction collaborator.
///
/// A profile id addresses either a classifier or a field-extraction schema
/// on the service side; the core treats both uniformly. Calls block until
/// the service produces a result or fails; the core never retries. Retry
/// policy belongs to the caller.
pub trait DocumentAnalyzer: Send + Sync {
    /// Submit document bytes against a profile and return the raw result
    /// payload.
    fn analyze(&self, profile_id: &str, document: &[u8]) -> Result<Value, DocrevError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
