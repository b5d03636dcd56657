use crate::error::DocrevError;
use crate::model::ExtractionResult;
use crate::render::RenderedPage;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Stable identity for document bytes: SHA-256, lowercase hex.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Render zoom as a hashable fixed-point value (hundredths of the factor),
/// so it can participate in exact cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Zoom(u32);

impl Zoom {
    pub fn from_factor(factor: f64) -> Zoom {
        Zoom((factor * 100.0).round() as u32)
    }

    pub fn factor(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Zoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}x", self.factor())
    }
}

/// Cache key for a remote analysis call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisKey {
    pub fingerprint: String,
    pub profile_id: String,
}

/// Cache key for a rendered page image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderKey {
    pub page: u32,
    pub zoom: Zoom,
}

/// Session-scoped cache for analysis results and rendered pages.
///
/// Keys are exact; there is no expiry. Entries are only ever replaced
/// wholesale. Loading a new document clears everything; a zoom change only
/// concerns rendered images. Single active session, no interior locking.
#[derive(Default)]
pub struct SessionCache {
    analyses: HashMap<AnalysisKey, Arc<ExtractionResult>>,
    renders: HashMap<RenderKey, Arc<RenderedPage>>,
}

impl SessionCache {
    pub fn new() -> SessionCache {
        SessionCache::default()
    }

    /// Cached analysis for `key`, or compute it exactly once and store it.
    pub fn get_or_analyze(
        &mut self,
        key: AnalysisKey,
        compute: impl FnOnce() -> Result<ExtractionResult, DocrevError>,
    ) -> Result<Arc<ExtractionResult>, DocrevError> {
        if let Some(hit) = self.analyses.get(&key) {
            debug!(profile_id = %key.profile_id, "analysis cache hit");
            return Ok(Arc::clone(hit));
        }
        debug!(profile_id = %key.profile_id, "analysis cache miss");
        let value = Arc::new(compute()?);
        self.analyses.insert(key, Arc::clone(&value));
        Ok(value)
    }

    /// Cached render for `key`, or compute it exactly once and store it.
    pub fn get_or_render(
        &mut self,
        key: RenderKey,
        compute: impl FnOnce() -> Result<RenderedPage, DocrevError>,
    ) -> Result<Arc<RenderedPage>, DocrevError> {
        if let Some(hit) = self.renders.get(&key) {
            debug!(page = key.page, zoom = %key.zoom, "render cache hit");
            return Ok(Arc::clone(hit));
        }
        debug!(page = key.page, zoom = %key.zoom, "render cache miss");
        let value = Arc::new(compute()?);
        self.renders.insert(key, Arc::clone(&value));
        Ok(value)
    }

    /// Wholesale invalidation on document change.
    pub fn clear(&mut self) {
        self.analyses.clear();
        self.renders.clear();
    }

    /// Invalidate rendered images only; analysis results survive a zoom
    /// change.
    pub fn clear_renders(&mut self) {
        self.renders.clear();
    }

    pub fn analysis_entries(&self) -> usize {
        self.analyses.len()
    }

    pub fn render_entries(&self) -> usize {
        self.renders.len()
    }
}
