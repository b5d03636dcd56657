use crate::cache::{fingerprint, AnalysisKey, RenderKey, SessionCache, Zoom};
use crate::edit::{self, FieldPath};
use crate::error::DocrevError;
use crate::export::{export_rows, ExportRow};
use crate::model::{CanonicalField, DocumentLabel, ExtractionResult, ScalarValue};
use crate::normalize::{extract_label, normalize_result};
use crate::regions::field_regions;
use crate::remote::DocumentAnalyzer;
use crate::render::{overlay, PageRenderer, RenderedPage};
use image::RgbaImage;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_CLASSIFIER_PROFILE: &str = "classifier_idp";
pub const DEFAULT_MAX_DOCUMENT_MB: u64 = 20;

/// Static label → extraction-profile mapping.
///
/// An unmatched label is a first-class condition: the session surfaces
/// `UnroutableDocument` instead of guessing a profile, since extracting with
/// the wrong schema produces confidently wrong fields.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    routes: Vec<(String, String)>,
}

impl RoutingTable {
    pub fn new<L, P>(routes: impl IntoIterator<Item = (L, P)>) -> RoutingTable
    where
        L: Into<String>,
        P: Into<String>,
    {
        RoutingTable {
            routes: routes
                .into_iter()
                .map(|(label, profile)| (label.into(), profile.into()))
                .collect(),
        }
    }

    /// The reference configuration: three document types, one extraction
    /// profile each.
    pub fn reference() -> RoutingTable {
        RoutingTable::new([
            ("Invoices", "analyzer_invoices"),
            ("Bank Statements", "analyzer_bank_statements"),
            ("Loan Application Form", "analyzer_loan"),
        ])
    }

    pub fn resolve(&self, label: &str) -> Result<&str, DocrevError> {
        self.routes
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, profile)| profile.as_str())
            .ok_or_else(|| DocrevError::UnroutableDocument {
                label: label.to_string(),
            })
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes.iter().map(|(l, p)| (l.as_str(), p.as_str()))
    }
}

/// Session lifecycle. Remote calls only happen in Classifying and
/// Extracting; those are also the only states that touch the analysis
/// cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Idle,
    Classifying,
    Routing,
    Extracting,
    Reviewing,
    Exporting,
    Failed,
}

impl ReviewState {
    pub fn name(&self) -> &'static str {
        match self {
            ReviewState::Idle => "Idle",
            ReviewState::Classifying => "Classifying",
            ReviewState::Routing => "Routing",
            ReviewState::Extracting => "Extracting",
            ReviewState::Reviewing => "Reviewing",
            ReviewState::Exporting => "Exporting",
            ReviewState::Failed => "Failed",
        }
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub classifier_profile: String,
    pub max_document_mb: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            classifier_profile: DEFAULT_CLASSIFIER_PROFILE.to_string(),
            max_document_mb: DEFAULT_MAX_DOCUMENT_MB,
        }
    }
}

struct LoadedDocument {
    bytes: Vec<u8>,
    fingerprint: String,
}

/// Drives one document through classify → route → extract → review →
/// export, owning the session cache and the reviewer's edited field tree.
pub struct ReviewSession {
    analyzer: Box<dyn DocumentAnalyzer>,
    renderer: Box<dyn PageRenderer>,
    routes: RoutingTable,
    options: SessionOptions,
    cache: SessionCache,
    state: ReviewState,
    document: Option<LoadedDocument>,
    label: Option<DocumentLabel>,
    extraction_profile: Option<String>,
    result: Option<Arc<ExtractionResult>>,
    edited: Option<Vec<CanonicalField>>,
    last_zoom: Option<Zoom>,
}

impl ReviewSession {
    pub fn new(
        analyzer: Box<dyn DocumentAnalyzer>,
        renderer: Box<dyn PageRenderer>,
        routes: RoutingTable,
    ) -> ReviewSession {
        ReviewSession::with_options(analyzer, renderer, routes, SessionOptions::default())
    }

    pub fn with_options(
        analyzer: Box<dyn DocumentAnalyzer>,
        renderer: Box<dyn PageRenderer>,
        routes: RoutingTable,
        options: SessionOptions,
    ) -> ReviewSession {
        ReviewSession {
            analyzer,
            renderer,
            routes,
            options,
            cache: SessionCache::new(),
            state: ReviewState::Idle,
            document: None,
            label: None,
            extraction_profile: None,
            result: None,
            edited: None,
            last_zoom: None,
        }
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn label(&self) -> Option<&DocumentLabel> {
        self.label.as_ref()
    }

    pub fn extraction_profile(&self) -> Option<&str> {
        self.extraction_profile.as_deref()
    }

    pub fn result(&self) -> Option<&Arc<ExtractionResult>> {
        self.result.as_ref()
    }

    /// The reviewer-mutated field tree, present once extraction reached
    /// Reviewing.
    pub fn edited_fields(&self) -> Option<&[CanonicalField]> {
        self.edited.as_deref()
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    /// Load a new document, invalidating every cached result for the
    /// previous one.
    pub fn load_document(&mut self, bytes: Vec<u8>) -> Result<(), DocrevError> {
        let limit_mb = self.options.max_document_mb;
        let size_mb = bytes.len() as f64 / (1024.0 * 1024.0);
        if size_mb > limit_mb as f64 {
            return Err(DocrevError::DocumentTooLarge { size_mb, limit_mb });
        }

        let fingerprint = fingerprint(&bytes);
        info!(fingerprint = %fingerprint, size_mb, "document loaded");

        self.cache.clear();
        self.document = Some(LoadedDocument { bytes, fingerprint });
        self.label = None;
        self.extraction_profile = None;
        self.result = None;
        self.edited = None;
        self.last_zoom = None;
        self.state = ReviewState::Idle;
        Ok(())
    }

    /// Run the full pipeline for the loaded document.
    ///
    /// `NoLabelFound` and `UnroutableDocument` leave the session in Routing
    /// so the caller can pick a profile manually via
    /// [`extract_with_profile`](Self::extract_with_profile); remote failures
    /// move to Failed, terminal until a new document is loaded.
    pub fn run(&mut self) -> Result<(), DocrevError> {
        self.require_document()?;

        self.state = ReviewState::Classifying;
        let classifier_profile = self.options.classifier_profile.clone();
        let classification = self.analyze_cached(&classifier_profile)?;

        self.state = ReviewState::Routing;
        let label = match extract_label(&classification.raw) {
            Some(label) => label,
            None => {
                warn!("classifier produced no label, awaiting manual routing");
                return Err(DocrevError::NoLabelFound);
            }
        };
        info!(label = %label.label, confidence = ?label.confidence, "document classified");
        self.label = Some(label.clone());

        let profile = self.routes.resolve(&label.label)?.to_string();
        self.extract_with_profile(&profile)
    }

    /// Extract with an explicitly chosen profile: the manual-routing
    /// fallback when classification produced no usable or routable label.
    pub fn extract_with_profile(&mut self, profile_id: &str) -> Result<(), DocrevError> {
        self.require_document()?;

        self.state = ReviewState::Extracting;
        let result = self.analyze_cached(profile_id)?;
        info!(profile_id, fields = result.fields.len(), "extraction normalized");

        self.edited = Some(result.fields.clone());
        self.extraction_profile = Some(profile_id.to_string());
        self.result = Some(result);
        self.state = ReviewState::Reviewing;
        Ok(())
    }

    /// Rendered page image at a zoom level, cached. A zoom change drops
    /// previously rendered images; analysis results are untouched.
    pub fn rendered_page(
        &mut self,
        page: u32,
        zoom: f64,
    ) -> Result<Arc<RenderedPage>, DocrevError> {
        self.require_document()?;

        let zoom_key = Zoom::from_factor(zoom);
        if self.last_zoom.is_some_and(|z| z != zoom_key) {
            self.cache.clear_renders();
        }
        self.last_zoom = Some(zoom_key);

        let Some(doc) = self.document.as_ref() else {
            return Err(DocrevError::InvalidState {
                expected: "a loaded document",
                actual: self.state.name(),
            });
        };
        let renderer = self.renderer.as_ref();
        let bytes = &doc.bytes;
        self.cache.get_or_render(
            RenderKey {
                page,
                zoom: zoom_key,
            },
            || renderer.render_page(bytes, page, zoom),
        )
    }

    /// Render a page with a named top-level field's regions highlighted.
    pub fn highlight(
        &mut self,
        field_name: &str,
        page: u32,
        zoom: f64,
    ) -> Result<RgbaImage, DocrevError> {
        let result = self
            .result
            .as_ref()
            .ok_or(DocrevError::InvalidState {
                expected: "Reviewing",
                actual: self.state.name(),
            })?
            .clone();
        let field = result
            .field(field_name)
            .ok_or_else(|| DocrevError::BadFieldPath {
                path: field_name.to_string(),
            })?;

        let regions = field_regions(field, true);
        let source_size = result.page_dimensions(page);
        let rendered = self.rendered_page(page, zoom)?;
        Ok(overlay::highlight_regions(&rendered, &regions, source_size))
    }

    /// Replace a scalar's content in the edited tree. Kind-preserving.
    pub fn set_scalar(
        &mut self,
        path: &FieldPath,
        value: ScalarValue,
    ) -> Result<(), DocrevError> {
        edit::set_scalar(self.reviewing_fields_mut()?, path, value)
    }

    /// Append an element to an array field in the edited tree.
    pub fn push_item(
        &mut self,
        path: &FieldPath,
        item: CanonicalField,
    ) -> Result<(), DocrevError> {
        edit::push_item(self.reviewing_fields_mut()?, path, item)
    }

    /// Remove an array element from the edited tree.
    pub fn remove_item(
        &mut self,
        path: &FieldPath,
        index: usize,
    ) -> Result<CanonicalField, DocrevError> {
        edit::remove_item(self.reviewing_fields_mut()?, path, index)
    }

    /// Build export rows from the edited tree. The session passes through
    /// Exporting and returns to Reviewing.
    pub fn export(&mut self) -> Result<Vec<ExportRow>, DocrevError> {
        if self.state != ReviewState::Reviewing {
            return Err(DocrevError::InvalidState {
                expected: "Reviewing",
                actual: self.state.name(),
            });
        }
        self.state = ReviewState::Exporting;
        let rows = export_rows(self.edited.as_deref().unwrap_or(&[]));
        self.state = ReviewState::Reviewing;
        Ok(rows)
    }

    fn require_document(&self) -> Result<(), DocrevError> {
        if self.document.is_none() || self.state == ReviewState::Failed {
            return Err(DocrevError::InvalidState {
                expected: "a loaded document",
                actual: self.state.name(),
            });
        }
        Ok(())
    }

    fn reviewing_fields_mut(&mut self) -> Result<&mut [CanonicalField], DocrevError> {
        if self.state != ReviewState::Reviewing {
            return Err(DocrevError::InvalidState {
                expected: "Reviewing",
                actual: self.state.name(),
            });
        }
        Ok(self.edited.as_deref_mut().unwrap_or(&mut []))
    }

    fn analyze_cached(
        &mut self,
        profile_id: &str,
    ) -> Result<Arc<ExtractionResult>, DocrevError> {
        let Some(doc) = self.document.as_ref() else {
            return Err(DocrevError::InvalidState {
                expected: "a loaded document",
                actual: self.state.name(),
            });
        };
        let key = AnalysisKey {
            fingerprint: doc.fingerprint.clone(),
            profile_id: profile_id.to_string(),
        };
        let analyzer = self.analyzer.as_ref();
        let bytes = &doc.bytes;

        let outcome = self.cache.get_or_analyze(key, || {
            let raw = analyzer.analyze(profile_id, bytes)?;
            normalize_result(profile_id, &raw)
        });

        if let Err(DocrevError::RemoteCall { kind, message, .. }) = &outcome {
            warn!(profile_id, %kind, %message, "remote call failed, session marked Failed");
            self.state = ReviewState::Failed;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_routes_resolve() {
        let routes = RoutingTable::reference();
        assert_eq!(routes.resolve("Invoices").unwrap(), "analyzer_invoices");
        assert_eq!(
            routes.resolve("Bank Statements").unwrap(),
            "analyzer_bank_statements"
        );
        assert_eq!(
            routes.resolve("Loan Application Form").unwrap(),
            "analyzer_loan"
        );
        assert_eq!(routes.entries().count(), 3);
    }

    #[test]
    fn test_unknown_label_is_unroutable() {
        let routes = RoutingTable::reference();
        match routes.resolve("Unknown Type") {
            Err(DocrevError::UnroutableDocument { label }) => {
                assert_eq!(label, "Unknown Type");
            }
            other => panic!("expected UnroutableDocument, got {other:?}"),
        }
    }

    #[test]
    fn test_state_names() {
        assert_eq!(ReviewState::Idle.to_string(), "Idle");
        assert_eq!(ReviewState::Failed.to_string(), "Failed");
    }
}
