pub mod cache;
pub mod edit;
pub mod error;
pub mod export;
pub mod model;
pub mod normalize;
pub mod project;
pub mod regions;
pub mod remote;
pub mod render;
pub mod session;
pub mod usage;

use error::DocrevError;
use remote::DocumentAnalyzer;
use render::PageRenderer;
use session::{ReviewSession, RoutingTable, SessionOptions};

/// Main API entry point: run one document through the full review pipeline.
///
/// Classifies the document, routes the label to an extraction profile,
/// extracts and normalizes the fields, and returns the session in the
/// Reviewing state, ready for edits, page rendering, and export. For
/// manual-routing fallbacks and incremental control, drive a
/// [`ReviewSession`] directly.
pub fn review_document(
    pdf_bytes: Vec<u8>,
    analyzer: Box<dyn DocumentAnalyzer>,
    renderer: Box<dyn PageRenderer>,
    routes: RoutingTable,
) -> Result<ReviewSession, DocrevError> {
    let mut session =
        ReviewSession::with_options(analyzer, renderer, routes, SessionOptions::default());
    session.load_document(pdf_bytes)?;
    session.run()?;
    Ok(session)
}
