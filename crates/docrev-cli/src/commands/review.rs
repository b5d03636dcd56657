use docrev_core::error::DocrevError;
use docrev_core::regions::pages_with_regions;
use docrev_core::remote::content_api::{ContentApiAnalyzer, RemoteConfig};
use docrev_core::render::pdftoppm::PdftoppmRenderer;
use docrev_core::session::{ReviewSession, RoutingTable};
use std::path::PathBuf;

use crate::output;

pub fn run(
    pdf: PathBuf,
    output_format: &str,
    export: Option<PathBuf>,
    highlight: Option<String>,
    page: Option<u32>,
    zoom: f64,
    out: PathBuf,
) -> Result<(), DocrevError> {
    let pdf_bytes = std::fs::read(&pdf)?;

    let config = RemoteConfig::from_env()?;
    let analyzer = ContentApiAnalyzer::new(config);
    let renderer = PdftoppmRenderer::new();

    let mut session = ReviewSession::new(
        Box::new(analyzer),
        Box::new(renderer),
        RoutingTable::reference(),
    );
    session.load_document(pdf_bytes)?;
    session.run()?;

    let result = session.result().expect("session is reviewing").clone();

    match output_format {
        "json" => output::json::print_result(&result, session.label())?,
        _ => output::table::print_result(&result, session.label()),
    }

    if let Some(path) = export {
        let rows = session.export()?;
        output::csv::write_rows(&path, &rows)?;
        println!("Wrote {} rows to {}", rows.len(), path.display());
    }

    if let Some(field_name) = highlight {
        let field = result
            .field(&field_name)
            .ok_or_else(|| DocrevError::BadFieldPath {
                path: field_name.clone(),
            })?;

        // Default to the first page the field appears on.
        let page = page
            .or_else(|| pages_with_regions(field).first().copied())
            .unwrap_or(1);

        let canvas = session.highlight(&field_name, page, zoom)?;
        canvas
            .save(&out)
            .map_err(|e| DocrevError::Render(e.to_string()))?;
        println!(
            "Wrote page {page} with '{field_name}' highlighted to {}",
            out.display()
        );
    }

    Ok(())
}
