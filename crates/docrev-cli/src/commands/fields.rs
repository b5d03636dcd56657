use docrev_core::error::DocrevError;
use docrev_core::export::export_rows;
use docrev_core::normalize::normalize_result;
use std::path::PathBuf;

use crate::output;

/// Offline mode: normalize a previously saved raw result, no remote calls.
pub fn run(
    result_file: PathBuf,
    output_format: &str,
    export: Option<PathBuf>,
) -> Result<(), DocrevError> {
    let json_bytes = std::fs::read(&result_file)?;
    let raw: serde_json::Value = serde_json::from_slice(&json_bytes)?;

    let result = normalize_result("offline", &raw)?;

    match output_format {
        "json" => output::json::print_result(&result, None)?,
        _ => output::table::print_result(&result, None),
    }

    if let Some(path) = export {
        let rows = export_rows(&result.fields);
        output::csv::write_rows(&path, &rows)?;
        println!("Wrote {} rows to {}", rows.len(), path.display());
    }

    Ok(())
}
