use docrev_core::error::DocrevError;
use docrev_core::export::export_rows;
use docrev_core::normalize::normalize_result;
use std::path::PathBuf;

use crate::output;

pub fn run(result_file: PathBuf, out: PathBuf) -> Result<(), DocrevError> {
    let json_bytes = std::fs::read(&result_file)?;
    let raw: serde_json::Value = serde_json::from_slice(&json_bytes)?;

    let result = normalize_result("offline", &raw)?;
    let rows = export_rows(&result.fields);

    output::csv::write_rows(&out, &rows)?;
    println!("Wrote {} rows to {}", rows.len(), out.display());
    Ok(())
}
