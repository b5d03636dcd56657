use docrev_core::error::DocrevError;
use docrev_core::model::{DocumentLabel, ExtractionResult};
use serde_json::json;

pub fn print_result(
    result: &ExtractionResult,
    label: Option<&DocumentLabel>,
) -> Result<(), DocrevError> {
    let view = json!({
        "profile_id": result.profile_id,
        "label": label,
        "fields": result.fields,
        "pages": result.pages,
        "usage": result.usage,
    });
    let pretty = serde_json::to_string_pretty(&view)?;
    println!("{pretty}");
    Ok(())
}
