use docrev_core::error::DocrevError;
use docrev_core::export::{ExportRow, EXPORT_COLUMNS};
use std::path::Path;

pub fn write_rows(path: &Path, rows: &[ExportRow]) -> Result<(), DocrevError> {
    std::fs::write(path, format_rows(rows))?;
    Ok(())
}

fn format_rows(rows: &[ExportRow]) -> String {
    let mut out = String::new();
    out.push_str(&EXPORT_COLUMNS.join(","));
    out.push('\n');

    for row in rows {
        let item_index = row.item_index.map(|i| i.to_string()).unwrap_or_default();
        let cells = [
            row.field.as_str(),
            row.value.as_str(),
            item_index.as_str(),
            row.item_description.as_str(),
            row.item_amount.as_str(),
        ];
        let line: Vec<String> = cells.iter().map(|c| escape(c)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    out
}

/// Quote a cell when it carries a comma, quote, or newline; embedded quotes
/// are doubled.
fn escape(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(field: &str, value: &str) -> ExportRow {
        ExportRow {
            field: field.to_string(),
            value: value.to_string(),
            item_index: None,
            item_description: String::new(),
            item_amount: String::new(),
        }
    }

    #[test]
    fn test_header_and_plain_row() {
        let text = format_rows(&[row("VendorName", "Acme")]);
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "field,value,item_index,item_description,item_amount"
        );
        assert_eq!(lines.next().unwrap(), "VendorName,Acme,,,");
    }

    #[test]
    fn test_item_row_carries_index() {
        let text = format_rows(&[ExportRow {
            field: "Items".into(),
            value: String::new(),
            item_index: Some(1),
            item_description: "Gadget".into(),
            item_amount: "5".into(),
        }]);
        assert_eq!(text.lines().nth(1).unwrap(), "Items,,1,Gadget,5");
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
