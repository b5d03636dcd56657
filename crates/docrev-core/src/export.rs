use crate::model::{CanonicalField, FieldValue};
use serde::Serialize;

/// Fixed export column order.
pub const EXPORT_COLUMNS: [&str; 5] = [
    "field",
    "value",
    "item_index",
    "item_description",
    "item_amount",
];

/// One row of the review export table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub field: String,
    pub value: String,
    pub item_index: Option<usize>,
    pub item_description: String,
    pub item_amount: String,
}

/// Build export rows from a field tree.
///
/// Array fields expand to one row per element: the field name repeats, the
/// element index goes in `item_index`, and the element's Description/Amount
/// sub-values fill the item columns. Every other field produces a single
/// row with only `field` and `value` populated.
pub fn export_rows(fields: &[CanonicalField]) -> Vec<ExportRow> {
    let mut rows = Vec::new();
    for field in fields {
        match &field.value {
            FieldValue::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    rows.push(item_row(&field.name, index, item));
                }
            }
            other => rows.push(ExportRow {
                field: field.name.clone(),
                value: other.preview(),
                item_index: None,
                item_description: String::new(),
                item_amount: String::new(),
            }),
        }
    }
    rows
}

fn item_row(field_name: &str, index: usize, item: &CanonicalField) -> ExportRow {
    let (description, amount) = match &item.value {
        FieldValue::Object(members) => (
            member_display(members, "Description"),
            member_display(members, "Amount"),
        ),
        // Arrays of bare scalars carry the element itself as the description.
        other => (other.preview(), String::new()),
    };

    ExportRow {
        field: field_name.to_string(),
        value: String::new(),
        item_index: Some(index),
        item_description: description,
        item_amount: amount,
    }
}

fn member_display(members: &[CanonicalField], name: &str) -> String {
    members
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
        .map(|m| m.value.preview())
        .unwrap_or_default()
}
