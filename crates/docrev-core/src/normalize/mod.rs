pub mod source;

use crate::error::DocrevError;
use crate::model::{
    CanonicalField, DocumentLabel, ExtractionResult, FieldValue, PageDimensions, ScalarValue,
    UsageSummary,
};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::debug;

/// Normalize a raw analysis payload into a canonical extraction result.
///
/// The service returns several loosely-structured container shapes; all of
/// them normalize to the same field tree. A payload with no recognizable
/// field container yields an empty field list; some documents legitimately
/// produce no fields. Only a payload whose root is not a JSON object at all
/// is rejected.
pub fn normalize_result(profile_id: &str, raw: &Value) -> Result<ExtractionResult, DocrevError> {
    if !raw.is_object() {
        return Err(DocrevError::MalformedResult);
    }

    let pages = page_dimensions(raw);

    let fields = match find_fields_map(raw) {
        Some(map) => map
            .iter()
            .map(|(name, entry)| build_field(name, entry, &pages))
            .collect(),
        None => {
            debug!(profile_id, "no recognizable field container, empty result");
            Vec::new()
        }
    };

    Ok(ExtractionResult {
        profile_id: profile_id.to_string(),
        fields,
        pages,
        usage: extract_usage(raw),
        raw: raw.clone(),
    })
}

/// Extract the classification label from a classifier payload.
///
/// Scans for the first `category` or `label` string, taking an optional
/// `confidence` / `score` / `probability` number from the same object.
/// `None` means the caller decides the fallback; absence of a label is not
/// an error here.
pub fn extract_label(raw: &Value) -> Option<DocumentLabel> {
    match raw {
        Value::Object(obj) => {
            for key in ["category", "label"] {
                if let Some(label) = obj.get(key).and_then(Value::as_str) {
                    return Some(DocumentLabel {
                        label: label.to_string(),
                        confidence: confidence_in(obj),
                    });
                }
            }
            obj.values().find_map(extract_label)
        }
        Value::Array(items) => items.iter().find_map(extract_label),
        _ => None,
    }
}

/// Aggregate token counters from the first `usage` block in the payload.
///
/// Counter keys are `<model>-input` / `<model>-output`; totals are summed
/// across models and the model names collected.
pub fn extract_usage(raw: &Value) -> Option<UsageSummary> {
    let usage = find_usage_block(raw)?;
    let mut summary = UsageSummary::default();
    let mut models = BTreeSet::new();

    if let Some(tokens) = usage.get("tokens").and_then(Value::as_object) {
        for (key, count) in tokens {
            let Some(count) = count.as_f64() else {
                continue;
            };
            if let Some(model) = key.strip_suffix("-input") {
                summary.input_tokens += count as u64;
                if !model.is_empty() {
                    models.insert(model.to_string());
                }
            } else if let Some(model) = key.strip_suffix("-output") {
                summary.output_tokens += count as u64;
                if !model.is_empty() {
                    models.insert(model.to_string());
                }
            }
        }
    }

    summary.models = models.into_iter().collect();
    Some(summary)
}

/// Source page dimensions from the first content element, where present.
pub fn page_dimensions(raw: &Value) -> Vec<PageDimensions> {
    let Some(pages) = contents_list(raw)
        .and_then(|c| c.first())
        .and_then(|first| first.get("pages"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    pages
        .iter()
        .enumerate()
        .filter_map(|(i, meta)| {
            let width = meta.get("width").and_then(Value::as_f64)?;
            let height = meta.get("height").and_then(Value::as_f64)?;
            let page = meta
                .get("pageNumber")
                .and_then(Value::as_f64)
                .map(|p| p as u32)
                .unwrap_or(i as u32 + 1);
            Some(PageDimensions {
                page,
                width,
                height,
            })
        })
        .collect()
}

/// The `contents` list, at the top level or under a `result` wrapper.
fn contents_list(raw: &Value) -> Option<&Vec<Value>> {
    raw.get("result")
        .and_then(|r| r.get("contents"))
        .and_then(Value::as_array)
        .or_else(|| raw.get("contents").and_then(Value::as_array))
}

/// Locate the field map, trying the known container shapes in priority
/// order: a `contents` element carrying fields, then a bare top-level
/// `fields` mapping.
fn find_fields_map(raw: &Value) -> Option<&Map<String, Value>> {
    if let Some(contents) = contents_list(raw) {
        for element in contents {
            if let Some(fields) = element.get("fields").and_then(Value::as_object) {
                if !fields.is_empty() {
                    return Some(fields);
                }
            }
        }
    }
    raw.get("fields").and_then(Value::as_object)
}

/// Build one canonical field from its raw entry, recursing into array and
/// object children.
fn build_field(name: &str, entry: &Value, pages: &[PageDimensions]) -> CanonicalField {
    let Some(obj) = entry.as_object() else {
        // Bare values appear as array elements in some payloads.
        return CanonicalField {
            name: name.to_string(),
            value: FieldValue::Scalar(scalar_from_json(entry)),
            regions: Vec::new(),
            confidence: None,
        };
    };

    let value = match obj.get("type").and_then(Value::as_str) {
        Some("array") => build_array(obj, pages),
        Some("object") => build_object(obj, pages),
        Some(_) => FieldValue::Scalar(scalar_value(obj)),
        None => infer_value(obj, pages),
    };

    // A field keeps its own explicit regions; only a field without any
    // falls back to its children's. Children have already accumulated
    // their own descendants, so direct concatenation covers the subtree
    // without counting any mention twice.
    let mut regions = source::regions_from_field(obj, pages);
    if regions.is_empty() {
        for child in value.children() {
            regions.extend(child.regions.iter().cloned());
        }
    }

    CanonicalField {
        name: name.to_string(),
        value,
        regions,
        confidence: obj.get("confidence").and_then(Value::as_f64),
    }
}

/// Kind inference when no type tag is declared: list shape wins, then
/// object shape, else scalar.
fn infer_value(obj: &Map<String, Value>, pages: &[PageDimensions]) -> FieldValue {
    if obj.get("valueArray").map_or(false, Value::is_array)
        || obj.get("value").map_or(false, Value::is_array)
    {
        return build_array(obj, pages);
    }

    if obj.get("valueObject").map_or(false, Value::is_object) {
        return build_object(obj, pages);
    }
    if let Some(value) = obj.get("value").and_then(Value::as_object) {
        if looks_like_field_map(value) {
            return build_object(obj, pages);
        }
    }

    FieldValue::Scalar(scalar_value(obj))
}

fn build_array(obj: &Map<String, Value>, pages: &[PageDimensions]) -> FieldValue {
    let items = obj
        .get("valueArray")
        .or_else(|| obj.get("value"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    FieldValue::Array(
        items
            .iter()
            .enumerate()
            .map(|(i, item)| build_field(&i.to_string(), item, pages))
            .collect(),
    )
}

fn build_object(obj: &Map<String, Value>, pages: &[PageDimensions]) -> FieldValue {
    let members = obj
        .get("valueObject")
        .or_else(|| obj.get("value"))
        .and_then(Value::as_object);

    FieldValue::Object(match members {
        Some(members) => members
            .iter()
            .map(|(child_name, child)| build_field(child_name, child, pages))
            .collect(),
        None => Vec::new(),
    })
}

/// Scalar extraction precedence over the typed value keys.
fn scalar_value(obj: &Map<String, Value>) -> ScalarValue {
    if let Some(s) = obj.get("valueString").and_then(Value::as_str) {
        return ScalarValue::Text(s.to_string());
    }
    if let Some(n) = obj.get("valueNumber").and_then(Value::as_f64) {
        return ScalarValue::Number(n);
    }
    if let Some(b) = obj.get("valueBoolean").and_then(Value::as_bool) {
        return ScalarValue::Boolean(b);
    }
    if let Some(d) = obj.get("valueDate").and_then(Value::as_str) {
        return ScalarValue::Date(d.to_string());
    }
    if let Some(v) = obj.get("value") {
        return scalar_from_json(v);
    }
    ScalarValue::Empty
}

fn scalar_from_json(value: &Value) -> ScalarValue {
    match value {
        Value::String(s) => ScalarValue::Text(s.clone()),
        Value::Number(n) => ScalarValue::Number(n.as_f64().unwrap_or(0.0)),
        Value::Bool(b) => ScalarValue::Boolean(*b),
        Value::Null => ScalarValue::Empty,
        other => ScalarValue::Text(other.to_string()),
    }
}

/// A mapping whose values all look like field entries (carry a value or
/// source key) is treated as an object's children.
fn looks_like_field_map(map: &Map<String, Value>) -> bool {
    if map.is_empty() {
        return false;
    }
    map.values().all(|v| {
        v.as_object().is_some_and(|o| {
            o.contains_key("value")
                || o.contains_key("valueString")
                || o.contains_key("valueNumber")
                || o.contains_key("valueArray")
                || o.contains_key("valueObject")
                || o.contains_key("type")
                || o.contains_key("source")
                || o.contains_key("sources")
        })
    })
}

fn confidence_in(obj: &Map<String, Value>) -> Option<f64> {
    ["confidence", "score", "probability"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_f64))
}

fn find_usage_block(value: &Value) -> Option<&Map<String, Value>> {
    match value {
        Value::Object(obj) => {
            if let Some(usage) = obj.get("usage").and_then(Value::as_object) {
                return Some(usage);
            }
            obj.values().find_map(find_usage_block)
        }
        Value::Array(items) => items.iter().find_map(find_usage_block),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vendor_fields() -> Value {
        json!({
            "VendorName": {
                "type": "string",
                "valueString": "Acme",
                "source": "D(1, 0.1,0.1,0.5,0.1,0.5,0.3,0.1,0.3)"
            },
            "Total": { "valueNumber": 99.5 }
        })
    }

    #[test]
    fn test_contents_container_shape() {
        let raw = json!({ "contents": [ { "fields": vendor_fields() } ] });
        let result = normalize_result("p1", &raw).unwrap();
        assert_eq!(result.fields.len(), 2);
        assert_eq!(result.fields[0].name, "VendorName");
        assert_eq!(result.fields[0].regions.len(), 1);
    }

    #[test]
    fn test_result_wrapped_contents_shape() {
        let raw = json!({ "result": { "contents": [ { "fields": vendor_fields() } ] } });
        let result = normalize_result("p1", &raw).unwrap();
        assert_eq!(result.fields.len(), 2);
    }

    #[test]
    fn test_bare_fields_shape() {
        let raw = json!({ "fields": vendor_fields() });
        let result = normalize_result("p1", &raw).unwrap();
        assert_eq!(result.fields.len(), 2);
    }

    #[test]
    fn test_all_shapes_normalize_identically() {
        let a = normalize_result("p", &json!({ "contents": [ { "fields": vendor_fields() } ] }))
            .unwrap();
        let b = normalize_result(
            "p",
            &json!({ "result": { "contents": [ { "fields": vendor_fields() } ] } }),
        )
        .unwrap();
        let c = normalize_result("p", &json!({ "fields": vendor_fields() })).unwrap();
        assert_eq!(a.fields, b.fields);
        assert_eq!(b.fields, c.fields);
    }

    #[test]
    fn test_first_contents_element_with_fields_wins() {
        let raw = json!({
            "contents": [
                { "kind": "cover", "fields": {} },
                { "fields": { "A": { "valueString": "first" } } },
                { "fields": { "B": { "valueString": "second" } } }
            ]
        });
        let result = normalize_result("p", &raw).unwrap();
        assert_eq!(result.fields.len(), 1);
        assert_eq!(result.fields[0].name, "A");
    }

    #[test]
    fn test_no_container_yields_empty_result() {
        let raw = json!({ "status": "succeeded" });
        let result = normalize_result("p", &raw).unwrap();
        assert!(result.fields.is_empty());
    }

    #[test]
    fn test_non_object_root_is_malformed() {
        assert!(matches!(
            normalize_result("p", &json!([1, 2, 3])),
            Err(DocrevError::MalformedResult)
        ));
    }

    #[test]
    fn test_array_field_with_object_items() {
        let raw = json!({ "fields": {
            "Items": {
                "type": "array",
                "valueArray": [
                    { "type": "object", "valueObject": {
                        "Description": { "valueString": "Widget" },
                        "Amount": { "valueNumber": 10.0 }
                    }},
                    { "type": "object", "valueObject": {
                        "Description": { "valueString": "Gadget" },
                        "Amount": { "valueNumber": 5.0 }
                    }}
                ]
            }
        }});
        let result = normalize_result("p", &raw).unwrap();
        let items = match &result.fields[0].value {
            FieldValue::Array(items) => items,
            other => panic!("expected array, got {}", other.kind_name()),
        };
        assert_eq!(items.len(), 2);
        let first = match &items[0].value {
            FieldValue::Object(members) => members,
            other => panic!("expected object, got {}", other.kind_name()),
        };
        assert_eq!(first[0].name, "Description");
        assert_eq!(
            first[0].value,
            FieldValue::Scalar(ScalarValue::Text("Widget".into()))
        );
    }

    #[test]
    fn test_parent_without_regions_inherits_descendants() {
        let raw = json!({ "fields": {
            "Items": {
                "valueArray": [
                    { "valueString": "a", "source": "D(1, 1,1,2,1,2,2,1,2)" },
                    { "valueString": "b", "source": "D(2, 1,1,2,1,2,2,1,2)" }
                ]
            }
        }});
        let result = normalize_result("p", &raw).unwrap();
        let pages: Vec<u32> = result.fields[0].regions.iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![1, 2]);
    }

    #[test]
    fn test_parent_with_own_regions_keeps_them() {
        let raw = json!({ "fields": {
            "Items": {
                "source": "D(3, 1,1,2,1,2,2,1,2)",
                "valueArray": [
                    { "valueString": "a", "source": "D(1, 1,1,2,1,2,2,1,2)" }
                ]
            }
        }});
        let result = normalize_result("p", &raw).unwrap();
        assert_eq!(result.fields[0].regions.len(), 1);
        assert_eq!(result.fields[0].regions[0].page, 3);
    }

    #[test]
    fn test_field_declaration_order_preserved() {
        let raw = json!({ "fields": {
            "Zeta": { "valueString": "z" },
            "Alpha": { "valueString": "a" }
        }});
        let result = normalize_result("p", &raw).unwrap();
        let names: Vec<&str> = result.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_extract_label_category() {
        let raw = json!({ "result": { "contents": [
            { "category": "Invoices", "confidence": 0.93 }
        ]}});
        let label = extract_label(&raw).unwrap();
        assert_eq!(label.label, "Invoices");
        assert_eq!(label.confidence, Some(0.93));
    }

    #[test]
    fn test_extract_label_falls_back_to_label_key_and_score() {
        let raw = json!({ "predictions": [ { "label": "Bank Statements", "score": 0.8 } ] });
        let label = extract_label(&raw).unwrap();
        assert_eq!(label.label, "Bank Statements");
        assert_eq!(label.confidence, Some(0.8));
    }

    #[test]
    fn test_extract_label_none() {
        assert!(extract_label(&json!({ "status": "succeeded" })).is_none());
    }

    #[test]
    fn test_extract_usage_sums_per_model_counters() {
        let raw = json!({ "result": { "usage": { "tokens": {
            "gpt-4o-input": 1200,
            "gpt-4o-output": 340,
            "gpt-4o-mini-input": 50,
            "gpt-4o-mini-output": 10
        }}}});
        let usage = extract_usage(&raw).unwrap();
        assert_eq!(usage.input_tokens, 1250);
        assert_eq!(usage.output_tokens, 350);
        assert_eq!(usage.models, vec!["gpt-4o", "gpt-4o-mini"]);
    }

    #[test]
    fn test_page_dimensions_harvested() {
        let raw = json!({ "contents": [ {
            "fields": { "A": { "valueString": "x" } },
            "pages": [ { "pageNumber": 1, "width": 8.5, "height": 11.0 } ]
        }]});
        let result = normalize_result("p", &raw).unwrap();
        assert_eq!(result.page_dimensions(1), Some((8.5, 11.0)));
        assert_eq!(result.page_dimensions(2), None);
    }

    #[test]
    fn test_absolute_region_tagged_with_known_page_size() {
        let raw = json!({ "contents": [ {
            "fields": { "A": { "valueString": "x", "source": "D(1, 1,1,5,1,5,3,1,3)" } },
            "pages": [ { "pageNumber": 1, "width": 8.5, "height": 11.0 } ]
        }]});
        let result = normalize_result("p", &raw).unwrap();
        assert_eq!(
            result.fields[0].regions[0].unit_space,
            crate::model::UnitSpace::Absolute
        );
    }
}
