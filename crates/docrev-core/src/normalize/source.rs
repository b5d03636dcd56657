use crate::model::{PageDimensions, Region, UnitSpace};
use serde_json::{Map, Value};
use tracing::debug;

/// Why a single region source could not be parsed.
///
/// These never propagate past the normalizer: a field whose source fails to
/// parse simply ends up with zero regions.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SourceParseError {
    #[error("source string is not of the form <letter>(...)")]
    BadShape,

    #[error("source string carries fewer than 9 numbers")]
    TooFewNumbers,

    #[error("invalid number '{0}' in source string")]
    BadNumber(String),
}

/// Parse a compact encoded source reference, e.g.
/// `D(1, 0.1,0.1,0.5,0.1,0.5,0.3,0.1,0.3)`.
///
/// The leading letter tags the reference kind, the first number is the
/// 1-based page, and the remaining numbers are x,y pairs. At least eight
/// coordinates must be present; extras beyond the first quad are dropped.
pub fn parse_source_string(
    source: &str,
    pages: &[PageDimensions],
) -> Result<Region, SourceParseError> {
    let source = source.trim();
    if source.len() < 4 || !source.ends_with(')') {
        return Err(SourceParseError::BadShape);
    }
    let open = source.find('(').ok_or(SourceParseError::BadShape)?;
    if open == 0 || !source[..open].chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(SourceParseError::BadShape);
    }

    let inner = &source[open + 1..source.len() - 1];
    let parts: Vec<&str> = inner
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 9 {
        return Err(SourceParseError::TooFewNumbers);
    }

    let page_raw: f64 = parts[0]
        .parse()
        .map_err(|_| SourceParseError::BadNumber(parts[0].to_string()))?;
    let page = page_raw as u32;

    let mut polygon = Vec::with_capacity(8);
    for part in &parts[1..] {
        let n: f64 = part
            .parse()
            .map_err(|_| SourceParseError::BadNumber(part.to_string()))?;
        polygon.push(n);
        if polygon.len() == 8 {
            break;
        }
    }
    if polygon.len() < 8 {
        return Err(SourceParseError::TooFewNumbers);
    }

    let unit_space = unit_space_for(&polygon, page, pages);
    Ok(Region {
        page,
        polygon,
        unit_space,
    })
}

/// Discover regions for one raw field entry.
///
/// Recognized encodings, in priority order:
/// 1. an explicit `regions` list with numeric `page` + `polygon`;
/// 2. an encoded `source` string (or `sources` list of strings);
/// 3. a `boundingRegions` list with separate page and polygon sub-fields.
///
/// The first encoding that yields any region wins; the rest are ignored so
/// the same mention is never counted twice.
pub fn regions_from_field(field: &Map<String, Value>, pages: &[PageDimensions]) -> Vec<Region> {
    let structured = structured_regions(field, pages);
    if !structured.is_empty() {
        return structured;
    }

    let encoded = encoded_source_regions(field, pages);
    if !encoded.is_empty() {
        return encoded;
    }

    bounding_region_objects(field, pages)
}

/// Shape 1: `"regions": [{"page": 1, "polygon": [..]}, ..]`.
fn structured_regions(field: &Map<String, Value>, pages: &[PageDimensions]) -> Vec<Region> {
    let Some(entries) = field.get("regions").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let entry = entry.as_object()?;
            let page = entry.get("page").and_then(Value::as_f64)? as u32;
            let polygon = numeric_list(entry.get("polygon")?)?;
            if polygon.len() < 8 || polygon.len() % 2 != 0 {
                debug!(page, len = polygon.len(), "skipping short structured region");
                return None;
            }
            let unit_space = unit_space_for(&polygon, page, pages);
            Some(Region {
                page,
                polygon,
                unit_space,
            })
        })
        .collect()
}

/// Shape 2: `"source": "D(..)"` or `"sources": ["D(..)", ..]`.
fn encoded_source_regions(field: &Map<String, Value>, pages: &[PageDimensions]) -> Vec<Region> {
    let mut strings: Vec<&str> = Vec::new();
    match field.get("source") {
        Some(Value::String(s)) => strings.push(s),
        Some(Value::Array(items)) => {
            strings.extend(items.iter().filter_map(Value::as_str));
        }
        _ => {}
    }
    if let Some(items) = field.get("sources").and_then(Value::as_array) {
        strings.extend(items.iter().filter_map(Value::as_str));
    }

    strings
        .into_iter()
        .filter_map(|s| match parse_source_string(s, pages) {
            Ok(region) => Some(region),
            Err(err) => {
                debug!(source = s, %err, "unparseable encoded source, field keeps zero regions");
                None
            }
        })
        .collect()
}

/// Shape 3: `"boundingRegions": [{"pageNumber": 1, "polygon": [..]}, ..]`.
///
/// Entries may carry `polygon` or `points`, or a 4-number `boundingBox`
/// that is expanded into an axis-aligned quad.
fn bounding_region_objects(field: &Map<String, Value>, pages: &[PageDimensions]) -> Vec<Region> {
    let Some(entries) = field.get("boundingRegions").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let entry = entry.as_object()?;
            let page = entry
                .get("pageNumber")
                .or_else(|| entry.get("page"))
                .and_then(Value::as_f64)? as u32;

            let polygon = entry
                .get("polygon")
                .or_else(|| entry.get("points"))
                .and_then(numeric_list)
                .filter(|p| p.len() >= 8 && p.len() % 2 == 0)
                .or_else(|| {
                    let b = numeric_list(entry.get("boundingBox")?)?;
                    if b.len() != 4 {
                        return None;
                    }
                    let (x0, y0, x1, y1) = (b[0], b[1], b[2], b[3]);
                    Some(vec![x0, y0, x1, y0, x1, y1, x0, y1])
                })?;

            let unit_space = unit_space_for(&polygon, page, pages);
            Some(Region {
                page,
                polygon,
                unit_space,
            })
        })
        .collect()
}

fn numeric_list(value: &Value) -> Option<Vec<f64>> {
    let items = value.as_array()?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(item.as_f64()?);
    }
    Some(out)
}

/// Tag the coordinate system of a polygon: values within [0, 1] are
/// page-relative; anything larger is absolute, with or without known page
/// dimensions to relate it to.
pub fn unit_space_for(polygon: &[f64], page: u32, pages: &[PageDimensions]) -> UnitSpace {
    if polygon.iter().all(|&v| (0.0..=1.0).contains(&v)) {
        UnitSpace::PageRelative
    } else if pages.iter().any(|p| p.page == page) {
        UnitSpace::Absolute
    } else {
        UnitSpace::AbsoluteUnknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_parse_source_string_literal_values() {
        let region =
            parse_source_string("D(1, 0.1,0.1,0.5,0.1,0.5,0.3,0.1,0.3)", &[]).unwrap();
        assert_eq!(region.page, 1);
        assert_eq!(region.polygon, vec![0.1, 0.1, 0.5, 0.1, 0.5, 0.3, 0.1, 0.3]);
        assert_eq!(region.unit_space, UnitSpace::PageRelative);
    }

    #[test]
    fn test_parse_source_string_extra_coords_dropped() {
        let region =
            parse_source_string("D(2, 1,2,3,4,5,6,7,8,9,10)", &[]).unwrap();
        assert_eq!(region.page, 2);
        assert_eq!(region.polygon.len(), 8);
        assert_eq!(region.polygon[7], 8.0);
    }

    #[test]
    fn test_parse_source_string_fractional_page() {
        let region = parse_source_string("D(3.0, 1,1,2,1,2,2,1,2)", &[]).unwrap();
        assert_eq!(region.page, 3);
    }

    #[test]
    fn test_parse_source_string_rejects_missing_parens() {
        assert_eq!(
            parse_source_string("D 1, 0.1,0.1", &[]),
            Err(SourceParseError::BadShape)
        );
    }

    #[test]
    fn test_parse_source_string_rejects_short_list() {
        assert_eq!(
            parse_source_string("D(1, 0.1,0.1,0.5,0.1)", &[]),
            Err(SourceParseError::TooFewNumbers)
        );
    }

    #[test]
    fn test_parse_source_string_rejects_garbage_number() {
        assert_eq!(
            parse_source_string("D(1, a,b,c,d,e,f,g,h)", &[]),
            Err(SourceParseError::BadNumber("a".to_string()))
        );
    }

    #[test]
    fn test_structured_regions_win_over_source_string() {
        let field = obj(json!({
            "regions": [{"page": 2, "polygon": [1,1,2,1,2,2,1,2]}],
            "source": "D(1, 0.1,0.1,0.5,0.1,0.5,0.3,0.1,0.3)"
        }));
        let regions = regions_from_field(&field, &[]);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].page, 2);
    }

    #[test]
    fn test_bad_source_string_degrades_to_no_regions() {
        let field = obj(json!({"source": "D(oops"}));
        assert!(regions_from_field(&field, &[]).is_empty());
    }

    #[test]
    fn test_bounding_regions_with_bbox_expand_to_quad() {
        let field = obj(json!({
            "boundingRegions": [{"pageNumber": 1, "boundingBox": [10.0, 20.0, 30.0, 40.0]}]
        }));
        let regions = regions_from_field(&field, &[]);
        assert_eq!(regions.len(), 1);
        assert_eq!(
            regions[0].polygon,
            vec![10.0, 20.0, 30.0, 20.0, 30.0, 40.0, 10.0, 40.0]
        );
        assert_eq!(regions[0].unit_space, UnitSpace::AbsoluteUnknown);
    }

    #[test]
    fn test_duplicate_regions_preserved() {
        let field = obj(json!({
            "regions": [
                {"page": 1, "polygon": [1,1,2,1,2,2,1,2]},
                {"page": 1, "polygon": [1,1,2,1,2,2,1,2]}
            ]
        }));
        assert_eq!(regions_from_field(&field, &[]).len(), 2);
    }

    #[test]
    fn test_unit_space_absolute_with_known_page() {
        let pages = [PageDimensions {
            page: 1,
            width: 8.5,
            height: 11.0,
        }];
        assert_eq!(
            unit_space_for(&[1.0, 1.0, 5.0, 1.0, 5.0, 3.0, 1.0, 3.0], 1, &pages),
            UnitSpace::Absolute
        );
        assert_eq!(
            unit_space_for(&[1.0, 1.0, 5.0, 1.0, 5.0, 3.0, 1.0, 3.0], 2, &pages),
            UnitSpace::AbsoluteUnknown
        );
    }
}
