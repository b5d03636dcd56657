use serde::{Deserialize, Serialize};
use std::fmt;

/// A primitive field value as returned by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Dates stay in the service's string form; no calendar arithmetic happens here.
    Date(String),
    Empty,
}

impl ScalarValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ScalarValue::Text(_) => "text",
            ScalarValue::Number(_) => "number",
            ScalarValue::Boolean(_) => "boolean",
            ScalarValue::Date(_) => "date",
            ScalarValue::Empty => "empty",
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Text(s) => write!(f, "{s}"),
            ScalarValue::Number(n) => write!(f, "{n}"),
            ScalarValue::Boolean(b) => write!(f, "{b}"),
            ScalarValue::Date(d) => write!(f, "{d}"),
            ScalarValue::Empty => Ok(()),
        }
    }
}

/// The value of a canonical field. The variant is fixed at normalization
/// time: edits may change a scalar's content or an array's length, never
/// the variant itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Scalar(ScalarValue),
    /// Ordered array elements; each element is itself a canonical field.
    Array(Vec<CanonicalField>),
    /// Named children in declaration order; names unique within the parent.
    Object(Vec<CanonicalField>),
}

impl FieldValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Scalar(_) => "scalar",
            FieldValue::Array(_) => "array",
            FieldValue::Object(_) => "object",
        }
    }

    /// Child fields of this value, empty for scalars.
    pub fn children(&self) -> &[CanonicalField] {
        match self {
            FieldValue::Scalar(_) => &[],
            FieldValue::Array(items) => items,
            FieldValue::Object(members) => members,
        }
    }

    pub fn children_mut(&mut self) -> &mut [CanonicalField] {
        match self {
            FieldValue::Scalar(_) => &mut [],
            FieldValue::Array(items) => items,
            FieldValue::Object(members) => members,
        }
    }

    /// One-line display form used by field listings.
    pub fn preview(&self) -> String {
        match self {
            FieldValue::Scalar(ScalarValue::Empty) => "(empty)".to_string(),
            FieldValue::Scalar(s) => s.to_string(),
            FieldValue::Array(items) => format!("{} item(s)", items.len()),
            FieldValue::Object(_) => "Details".to_string(),
        }
    }
}

/// Coordinate system of a region's polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSpace {
    /// Coordinates normalized to [0, 1] relative to the page.
    PageRelative,
    /// Absolute coordinates in the same units as the page dimensions
    /// reported by the service.
    Absolute,
    /// Absolute coordinates with no page dimensions to relate them to.
    AbsoluteUnknown,
}

/// A page-anchored polygon justifying a field value.
///
/// The polygon is a flat x,y sequence of at least 4 points (length >= 8,
/// always even). Points are not assumed convex or axis-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// 1-based page index.
    pub page: u32,
    pub polygon: Vec<f64>,
    pub unit_space: UnitSpace,
}

impl Region {
    /// Axis-aligned bounding box of the polygon as (x_min, y_min, x_max, y_max).
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        let xs = self.polygon.iter().step_by(2);
        let ys = self.polygon.iter().skip(1).step_by(2);
        let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for &x in xs {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
        }
        for &y in ys {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        (x_min, y_min, x_max, y_max)
    }
}

/// A normalized field with the places on the document that justify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalField {
    /// Identifier, unique within the parent container.
    pub name: String,
    pub value: FieldValue,
    /// Source regions in discovery order. Duplicates are preserved; they
    /// may correspond to distinct mentions on the document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<Region>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Source page size reported by the service, in the polygon's absolute units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    /// 1-based page index.
    pub page: u32,
    pub width: f64,
    pub height: f64,
}

/// Classification outcome for a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLabel {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Token usage aggregated across the models the service invoked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub models: Vec<String>,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl UsageSummary {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// A normalized extraction result for one (document, profile) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Profile that produced the result.
    pub profile_id: String,
    /// Top-level fields in declaration order.
    pub fields: Vec<CanonicalField>,
    /// Source page dimensions, where the payload carried them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PageDimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageSummary>,
    /// Original payload, retained for diagnostics only. Downstream logic
    /// never reads it once normalization has succeeded.
    pub raw: serde_json::Value,
}

impl ExtractionResult {
    /// Dimensions of a page, if the payload reported them.
    pub fn page_dimensions(&self, page: u32) -> Option<(f64, f64)> {
        self.pages
            .iter()
            .find(|p| p.page == page)
            .map(|p| (p.width, p.height))
    }

    /// Top-level field by name.
    pub fn field(&self, name: &str) -> Option<&CanonicalField> {
        self.fields.iter().find(|f| f.name == name)
    }
}
