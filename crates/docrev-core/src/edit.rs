use crate::error::DocrevError;
use crate::model::{CanonicalField, FieldValue, ScalarValue};
use std::fmt;

/// Address of a field in a tree: the first index selects a top-level field,
/// each following index a child of the previous one (array element or
/// object member, in declaration order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<usize>);

impl FieldPath {
    pub fn new(indices: Vec<usize>) -> FieldPath {
        FieldPath(indices)
    }

    pub fn root(index: usize) -> FieldPath {
        FieldPath(vec![index])
    }

    pub fn child(&self, index: usize) -> FieldPath {
        let mut indices = self.0.clone();
        indices.push(index);
        FieldPath(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

/// Resolve a path to a field.
pub fn field_at<'a>(fields: &'a [CanonicalField], path: &FieldPath) -> Option<&'a CanonicalField> {
    let (&first, rest) = path.0.split_first()?;
    let mut current = fields.get(first)?;
    for &index in rest {
        current = current.value.children().get(index)?;
    }
    Some(current)
}

fn field_at_mut<'a>(
    fields: &'a mut [CanonicalField],
    path: &FieldPath,
) -> Option<&'a mut CanonicalField> {
    let (&first, rest) = path.0.split_first()?;
    let mut current = fields.get_mut(first)?;
    for &index in rest {
        current = current.value.children_mut().get_mut(index)?;
    }
    Some(current)
}

/// Replace a scalar's content. The scalar kind must match: a text field
/// stays text, a number stays a number. Non-scalar targets and kind changes
/// are `KindMismatch`.
pub fn set_scalar(
    fields: &mut [CanonicalField],
    path: &FieldPath,
    new_value: ScalarValue,
) -> Result<(), DocrevError> {
    let field = field_at_mut(fields, path).ok_or_else(|| DocrevError::BadFieldPath {
        path: path.to_string(),
    })?;

    match &mut field.value {
        FieldValue::Scalar(current) => {
            if std::mem::discriminant(current) != std::mem::discriminant(&new_value) {
                return Err(DocrevError::KindMismatch {
                    path: path.to_string(),
                });
            }
            *current = new_value;
            Ok(())
        }
        _ => Err(DocrevError::KindMismatch {
            path: path.to_string(),
        }),
    }
}

/// Append an element to an array field.
pub fn push_item(
    fields: &mut [CanonicalField],
    path: &FieldPath,
    item: CanonicalField,
) -> Result<(), DocrevError> {
    let field = field_at_mut(fields, path).ok_or_else(|| DocrevError::BadFieldPath {
        path: path.to_string(),
    })?;

    match &mut field.value {
        FieldValue::Array(items) => {
            items.push(item);
            Ok(())
        }
        _ => Err(DocrevError::KindMismatch {
            path: path.to_string(),
        }),
    }
}

/// Remove an element from an array field by index.
pub fn remove_item(
    fields: &mut [CanonicalField],
    path: &FieldPath,
    index: usize,
) -> Result<CanonicalField, DocrevError> {
    let field = field_at_mut(fields, path).ok_or_else(|| DocrevError::BadFieldPath {
        path: path.to_string(),
    })?;

    match &mut field.value {
        FieldValue::Array(items) if index < items.len() => Ok(items.remove(index)),
        FieldValue::Array(_) => Err(DocrevError::BadFieldPath {
            path: path.child(index).to_string(),
        }),
        _ => Err(DocrevError::KindMismatch {
            path: path.to_string(),
        }),
    }
}
