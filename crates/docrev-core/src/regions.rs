use crate::model::{CanonicalField, Region};

/// Flatten a field's regions.
///
/// With `deep`, descendants are included depth-first in declaration order,
/// self before children. The ordering is deterministic so overlay rendering
/// and tests can rely on it.
pub fn field_regions(field: &CanonicalField, deep: bool) -> Vec<Region> {
    let mut out = Vec::new();
    collect(field, deep, &mut out);
    out
}

fn collect(field: &CanonicalField, deep: bool, out: &mut Vec<Region>) {
    out.extend(field.regions.iter().cloned());
    if deep {
        for child in field.value.children() {
            collect(child, true, out);
        }
    }
}

/// Sorted, deduplicated pages a field (and its descendants) appears on.
pub fn pages_with_regions(field: &CanonicalField) -> Vec<u32> {
    let mut pages: Vec<u32> = field_regions(field, true).iter().map(|r| r.page).collect();
    pages.sort_unstable();
    pages.dedup();
    pages
}
