use crate::model::{Region, UnitSpace};
use tracing::debug;

/// Project a region's polygon onto a rendered page image.
///
/// `source_size` is the page's source dimensions in the polygon's unit
/// system, when known. Scale factors are computed independently per axis,
/// since rounding during rendering can leave the raster with a slightly
/// different aspect ratio than the source page.
///
/// Fallbacks when no source size is available: page-relative coordinates
/// multiply directly by the pixel dimensions; absolute coordinates of
/// unknown unit pass through unscaled, which may draw misaligned but is
/// preferable to inventing a plausible-looking scale.
///
/// Degenerate polygons (zero area, repeated points) project without error;
/// whether to draw them is the overlay renderer's concern.
pub fn project_region(
    region: &Region,
    pixel_width: u32,
    pixel_height: u32,
    source_size: Option<(f64, f64)>,
) -> Vec<(f64, f64)> {
    let (sx, sy) = match source_size {
        Some((source_w, source_h)) if source_w > 0.0 && source_h > 0.0 => {
            (pixel_width as f64 / source_w, pixel_height as f64 / source_h)
        }
        _ => match region.unit_space {
            UnitSpace::PageRelative => (pixel_width as f64, pixel_height as f64),
            UnitSpace::Absolute | UnitSpace::AbsoluteUnknown => {
                debug!(
                    page = region.page,
                    "no source page size, passing polygon through unscaled"
                );
                (1.0, 1.0)
            }
        },
    };

    region
        .polygon
        .chunks_exact(2)
        .map(|pair| (pair[0] * sx, pair[1] * sy))
        .collect()
}

/// Axis-aligned bounding box of a projected polygon as
/// (x_min, y_min, x_max, y_max). `None` for an empty polygon.
pub fn bounding_box(points: &[(f64, f64)]) -> Option<(f64, f64, f64, f64)> {
    let (&first, rest) = points.split_first()?;
    let mut bbox = (first.0, first.1, first.0, first.1);
    for &(x, y) in rest {
        bbox.0 = bbox.0.min(x);
        bbox.1 = bbox.1.min(y);
        bbox.2 = bbox.2.max(x);
        bbox.3 = bbox.3.max(y);
    }
    Some(bbox)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relative_region() -> Region {
        Region {
            page: 1,
            polygon: vec![0.1, 0.1, 0.5, 0.1, 0.5, 0.3, 0.1, 0.3],
            unit_space: UnitSpace::PageRelative,
        }
    }

    #[test]
    fn test_page_relative_scales_by_pixels() {
        let points = project_region(&relative_region(), 1000, 800, None);
        assert_eq!(points[0], (100.0, 80.0));
        assert_eq!(points[2], (500.0, 240.0));
    }

    #[test]
    fn test_known_source_size_scales_per_axis() {
        let region = Region {
            page: 1,
            polygon: vec![1.0, 1.0, 5.0, 1.0, 5.0, 3.0, 1.0, 3.0],
            unit_space: UnitSpace::Absolute,
        };
        // 8.5 x 11 inch page rendered at 850 x 2200 px: sx=100, sy=200.
        let points = project_region(&region, 850, 2200, Some((8.5, 11.0)));
        assert_eq!(points[0], (100.0, 200.0));
        assert_eq!(points[2], (500.0, 600.0));
    }

    #[test]
    fn test_unknown_units_pass_through() {
        let region = Region {
            page: 1,
            polygon: vec![10.0, 20.0, 30.0, 20.0, 30.0, 40.0, 10.0, 40.0],
            unit_space: UnitSpace::AbsoluteUnknown,
        };
        let points = project_region(&region, 1000, 800, None);
        assert_eq!(points[0], (10.0, 20.0));
    }

    #[test]
    fn test_projection_is_idempotent() {
        let region = relative_region();
        let a = project_region(&region, 1000, 800, None);
        let b = project_region(&region, 1000, 800, None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_in_page_region_projects_within_bounds() {
        let points = project_region(&relative_region(), 1000, 800, None);
        for (x, y) in points {
            assert!((0.0..=1000.0).contains(&x));
            assert!((0.0..=800.0).contains(&y));
        }
    }

    #[test]
    fn test_degenerate_polygon_projects() {
        let region = Region {
            page: 1,
            polygon: vec![0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2],
            unit_space: UnitSpace::PageRelative,
        };
        let points = project_region(&region, 100, 100, None);
        assert_eq!(points, vec![(20.0, 20.0); 4]);
        assert_eq!(bounding_box(&points), Some((20.0, 20.0, 20.0, 20.0)));
    }

    #[test]
    fn test_bounding_box_of_projected_quad() {
        let points = project_region(&relative_region(), 1000, 800, None);
        assert_eq!(bounding_box(&points), Some((100.0, 80.0, 500.0, 240.0)));
    }

    #[test]
    fn test_bounding_box_empty() {
        assert_eq!(bounding_box(&[]), None);
    }
}
