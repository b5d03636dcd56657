use crate::model::Region;
use crate::project::{bounding_box, project_region};
use crate::render::RenderedPage;
use image::{Rgba, RgbaImage};

const OUTLINE: Rgba<u8> = Rgba([255, 0, 0, 255]);
const OUTLINE_WIDTH: u32 = 3;

/// Draw the given regions onto a copy of the rendered page.
///
/// Regions anchored to other pages are skipped. Each region is projected to
/// pixel space and its bounding box drawn as a red outline, matching how
/// reviewers expect highlights to look even for skewed polygons.
pub fn highlight_regions(
    page: &RenderedPage,
    regions: &[Region],
    source_size: Option<(f64, f64)>,
) -> RgbaImage {
    let mut canvas = page.image.clone();

    for region in regions.iter().filter(|r| r.page == page.page) {
        let points = project_region(region, page.width_px, page.height_px, source_size);
        if let Some((x0, y0, x1, y1)) = bounding_box(&points) {
            draw_rect_outline(&mut canvas, x0, y0, x1, y1);
        }
    }

    canvas
}

fn draw_rect_outline(canvas: &mut RgbaImage, x0: f64, y0: f64, x1: f64, y1: f64) {
    let (width, height) = (canvas.width(), canvas.height());
    if width == 0 || height == 0 {
        return;
    }

    let clamp_x = |v: f64| (v.round().max(0.0) as u32).min(width - 1);
    let clamp_y = |v: f64| (v.round().max(0.0) as u32).min(height - 1);
    let (left, top, right, bottom) = (clamp_x(x0), clamp_y(y0), clamp_x(x1), clamp_y(y1));

    for t in 0..OUTLINE_WIDTH {
        // Horizontal edges, moving inward.
        let y_top = top.saturating_add(t);
        let y_bottom = bottom.saturating_sub(t);
        if y_top <= bottom {
            for x in left..=right {
                canvas.put_pixel(x, y_top, OUTLINE);
            }
        }
        if y_bottom >= top {
            for x in left..=right {
                canvas.put_pixel(x, y_bottom, OUTLINE);
            }
        }

        // Vertical edges.
        let x_left = left.saturating_add(t);
        let x_right = right.saturating_sub(t);
        if x_left <= right {
            for y in top..=bottom {
                canvas.put_pixel(x_left, y, OUTLINE);
            }
        }
        if x_right >= left {
            for y in top..=bottom {
                canvas.put_pixel(x_right, y, OUTLINE);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UnitSpace;

    fn region(page: u32) -> Region {
        Region {
            page,
            polygon: vec![0.2, 0.2, 0.8, 0.2, 0.8, 0.8, 0.2, 0.8],
            unit_space: UnitSpace::PageRelative,
        }
    }

    #[test]
    fn test_outline_drawn_at_bbox_corner() {
        let page = RenderedPage::blank(1, 100, 100);
        let canvas = highlight_regions(&page, &[region(1)], None);
        // Projected bbox is (20, 20)..(80, 80).
        assert_eq!(*canvas.get_pixel(20, 20), OUTLINE);
        assert_eq!(*canvas.get_pixel(80, 80), OUTLINE);
        // Interior stays untouched.
        assert_eq!(*canvas.get_pixel(50, 50), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_other_page_regions_skipped() {
        let page = RenderedPage::blank(1, 100, 100);
        let canvas = highlight_regions(&page, &[region(2)], None);
        assert_eq!(*canvas.get_pixel(20, 20), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_source_image_not_mutated() {
        let page = RenderedPage::blank(1, 100, 100);
        let _ = highlight_regions(&page, &[region(1)], None);
        assert_eq!(*page.image.get_pixel(20, 20), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_out_of_bounds_region_clamped() {
        let page = RenderedPage::blank(1, 50, 50);
        let wild = Region {
            page: 1,
            polygon: vec![-10.0, -10.0, 200.0, -10.0, 200.0, 200.0, -10.0, 200.0],
            unit_space: UnitSpace::AbsoluteUnknown,
        };
        // Must not panic; clamps to the canvas.
        let canvas = highlight_regions(&page, &[wild], None);
        assert_eq!(*canvas.get_pixel(0, 0), OUTLINE);
        assert_eq!(*canvas.get_pixel(49, 49), OUTLINE);
    }
}
