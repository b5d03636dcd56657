pub mod overlay;
pub mod pdftoppm;

use crate::error::DocrevError;
use image::RgbaImage;

/// A page rendered to pixels at some zoom level.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 1-based page index.
    pub page: u32,
    pub width_px: u32,
    pub height_px: u32,
    pub image: RgbaImage,
}

impl RenderedPage {
    /// A blank white page, used by tests and as a drawing canvas.
    pub fn blank(page: u32, width_px: u32, height_px: u32) -> RenderedPage {
        RenderedPage {
            page,
            width_px,
            height_px,
            image: RgbaImage::from_pixel(width_px, height_px, image::Rgba([255, 255, 255, 255])),
        }
    }
}

/// PDF page rendering collaborator.
pub trait PageRenderer: Send + Sync {
    /// Render one page (1-based) of the document at the given zoom factor.
    fn render_page(
        &self,
        document: &[u8],
        page: u32,
        zoom: f64,
    ) -> Result<RenderedPage, DocrevError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
