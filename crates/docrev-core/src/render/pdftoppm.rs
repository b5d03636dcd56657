use crate::error::DocrevError;
use crate::render::{PageRenderer, RenderedPage};
use std::io::Write;
use std::process::Command;

/// Page rendering backend using pdftoppm (from poppler-utils).
///
/// Renders a single page to PNG on stdout; zoom maps onto the raster
/// resolution (72 dpi is the PDF's natural size, so zoom 2.0 renders at
/// 144 dpi).
pub struct PdftoppmRenderer;

impl PdftoppmRenderer {
    pub fn new() -> Self {
        PdftoppmRenderer
    }

    /// Check if pdftoppm is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftoppm")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn resolution_for_zoom(zoom: f64) -> u32 {
    (72.0 * zoom.max(0.1)).round() as u32
}

impl PageRenderer for PdftoppmRenderer {
    fn render_page(
        &self,
        document: &[u8],
        page: u32,
        zoom: f64,
    ) -> Result<RenderedPage, DocrevError> {
        // Write PDF bytes to a temp file
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| DocrevError::Render(e.to_string()))?;
        tmpfile
            .write_all(document)
            .map_err(|e| DocrevError::Render(e.to_string()))?;

        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(resolution_for_zoom(zoom).to_string())
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg(tmpfile.path())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DocrevError::PdftoppmNotFound
                } else {
                    DocrevError::Render(format!("pdftoppm failed: {e}"))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(DocrevError::PdftoppmFailed { code, stderr });
        }

        if output.stdout.is_empty() {
            return Err(DocrevError::Render(format!(
                "pdftoppm produced no output for page {page}"
            )));
        }

        let decoded = image::load_from_memory_with_format(&output.stdout, image::ImageFormat::Png)
            .map_err(|e| DocrevError::Render(format!("failed to decode rendered page: {e}")))?;
        let image = decoded.to_rgba8();

        Ok(RenderedPage {
            page,
            width_px: image.width(),
            height_px: image.height(),
            image,
        })
    }

    fn backend_name(&self) -> &str {
        "pdftoppm"
    }
}
