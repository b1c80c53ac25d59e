//! Raster export of rendered diagrams.
//!
//! A [`Rasterizer`] turns sized diagram markup into PNG images with
//! `resvg`. System fonts are loaded once per rasterizer, so watch mode can
//! export every re-render without rescanning them.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use image::RgbaImage;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, Size, fontdb};

/// Rasterizes SVG markup at a fixed output width.
pub struct Rasterizer {
    fonts: Arc<fontdb::Database>,
}

impl Rasterizer {
    /// Create a rasterizer using the fonts installed on this system.
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded system fonts");
        Self::with_fonts(db)
    }

    pub fn with_fonts(fonts: fontdb::Database) -> Self {
        Self {
            fonts: Arc::new(fonts),
        }
    }

    /// Render `markup` to an image `width_px` pixels wide.
    ///
    /// The markup may be a sized view result: a `100%` root width or height
    /// is taken relative to the root's `viewBox`. The aspect ratio is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the markup is not SVG, has no usable size, or
    /// `width_px` is zero.
    pub fn render(&self, markup: &str, width_px: u32) -> Result<RgbaImage> {
        let options = usvg::Options {
            fontdb: Arc::clone(&self.fonts),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(markup, &options).context("failed to parse SVG")?;
        let (scale, width, height) = fit_width(tree.size(), width_px)?;

        let mut pixmap = Pixmap::new(width, height)
            .with_context(|| format!("failed to allocate {width}x{height} pixmap"))?;
        resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

        RgbaImage::from_raw(width, height, pixmap.take())
            .context("pixmap size does not match image size")
    }

    /// Render `markup` and write it to `path` as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or the file cannot be written.
    pub fn write_png(&self, markup: &str, width_px: u32, path: &Path) -> Result<()> {
        let image = self.render(markup, width_px)?;
        image
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "png written"
        );
        Ok(())
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Scale factor and pixel size that fit `size` to `width_px`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn fit_width(size: Size, width_px: u32) -> Result<(f32, u32, u32)> {
    if width_px == 0 {
        bail!("PNG width must be at least one pixel");
    }
    let scale = width_px as f32 / size.width();
    let height = (size.height() * scale).ceil().max(1.0) as u32;
    Ok((scale, width_px, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const BAR: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="20" height="10" fill="red"/></svg>"#;

    fn rasterizer() -> Rasterizer {
        Rasterizer::with_fonts(fontdb::Database::new())
    }

    #[test]
    fn test_render_scales_to_target_width() {
        let image = rasterizer().render(BAR, 40).unwrap();
        assert_eq!(image.dimensions(), (40, 20));
        assert_eq!(image.get_pixel(20, 10).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_sized_root_uses_view_box() {
        let sized = r#"<svg width="100%" height="100%" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 30 10"><rect width="30" height="10"/></svg>"#;
        let image = rasterizer().render(sized, 60).unwrap();
        assert_eq!(image.dimensions(), (60, 20));
    }

    #[test]
    fn test_render_rejects_non_svg() {
        assert!(rasterizer().render("definitely not svg", 100).is_err());
    }

    #[test]
    fn test_zero_width_is_error() {
        let err = rasterizer().render(BAR, 0).unwrap_err();
        assert!(err.to_string().contains("at least one pixel"));
    }

    #[test]
    fn test_write_png_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("diagram.png");
        rasterizer().write_png(BAR, 20, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }
}
