//! Software rasterization of a laid-out subtree into an RGB bitmap.

use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use anyhow::{anyhow, Context};
use image::{Rgb, RgbImage};

use crate::export::dom::Element;
use crate::export::error::ExportError;
use crate::export::font_metrics::{FontFamily, TextMeasure};
use crate::export::layout::{layout, layout_with, PaintOp, Rect, TextRun, A4_WIDTH_PX};

/// Captured pixels of a subtree.
pub type Bitmap = RgbImage;

pub const WHITE: [u8; 3] = [255, 255, 255];

/// Font files tried in order when no export font is configured.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// First candidate that exists as a regular file.
pub fn first_existing_font(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().map(PathBuf::from).find(|p| p.is_file())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Device pixels per CSS pixel.
    pub scale: f32,
    pub background: [u8; 3],
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 2.5,
            background: WHITE,
        }
    }
}

/// Turns a document subtree into pixels. Implementations must be usable from
/// a blocking worker thread.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, node: &Element, options: &RasterOptions) -> Result<Bitmap, ExportError>;
}

/// Paints layout output with a single TrueType face.
#[derive(Clone)]
pub struct SoftwareRasterizer {
    font: Option<FontArc>,
}

impl SoftwareRasterizer {
    pub fn new(font: Option<FontArc>) -> Self {
        Self { font }
    }

    pub fn from_font_file(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("reading export font {}", path.display()))?;
        let font = FontArc::try_from_vec(data).map_err(|e| anyhow!("invalid font file: {e}"))?;
        Ok(Self::new(Some(font)))
    }

    /// Loads the first readable face from [`SYSTEM_FONT_CANDIDATES`].
    pub fn discover() -> Option<(PathBuf, Self)> {
        SYSTEM_FONT_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .filter(|p| p.is_file())
            .find_map(|path| match Self::from_font_file(&path) {
                Ok(rasterizer) => Some((path, rasterizer)),
                Err(e) => {
                    tracing::debug!("skipping system font {}: {e:#}", path.display());
                    None
                }
            })
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }
}

/// Measures runs with the face that paints them, at the device scale used for
/// painting, and reports CSS px.
struct FaceMeasure<'a> {
    font: &'a FontArc,
    scale: f32,
}

impl TextMeasure for FaceMeasure<'_> {
    fn measure(&self, text: &str, _font: FontFamily, size_px: f32, bold: bool) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size_px * self.scale));
        let mut width = 0.0_f32;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        // Faux bold adds one device pixel of ink after the last glyph.
        if bold && previous.is_some() {
            width += 1.0;
        }
        width / self.scale
    }
}

impl Rasterizer for SoftwareRasterizer {
    fn rasterize(&self, node: &Element, options: &RasterOptions) -> Result<Bitmap, ExportError> {
        let laid_out = match &self.font {
            Some(font) => layout_with(node, A4_WIDTH_PX, &FaceMeasure { font, scale: options.scale }),
            None => layout(node, A4_WIDTH_PX),
        };
        let width = (laid_out.width * options.scale).round() as u32;
        let height = (laid_out.height * options.scale).round() as u32;
        if width == 0 || height == 0 {
            return Err(ExportError::EmptyNode { width, height });
        }

        let has_text = laid_out.ops.iter().any(|op| matches!(op, PaintOp::Text(_)));
        if has_text && self.font.is_none() {
            return Err(ExportError::FontUnavailable);
        }

        let mut bitmap = RgbImage::from_pixel(width, height, Rgb(options.background));
        for op in &laid_out.ops {
            match op {
                PaintOp::Fill { rect, color } => fill_rect(&mut bitmap, rect, *color, options.scale),
                PaintOp::Text(run) => {
                    if let Some(font) = &self.font {
                        draw_run(&mut bitmap, font, run, options.scale);
                    }
                }
            }
        }
        Ok(bitmap)
    }
}

fn fill_rect(bitmap: &mut Bitmap, rect: &Rect, color: [u8; 3], scale: f32) {
    let x0 = (rect.x * scale).round().max(0.0) as u32;
    let y0 = (rect.y * scale).round().max(0.0) as u32;
    let x1 = (((rect.x + rect.w) * scale).round().max(0.0) as u32).min(bitmap.width());
    let y1 = (((rect.y + rect.h) * scale).round().max(0.0) as u32).min(bitmap.height());
    for y in y0..y1 {
        for x in x0..x1 {
            bitmap.put_pixel(x, y, Rgb(color));
        }
    }
}

fn blend(bitmap: &mut Bitmap, x: i64, y: i64, color: [u8; 3], coverage: f32) {
    if x < 0 || y < 0 || x >= bitmap.width() as i64 || y >= bitmap.height() as i64 {
        return;
    }
    let c = coverage.clamp(0.0, 1.0);
    let px = bitmap.get_pixel_mut(x as u32, y as u32);
    for (dst, src) in px.0.iter_mut().zip(color) {
        *dst = (*dst as f32 * (1.0 - c) + src as f32 * c).round() as u8;
    }
}

fn draw_run(bitmap: &mut Bitmap, font: &FontArc, run: &TextRun, scale: f32) {
    let px = PxScale::from(run.size * scale);
    let scaled = font.as_scaled(px);
    let glyph_h = scaled.ascent() - scaled.descent();
    let baseline = run.top * scale + (run.line_height * scale - glyph_h) / 2.0 + scaled.ascent();
    // Faux bold: the face is painted a second time one device pixel to the right.
    let passes: &[i64] = if run.bold { &[0, 1] } else { &[0] };

    let mut caret = run.x * scale;
    let mut previous = None;
    for c in run.text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(px, point(caret, baseline));
        caret += scaled.h_advance(id);
        previous = Some(id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                for dx in passes {
                    blend(
                        bitmap,
                        bounds.min.x as i64 + gx as i64 + dx,
                        bounds.min.y as i64 + gy as i64,
                        run.color,
                        coverage,
                    );
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swatch() -> Element {
        Element::new("div")
            .style("width", "100px")
            .style("height", "40px")
            .style("background", "#ff0000")
    }

    #[test]
    fn test_bitmap_is_scaled_css_size() {
        let bitmap = SoftwareRasterizer::new(None)
            .rasterize(&swatch(), &RasterOptions::default())
            .unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (250, 100));
        assert_eq!(bitmap.get_pixel(10, 10).0, [255, 0, 0]);
    }

    #[test]
    fn test_background_fills_unpainted_pixels() {
        let root = Element::new("div")
            .style("width", "100px")
            .style("height", "40px")
            .child(
                Element::new("div")
                    .style("height", "10px")
                    .style("background", "#000000"),
            );
        let bitmap = SoftwareRasterizer::new(None)
            .rasterize(&root, &RasterOptions::default())
            .unwrap();
        assert_eq!(bitmap.get_pixel(5, 5).0, [0, 0, 0]);
        assert_eq!(bitmap.get_pixel(5, 90).0, WHITE);
    }

    #[test]
    fn test_zero_height_node_is_rejected() {
        let err = SoftwareRasterizer::new(None)
            .rasterize(&Element::new("div"), &RasterOptions::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::EmptyNode { height: 0, .. }));
    }

    #[test]
    fn test_text_without_font_fails() {
        let root = Element::new("p").text("Jane Doe");
        let err = SoftwareRasterizer::new(None)
            .rasterize(&root, &RasterOptions::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::FontUnavailable));
    }

    #[test]
    fn test_first_existing_font_skips_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("face.ttf");
        std::fs::write(&present, b"not really a font").unwrap();
        let present_str = present.to_str().unwrap();
        let candidates = ["/nonexistent/a.ttf", present_str, "/nonexistent/b.ttf"];
        assert_eq!(first_existing_font(&candidates), Some(present.clone()));
        assert_eq!(first_existing_font(&["/nonexistent/a.ttf"]), None);
    }

    #[test]
    fn test_wrapped_text_stays_inside_its_box() {
        // Needs a real face; hosts without one of the system fonts skip.
        let Some((_, rasterizer)) = SoftwareRasterizer::discover() else {
            return;
        };
        let root = Element::new("div").style("width", "300px").child(
            Element::new("div")
                .style("width", "92px")
                .style("font-family", "'Times New Roman'")
                .style("font-size", "14px")
                .text("mmmm mmmm"),
        );
        let options = RasterOptions::default();
        let bitmap = rasterizer.rasterize(&root, &options).unwrap();
        let right_edge = (92.0 * options.scale).round() as u32;
        let overflow = bitmap
            .enumerate_pixels()
            .filter(|(x, _, px)| *x > right_edge && px.0 != WHITE)
            .count();
        assert_eq!(overflow, 0);
    }

    #[test]
    fn test_face_measure_counts_bold_ink() {
        let Some((_, rasterizer)) = SoftwareRasterizer::discover() else {
            return;
        };
        let Some(font) = rasterizer.font.as_ref() else {
            return;
        };
        let measure = FaceMeasure { font, scale: 2.5 };
        let regular = measure.measure("Resume", FontFamily::Sans, 14.0, false);
        let bold = measure.measure("Resume", FontFamily::Sans, 14.0, true);
        assert!(regular > 0.0);
        assert!((bold - regular - 0.4).abs() < 1e-3);
    }

    #[test]
    fn test_missing_font_file_is_reported() {
        let result = SoftwareRasterizer::from_font_file(Path::new("/nonexistent/font.ttf"));
        assert!(result.is_err());
    }
}
