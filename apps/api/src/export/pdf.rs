//! A4 page planning and PDF assembly for captured resume bitmaps.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::ExtendedColorType;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};

use crate::export::error::ExportError;
use crate::export::raster::Bitmap;

pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;
/// Shrink factor applied to the single-page fit so the image never touches the edge.
pub const FIT_MARGIN: f64 = 0.95;
pub const JPEG_QUALITY: u8 = 92;
/// Resolution a single-page fit is reduced to before encoding.
pub const PRINT_DPI: f64 = 300.0;

const PT_PER_MM: f64 = 72.0 / 25.4;
const IMAGE_NAME: Name<'static> = Name(b"Im1");

/// Where one page image goes, in millimetres from the page's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x_mm: f64,
    pub y_mm: f64,
    pub w_mm: f64,
    pub h_mm: f64,
}

/// A horizontal band of the source bitmap rendered on its own page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slice {
    pub y_px: u32,
    pub height_px: u32,
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PagePlan {
    /// Whole bitmap scaled down onto one centred page.
    FitSingle(Placement),
    /// Bitmap cut top-to-bottom into page-height bands, one per page.
    Slices(Vec<Slice>),
}

impl PagePlan {
    pub fn page_count(&self) -> usize {
        match self {
            PagePlan::FitSingle(_) => 1,
            PagePlan::Slices(slices) => slices.len(),
        }
    }
}

/// Decides how a `width_px` x `height_px` capture maps onto A4 pages.
///
/// Only templates that allow multi-page output are ever sliced, and only when the
/// capture is taller than one page at full page width.
pub fn plan_pages(width_px: u32, height_px: u32, multi_page: bool) -> PagePlan {
    let (w, h) = (width_px.max(1) as f64, height_px.max(1) as f64);
    let px_to_mm = A4_WIDTH_MM / w;
    let page_height_px = ((A4_HEIGHT_MM / px_to_mm).floor() as u32).max(1);

    if !multi_page || height_px <= page_height_px {
        let ratio = (A4_WIDTH_MM / w).min(A4_HEIGHT_MM / h) * FIT_MARGIN;
        let (w_mm, h_mm) = (w * ratio, h * ratio);
        return PagePlan::FitSingle(Placement {
            x_mm: (A4_WIDTH_MM - w_mm) / 2.0,
            y_mm: (A4_HEIGHT_MM - h_mm) / 2.0,
            w_mm,
            h_mm,
        });
    }

    let mut slices = Vec::new();
    let mut position = 0u32;
    while position < height_px {
        let slice_height = page_height_px.min(height_px - position);
        slices.push(Slice {
            y_px: position,
            height_px: slice_height,
            placement: Placement {
                x_mm: 0.0,
                y_mm: 0.0,
                w_mm: A4_WIDTH_MM,
                h_mm: slice_height as f64 * px_to_mm,
            },
        });
        position += slice_height;
    }
    PagePlan::Slices(slices)
}

/// Downscales `bitmap` to the pixel size `placement` needs at [`PRINT_DPI`].
/// Captures already at or below that size are kept as is.
fn fit_to_placement(bitmap: &Bitmap, placement: &Placement) -> Bitmap {
    let to_px = |mm: f64| (mm / 25.4 * PRINT_DPI).round().max(1.0) as u32;
    let (target_w, target_h) = (to_px(placement.w_mm), to_px(placement.h_mm));
    if bitmap.width() <= target_w && bitmap.height() <= target_h {
        return bitmap.clone();
    }
    imageops::resize(
        bitmap,
        target_w.min(bitmap.width()),
        target_h.min(bitmap.height()),
        FilterType::Triangle,
    )
}

fn encode_jpeg(bitmap: &Bitmap) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
        .encode(
            bitmap.as_raw(),
            bitmap.width(),
            bitmap.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Encodes `bitmap` into a PDF laid out according to `plan`.
pub fn write_pdf(bitmap: &Bitmap, plan: &PagePlan) -> Result<Vec<u8>, ExportError> {
    let pages: Vec<(Bitmap, Placement)> = match plan {
        PagePlan::FitSingle(placement) => vec![(fit_to_placement(bitmap, placement), *placement)],
        PagePlan::Slices(slices) => slices
            .iter()
            .map(|s| {
                let band = imageops::crop_imm(bitmap, 0, s.y_px, bitmap.width(), s.height_px);
                (band.to_image(), s.placement)
            })
            .collect(),
    };

    let catalog_id = Ref::new(1);
    let tree_id = Ref::new(2);
    // Each page takes three objects: the page, its image and its content stream.
    let page_refs: Vec<(Ref, Ref, Ref)> = (0..pages.len() as i32)
        .map(|i| {
            let base = 3 + i * 3;
            (Ref::new(base), Ref::new(base + 1), Ref::new(base + 2))
        })
        .collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids(page_refs.iter().map(|(page, _, _)| *page))
        .count(pages.len() as i32);

    let page_w_pt = (A4_WIDTH_MM * PT_PER_MM) as f32;
    let page_h_pt = (A4_HEIGHT_MM * PT_PER_MM) as f32;

    for ((image, placement), (page_id, image_id, content_id)) in pages.iter().zip(&page_refs) {
        let jpeg = encode_jpeg(image)?;

        let mut page = pdf.page(*page_id);
        page.media_box(Rect::new(0.0, 0.0, page_w_pt, page_h_pt));
        page.parent(tree_id);
        page.contents(*content_id);
        page.resources().x_objects().pair(IMAGE_NAME, *image_id);
        page.finish();

        let mut xobject = pdf.image_xobject(*image_id, &jpeg);
        xobject.filter(Filter::DctDecode);
        xobject.width(image.width() as i32);
        xobject.height(image.height() as i32);
        xobject.color_space().device_rgb();
        xobject.bits_per_component(8);
        xobject.finish();

        // PDF user space starts at the bottom-left corner.
        let w_pt = (placement.w_mm * PT_PER_MM) as f32;
        let h_pt = (placement.h_mm * PT_PER_MM) as f32;
        let x_pt = (placement.x_mm * PT_PER_MM) as f32;
        let y_pt = page_h_pt - (placement.y_mm * PT_PER_MM) as f32 - h_pt;

        let mut content = Content::new();
        content.save_state();
        content.transform([w_pt, 0.0, 0.0, h_pt, x_pt, y_pt]);
        content.x_object(IMAGE_NAME);
        content.restore_state();
        pdf.stream(*content_id, &content.finish());
    }

    Ok(pdf.finish())
}
