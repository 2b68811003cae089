//! Server-side export of a rendered resume view to PDF or Word.
//!
//! Both exports read the `.print` node of the rendered [`Document`]. The PDF path
//! widens that node to A4 width, captures it off the async executor, restores the
//! node's inline style and then paginates the capture. The Word path serializes a
//! sanitized clone.

pub mod dom;
pub mod error;
pub mod font_metrics;
pub mod layout;
pub mod pdf;
pub mod raster;
pub mod style;
pub mod word;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};
use uuid::Uuid;

pub use error::ExportError;

use dom::{Document, Element};
use raster::{Bitmap, RasterOptions, Rasterizer};
use style::BoxStyleSnapshot;

/// Class of the node every export captures.
pub const PRINT_MARKER: &str = "print";
/// A4 width at 96 dpi, forced on the captured node.
pub const CAPTURE_WIDTH: &str = "794px";

pub const PDF_MIME: &str = "application/pdf";
pub const PDF_FILE_NAME: &str = "resume.pdf";

/// A finished download.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Guards
// ────────────────────────────────────────────────────────────────────────────

/// Temporary capture styling on the live `.print` node. Dropping it puts the
/// original width/height/overflow declarations back, on every exit path.
struct StyleOverride<'a> {
    node: &'a mut Element,
    snapshot: BoxStyleSnapshot,
}

impl<'a> StyleOverride<'a> {
    fn apply(node: &'a mut Element) -> Self {
        let snapshot = node.style.snapshot_box();
        node.style.set("width", CAPTURE_WIDTH);
        node.style.set("overflow", "visible");
        Self { node, snapshot }
    }

    fn node(&self) -> &Element {
        self.node
    }
}

impl Drop for StyleOverride<'_> {
    fn drop(&mut self) {
        self.node.style.restore_box(&self.snapshot);
    }
}

/// Set of resume ids with an export currently running.
#[derive(Clone, Default)]
struct InFlight(Arc<Mutex<HashSet<Uuid>>>);

struct InFlightGuard {
    set: Arc<Mutex<HashSet<Uuid>>>,
    id: Uuid,
}

impl InFlight {
    fn try_acquire(&self, id: Uuid) -> Option<InFlightGuard> {
        let mut set = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        set.insert(id).then(|| InFlightGuard {
            set: Arc::clone(&self.0),
            id,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut set = self.set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        set.remove(&self.id);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ExportPipeline {
    rasterizer: Arc<dyn Rasterizer>,
    options: RasterOptions,
    in_flight: InFlight,
}

impl ExportPipeline {
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self {
            rasterizer,
            options: RasterOptions::default(),
            in_flight: InFlight::default(),
        }
    }

    /// Captures the `.print` node of `document` and paginates it into a PDF.
    ///
    /// `multi_page` comes from the template's capability flag; without it the
    /// capture is always fitted onto a single page.
    pub async fn export_pdf(
        &self,
        resume_id: Uuid,
        document: &mut Document,
        multi_page: bool,
    ) -> Result<ExportArtifact, ExportError> {
        let _running = self
            .in_flight
            .try_acquire(resume_id)
            .ok_or(ExportError::Busy)?;

        let node = document
            .find_by_class_mut(PRINT_MARKER)
            .ok_or(ExportError::MarkerMissing)?;
        let bitmap = self.capture(node).await?;
        debug!(
            %resume_id,
            width = bitmap.width(),
            height = bitmap.height(),
            "captured printable node"
        );

        let plan = pdf::plan_pages(bitmap.width(), bitmap.height(), multi_page);
        let page_count = plan.page_count();
        let bytes = tokio::task::spawn_blocking(move || pdf::write_pdf(&bitmap, &plan)).await??;

        info!(%resume_id, page_count, bytes = bytes.len(), "PDF export complete");
        Ok(ExportArtifact {
            file_name: PDF_FILE_NAME,
            mime: PDF_MIME,
            bytes,
            page_count,
        })
    }

    async fn capture(&self, node: &mut Element) -> Result<Bitmap, ExportError> {
        let styled = StyleOverride::apply(node);
        let subtree = styled.node().clone();
        let rasterizer = Arc::clone(&self.rasterizer);
        let options = self.options;
        tokio::task::spawn_blocking(move || rasterizer.rasterize(&subtree, &options)).await?
    }

    /// Serializes a sanitized copy of the `.print` node as a Word document.
    pub fn export_word(&self, document: &Document) -> Result<ExportArtifact, ExportError> {
        let node = document
            .find_by_class(PRINT_MARKER)
            .ok_or(ExportError::MarkerMissing)?;
        let html = word::build_word_document(node);
        Ok(ExportArtifact {
            file_name: word::WORD_FILE_NAME,
            mime: word::WORD_MIME,
            bytes: html.into_bytes(),
            page_count: 1,
        })
    }
}
