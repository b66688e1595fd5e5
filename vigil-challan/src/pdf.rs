use std::path::Path;

use chrono::Utc;
use printpdf::image_crate::{self, DynamicImage};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfLayerReference,
};

use vigil_types::Violation;

// printpdf's Mm and transform fields are f32.
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 30.0;
const LINE_STEP_MM: f32 = 8.0;

// Bounded region the evidence image is scaled into.
const EVIDENCE_MAX_W_MM: f32 = 150.0;
const EVIDENCE_MAX_H_MM: f32 = 90.0;
const EVIDENCE_DPI: f32 = 300.0;

struct Cursor {
    layer: PdfLayerReference,
    y: f32,
}

impl Cursor {
    fn line(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        self.layer
            .use_text(text, size, Mm(MARGIN_MM), Mm(self.y), font);
        self.y -= LINE_STEP_MM;
    }

    fn gap(&mut self) {
        self.y -= LINE_STEP_MM / 2.0;
    }
}

/// Render the penalty document for an approved violation.
///
/// Evidence problems (missing file, undecodable image) degrade to explicit
/// markers in the document body and never fail the render.
pub(crate) fn render_challan(
    violation: &Violation,
    amount: u32,
    evidence_dir: &Path,
) -> Result<Vec<u8>, String> {
    let (doc, page, layer) = PdfDocument::new(
        "E-CHALLAN - TRAFFIC CONTROL",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "challan",
    );
    let layer = doc.get_page(page).get_layer(layer);
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| e.to_string())?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| e.to_string())?;

    let mut cur = Cursor {
        layer: layer.clone(),
        y: PAGE_HEIGHT_MM - MARGIN_MM,
    };

    cur.line("E-CHALLAN - TRAFFIC CONTROL", 22.0, &bold);
    cur.gap();

    let now = Utc::now();
    cur.line(&format!("Challan ID: {}", now.timestamp_millis()), 12.0, &regular);
    cur.line(&format!("Date: {}", now.to_rfc3339()), 12.0, &regular);
    cur.gap();

    let plate = violation
        .vehicle_plate
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or("UNKNOWN");
    cur.line(&format!("Vehicle Number: {plate}"), 12.0, &regular);
    cur.line(
        &format!("Violation Type: {}", violation.violation_type),
        12.0,
        &regular,
    );
    cur.line(&format!("Fine Amount: INR {amount}"), 12.0, &regular);
    if let Some(speed) = violation.speed_kmph {
        cur.line(&format!("Speed Recorded: {speed} kmph"), 12.0, &regular);
    }
    cur.gap();

    render_evidence(&doc_evidence_path(violation, evidence_dir), &mut cur, &bold, &regular);

    doc.save_to_bytes().map_err(|e| e.to_string())
}

fn doc_evidence_path(violation: &Violation, evidence_dir: &Path) -> Option<std::path::PathBuf> {
    let name = violation.evidence_image_path.trim();
    if name.is_empty() {
        return None;
    }
    Some(evidence_dir.join(name))
}

fn render_evidence(
    path: &Option<std::path::PathBuf>,
    cur: &mut Cursor,
    bold: &IndirectFontRef,
    regular: &IndirectFontRef,
) {
    let Some(path) = path.as_deref().filter(|p| p.exists()) else {
        cur.line("[EVIDENCE IMAGE NOT FOUND]", 12.0, regular);
        return;
    };

    match image_crate::open(path) {
        Ok(img) => {
            cur.line("EVIDENCE IMAGE:", 12.0, bold);
            cur.gap();
            embed_image(img, cur);
        }
        Err(err) => {
            eprintln!("evidence image {} failed to decode: {err}", path.display());
            cur.line("[Error loading evidence image]", 12.0, regular);
        }
    }
}

/// Place the image below the cursor, scaled to fit the bounded region.
fn embed_image(img: DynamicImage, cur: &mut Cursor) {
    // Strip alpha; PDF image XObjects carry plain RGB here.
    let img = DynamicImage::ImageRgb8(img.to_rgb8());
    let mm_per_px = 25.4 / EVIDENCE_DPI;
    let natural_w = img.width() as f32 * mm_per_px;
    let natural_h = img.height() as f32 * mm_per_px;
    let scale = (EVIDENCE_MAX_W_MM / natural_w)
        .min(EVIDENCE_MAX_H_MM / natural_h)
        .min(1.0);

    let y = (cur.y - natural_h * scale).max(MARGIN_MM / 2.0);
    Image::from_dynamic_image(&img).add_to_layer(
        cur.layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(MARGIN_MM)),
            translate_y: Some(Mm(y)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(EVIDENCE_DPI),
            ..Default::default()
        },
    );
    cur.y = y - LINE_STEP_MM;
}
