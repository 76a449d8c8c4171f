use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb,
};

use super::layout::{paginate, DrawOp, LaidOutPage, PageLayout};
use super::{ReportDocument, ReportError};

const BAR_COLOR: (f32, f32, f32) = (0.13, 0.35, 0.55);
const RULE_COLOR: (f32, f32, f32) = (0.45, 0.45, 0.45);

const MM_PER_PT: f32 = 0.352_778;

/// Renders a composed document to PDF bytes. Pagination happens in the
/// pure layout pass; this writer only turns draw ops into page content,
/// so the only failure modes left are font registration and byte
/// serialization.
pub fn render_pdf(document: &ReportDocument) -> Result<Vec<u8>, ReportError> {
    let layout = PageLayout::default();
    let pages = paginate(document, &layout);

    let (doc, first_page, first_layer) = PdfDocument::new(
        &document.title,
        Mm(layout.width),
        Mm(layout.height),
        "content",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(ReportError::Font)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(ReportError::Font)?;

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) =
                doc.add_page(Mm(layout.width), Mm(layout.height), "content");
            doc.get_page(page_index).get_layer(layer_index)
        };
        draw_page(&layer, page, &layout, &regular, &bold);
    }

    doc.save_to_bytes().map_err(ReportError::Pdf)
}

fn draw_page(
    layer: &PdfLayerReference,
    page: &LaidOutPage,
    layout: &PageLayout,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    for op in &page.ops {
        match op {
            DrawOp::Text {
                x,
                y,
                size,
                bold: is_bold,
                text,
            } => {
                let font = if *is_bold { bold } else { regular };
                layer.use_text(
                    text.clone(),
                    *size,
                    Mm(*x),
                    Mm(layout.height - *y),
                    font,
                );
            }
            DrawOp::Bar {
                x,
                y,
                width,
                thickness,
            } => {
                stroke(
                    layer,
                    BAR_COLOR,
                    *thickness / MM_PER_PT,
                    (*x, layout.height - *y),
                    (*x + *width, layout.height - *y),
                );
            }
            DrawOp::Rule { y } => {
                stroke(
                    layer,
                    RULE_COLOR,
                    0.75,
                    (layout.margin, layout.height - *y),
                    (layout.width - layout.margin, layout.height - *y),
                );
            }
        }
    }
}

fn stroke(
    layer: &PdfLayerReference,
    color: (f32, f32, f32),
    thickness_pt: f32,
    from: (f32, f32),
    to: (f32, f32),
) {
    layer.set_outline_color(Color::Rgb(Rgb::new(color.0, color.1, color.2, None)));
    layer.set_outline_thickness(thickness_pt);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(from.0), Mm(from.1)), false),
            (Point::new(Mm(to.0), Mm(to.1)), false),
        ],
        is_closed: false,
    });
}
