use crate::report::layout::{Align, Cell, FontWeight, Page, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use anyhow::Result;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb,
};

const PT_TO_MM: f32 = 25.4 / 72.0;
const CELL_PADDING_MM: f32 = 1.0;
const LAYER_NAME: &str = "Report";

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, weight: FontWeight) -> &IndirectFontRef {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

/// Serialises laid-out pages into an in-memory PDF document.
pub fn to_pdf_bytes(title: &str, pages: &[Page]) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow::anyhow!("failed to load Helvetica: {e:?}"))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| anyhow::anyhow!("failed to load Helvetica-Bold: {e:?}"))?,
    };

    for (idx, page) in pages.iter().enumerate() {
        let layer = if idx == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
            doc.get_page(p).get_layer(l)
        };
        draw_page(&layer, page, &fonts);
    }

    doc.save_to_bytes()
        .map_err(|e| anyhow::anyhow!("failed to serialise pdf: {e:?}"))
}

fn draw_page(layer: &PdfLayerReference, page: &Page, fonts: &Fonts) {
    layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    layer.set_outline_thickness(0.6);

    for cell in &page.cells {
        if cell.border {
            layer.add_line(border(cell));
        }
        if cell.text.is_empty() {
            continue;
        }

        let x = match cell.align {
            Align::Left => cell.x_mm + CELL_PADDING_MM,
            Align::Center => {
                cell.x_mm + ((cell.w_mm - approx_text_width_mm(&cell.text, cell.size_pt)) / 2.0).max(0.0)
            }
        };
        // Vertically centred baseline, measured from the bottom edge as PDF expects.
        let baseline_from_top = cell.y_mm + cell.h_mm / 2.0 + 0.3 * cell.size_pt * PT_TO_MM;
        let y = PAGE_HEIGHT_MM - baseline_from_top;

        layer.use_text(
            cell.text.clone(),
            cell.size_pt,
            Mm(x),
            Mm(y),
            fonts.get(cell.weight),
        );
    }
}

fn border(cell: &Cell) -> Line {
    let top = PAGE_HEIGHT_MM - cell.y_mm;
    let bottom = top - cell.h_mm;
    let left = cell.x_mm;
    let right = cell.x_mm + cell.w_mm;

    Line {
        points: vec![
            (Point::new(Mm(left), Mm(top)), false),
            (Point::new(Mm(right), Mm(top)), false),
            (Point::new(Mm(right), Mm(bottom)), false),
            (Point::new(Mm(left), Mm(bottom)), false),
        ],
        is_closed: true,
    }
}

/// Helvetica has no embedded metrics here; half an em per glyph is close enough for centring.
fn approx_text_width_mm(text: &str, size_pt: f32) -> f32 {
    text.chars().count() as f32 * 0.5 * size_pt * PT_TO_MM
}
