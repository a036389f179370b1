use crate::report::table::{TickerTable, COLUMN_WIDTHS_MM, HEADERS};

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 10.0;
const BOTTOM_BREAK_MM: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 10.0;
const HEADING_GAP_MM: f32 = 5.0;
const SECTION_GAP_MM: f32 = 10.0;
const FULL_WIDTH_MM: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Title,
    Heading,
    HeaderCell,
    BodyCell,
}

/// A positioned text box; `y_mm` is measured from the top edge of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub kind: CellKind,
    pub x_mm: f32,
    pub y_mm: f32,
    pub w_mm: f32,
    pub h_mm: f32,
    pub text: String,
    pub size_pt: f32,
    pub weight: FontWeight,
    pub align: Align,
    pub border: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub cells: Vec<Cell>,
}

struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: MARGIN_MM,
        }
    }

    fn fits(&self, height: f32) -> bool {
        self.y + height <= PAGE_HEIGHT_MM - BOTTOM_BREAK_MM
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = MARGIN_MM;
    }

    fn push(&mut self, cell: Cell) {
        if let Some(page) = self.pages.last_mut() {
            page.cells.push(cell);
        }
    }

    fn line(&mut self, kind: CellKind, text: String, size_pt: f32, weight: FontWeight, align: Align) {
        self.push(Cell {
            kind,
            x_mm: MARGIN_MM,
            y_mm: self.y,
            w_mm: FULL_WIDTH_MM,
            h_mm: LINE_HEIGHT_MM,
            text,
            size_pt,
            weight,
            align,
            border: false,
        });
        self.y += LINE_HEIGHT_MM;
    }

    fn row(&mut self, kind: CellKind, texts: &[String], weight: FontWeight) {
        let mut x = MARGIN_MM;
        for (text, w) in texts.iter().zip(COLUMN_WIDTHS_MM) {
            self.push(Cell {
                kind,
                x_mm: x,
                y_mm: self.y,
                w_mm: w,
                h_mm: LINE_HEIGHT_MM,
                text: text.clone(),
                size_pt: 10.0,
                weight,
                align: Align::Left,
                border: true,
            });
            x += w;
        }
        self.y += LINE_HEIGHT_MM;
    }
}

/// Lays out the title block and one bordered table per ticker, breaking pages as needed.
///
/// A section heading is kept together with its header row and first body row; a table that
/// continues on a new page repeats its header row.
pub fn layout(title: &str, generated_line: &str, tables: &[TickerTable]) -> Vec<Page> {
    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    let mut cur = Cursor::new();

    cur.line(CellKind::Title, title.to_string(), 16.0, FontWeight::Bold, Align::Center);
    cur.line(CellKind::Title, generated_line.to_string(), 12.0, FontWeight::Regular, Align::Center);
    cur.y += SECTION_GAP_MM;

    for table in tables {
        let lead = LINE_HEIGHT_MM + HEADING_GAP_MM + 2.0 * LINE_HEIGHT_MM;
        if !cur.fits(lead) {
            cur.new_page();
        }

        cur.line(CellKind::Heading, table.heading(), 14.0, FontWeight::Bold, Align::Left);
        cur.y += HEADING_GAP_MM;
        cur.row(CellKind::HeaderCell, &header, FontWeight::Bold);

        for row in &table.rows {
            if !cur.fits(LINE_HEIGHT_MM) {
                cur.new_page();
                cur.row(CellKind::HeaderCell, &header, FontWeight::Bold);
            }
            cur.row(CellKind::BodyCell, row, FontWeight::Regular);
        }

        cur.y += SECTION_GAP_MM;
    }

    cur.pages
}
