//! Lay a [`ReportDocument`] out on letter-sized pages and encode it with lopdf

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::layout::{pdf_safe, wrap, BlockStyle, ReportDocument};
use crate::error::ReportResult;

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 72;

struct TextStyle {
    font: &'static str,
    size: i64,
    leading: i64,
    /// Average glyph advance as a fraction of the font size.
    glyph_width: f64,
    color: [f64; 3],
}

impl TextStyle {
    fn for_block(style: BlockStyle) -> Self {
        match style {
            BlockStyle::Title => TextStyle {
                font: "F2",
                size: 18,
                leading: 22,
                glyph_width: 0.56,
                color: [0.0, 0.0, 0.0],
            },
            BlockStyle::Normal => TextStyle {
                font: "F1",
                size: 10,
                leading: 12,
                glyph_width: 0.5,
                color: [0.0, 0.0, 0.0],
            },
            BlockStyle::Success => TextStyle {
                font: "F1",
                size: 10,
                leading: 12,
                glyph_width: 0.5,
                color: [0.0, 0.5, 0.0],
            },
            BlockStyle::Failure => TextStyle {
                font: "F3",
                size: 9,
                leading: 11,
                glyph_width: 0.6,
                color: [0.8, 0.0, 0.0],
            },
        }
    }

    fn max_chars(&self) -> usize {
        let usable = (PAGE_WIDTH - 2 * MARGIN) as f64;
        (usable / (self.size as f64 * self.glyph_width)).floor() as usize
    }
}

/// Accumulates per-page content operations while tracking the cursor.
struct PageWriter {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: i64,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn line(&mut self, style: &TextStyle, text: &str) {
        if self.y - style.leading < MARGIN {
            self.break_page();
        }
        self.y -= style.leading;

        if text.is_empty() {
            return;
        }

        let [r, g, b] = style.color;
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![style.font.into(), Object::Integer(style.size)]),
            Operation::new("rg", vec![Object::Real(r as _), Object::Real(g as _), Object::Real(b as _)]),
            Operation::new("Td", vec![Object::Integer(MARGIN), Object::Integer(self.y)]),
            Operation::new("Tj", vec![Object::String(latin1(text), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn space(&mut self, points: i64) {
        self.y -= points;
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

/// Single-byte WinAnsi text for the standard fonts.
fn latin1(text: &str) -> Vec<u8> {
    pdf_safe(text).chars().map(|c| c as u32 as u8).collect()
}

fn paginate(report: &ReportDocument) -> Vec<Vec<Operation>> {
    let mut writer = PageWriter::new();

    for block in report.blocks() {
        let style = TextStyle::for_block(block.style);
        // wrap what is drawn, after markers expand to [OK]/[FAIL]
        for line in wrap(&pdf_safe(&block.text), style.max_chars()) {
            writer.line(&style, &line);
        }
        writer.space(block.space_after);
    }

    writer.finish()
}

/// Encode the report as an uncompressed PDF document.
pub fn encode(report: &ReportDocument) -> ReportResult<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font = |doc: &mut Document, base: &str| -> ObjectId {
        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base,
            "Encoding" => "WinAnsiEncoding",
        })
    };
    let regular = font(&mut doc, "Helvetica");
    let bold = font(&mut doc, "Helvetica-Bold");
    let mono = font(&mut doc, "Courier");

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
            "F3" => mono,
        },
    });

    let mut kids = Vec::new();
    for operations in paginate(report) {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(latin1(&report.title), StringFormat::Literal),
        "Producer" => Object::string_literal("agrored-report"),
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    Ok(doc)
}
