//! Single-page PDF renderer backed by `lopdf`.
//!
//! Text placement is absolute: a cursor walks down a US-Letter page and each
//! block is emitted as `BT/Tf/Td/Tj/ET` runs against the built-in Helvetica
//! fonts, so the artifact needs no embedded font program.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tracing::debug;

use crate::document::InvoiceDocument;
use crate::renderer::{DocumentRenderer, ExportArtifact, ExportError};

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 54.0;
const LEADING: f32 = 14.0;
const BLOCK_GAP: f32 = 10.0;
const BODY_SIZE: f32 = 10.0;
const TITLE_SIZE: f32 = 18.0;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

/// Left edges of the Description / Quantity / Rate / Amount columns.
const COLUMNS: [f32; 4] = [MARGIN, 318.0, 396.0, 486.0];

/// Average Helvetica advance is close to half an em; good enough for
/// right-aligning short labels and amounts.
fn estimated_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5
}

struct PageWriter {
    operations: Vec<Operation>,
    y: f32,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            operations: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn text_at(&mut self, font: &str, size: f32, x: f32, text: &str) {
        self.operations.push(Operation::new("BT", vec![]));
        self.operations
            .push(Operation::new("Tf", vec![font.into(), size.into()]));
        self.operations
            .push(Operation::new("Td", vec![x.into(), self.y.into()]));
        self.operations
            .push(Operation::new("Tj", vec![Object::string_literal(text)]));
        self.operations.push(Operation::new("ET", vec![]));
    }

    fn line(&mut self, font: &str, text: &str) {
        self.text_at(font, BODY_SIZE, MARGIN, text);
        self.y -= LEADING;
    }

    fn table_row(&mut self, font: &str, cells: &[String; 4]) {
        for (x, cell) in COLUMNS.iter().zip(cells) {
            self.text_at(font, BODY_SIZE, *x, cell);
        }
        self.y -= LEADING;
    }

    fn total_line(&mut self, font: &str, label: &str, amount: &str) {
        let right_edge = PAGE_WIDTH - MARGIN;
        let amount_x = right_edge - estimated_width(amount, BODY_SIZE);
        let label_x = right_edge - 90.0 - estimated_width(label, BODY_SIZE);
        self.text_at(font, BODY_SIZE, label_x, label);
        self.text_at(font, BODY_SIZE, amount_x, amount);
        self.y -= LEADING;
    }

    fn gap(&mut self, points: f32) {
        self.y -= points;
    }
}

/// Renders an `InvoiceDocument` onto one US-Letter page.
#[derive(Debug, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, document: &InvoiceDocument) -> Result<ExportArtifact, ExportError> {
        let mut page = PageWriter::new();

        page.text_at(BOLD, TITLE_SIZE, MARGIN, &document.title);
        page.gap(TITLE_SIZE + BLOCK_GAP);

        for line in &document.meta_lines {
            page.line(REGULAR, line);
        }
        page.gap(BLOCK_GAP);

        for line in &document.issuer_block {
            page.line(REGULAR, line);
        }
        page.gap(BLOCK_GAP);

        for line in &document.client_block {
            page.line(REGULAR, line);
        }
        page.gap(LEADING);

        // TODO: paginate overflowing tables instead of refusing the export.
        let rows = document.table.rows.len();
        let required =
            (1 + rows + document.totals_lines.len()) as f32 * LEADING + 2.0 * BLOCK_GAP;
        if page.y - required < MARGIN {
            return Err(ExportError::PageOverflow { line_items: rows });
        }

        page.table_row(BOLD, &document.table.header);
        for row in &document.table.rows {
            page.table_row(REGULAR, row);
        }
        page.gap(BLOCK_GAP);

        if let Some((last, rest)) = document.totals_lines.split_last() {
            for total in rest {
                page.total_line(REGULAR, &total.label, &total.amount);
            }
            page.total_line(BOLD, &last.label, &last.amount);
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let font_bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                REGULAR => font_regular_id,
                BOLD => font_bold_id,
            },
        });

        let content = Content {
            operations: page.operations,
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;

        debug!(
            file_name = document.file_name(),
            bytes = bytes.len(),
            "rendered invoice pdf"
        );

        Ok(ExportArtifact {
            file_name: document.file_name().to_string(),
            content_type: "application/pdf",
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use facture_core::{Aggregate, AggregateId, EntityId};
    use facture_invoicing::{
        AddLineItem, Invoice, InvoiceCommand, InvoiceId, LineItemId, OpenInvoice,
    };

    fn exec(invoice: &mut Invoice, command: InvoiceCommand) {
        let events = invoice.handle(&command).unwrap();
        for event in &events {
            invoice.apply(event);
        }
    }

    fn opened_invoice(line_items: usize) -> Invoice {
        let invoice_id = InvoiceId::new(AggregateId::new());
        let mut invoice = Invoice::empty(invoice_id);
        exec(
            &mut invoice,
            InvoiceCommand::OpenInvoice(OpenInvoice {
                invoice_id,
                invoice_number: "INV-7".to_string(),
                issue_date: "2026-08-07".parse().unwrap(),
                due_date: "2026-09-06".parse().unwrap(),
                occurred_at: Utc::now(),
            }),
        );
        for _ in 0..line_items {
            exec(
                &mut invoice,
                InvoiceCommand::AddLineItem(AddLineItem {
                    invoice_id,
                    line_item_id: LineItemId::new(EntityId::new()),
                    occurred_at: Utc::now(),
                }),
            );
        }
        invoice
    }

    #[test]
    fn renders_a_pdf_artifact_for_an_empty_invoice() {
        let document = InvoiceDocument::build(&opened_invoice(0));
        let artifact = PdfRenderer::new().render(&document).unwrap();

        assert_eq!(artifact.file_name, "invoice-INV-7.pdf");
        assert_eq!(artifact.content_type, "application/pdf");
        assert!(artifact.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn renders_line_item_rows() {
        let document = InvoiceDocument::build(&opened_invoice(5));
        let artifact = PdfRenderer::new().render(&document).unwrap();
        assert!(!artifact.bytes.is_empty());
    }

    #[test]
    fn refuses_tables_that_overflow_the_page() {
        let document = InvoiceDocument::build(&opened_invoice(40));
        let err = PdfRenderer::new().render(&document).unwrap_err();
        assert!(matches!(err, ExportError::PageOverflow { line_items: 40 }));
    }
}
