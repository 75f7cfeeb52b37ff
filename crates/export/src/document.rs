//! Printable invoice layout model.
//!
//! `InvoiceDocument` is a backend-agnostic description of the printable page:
//! plain strings in display order, with all currency values already formatted.
//! Renderers only place text; they never reach back into the domain.

use serde::{Deserialize, Serialize};

use facture_invoicing::{Invoice, TAX_RATE_PERCENT};

/// The line-item table: one header row, one row per item.
///
/// Columns are `[Description, Quantity, Rate, Amount]`; rate and amount are
/// formatted as `$` + two decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemTable {
    pub header: [String; 4],
    pub rows: Vec<[String; 4]>,
}

/// One right-aligned totals line (label + formatted amount).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalLine {
    pub label: String,
    pub amount: String,
}

/// Snapshot of everything the printable document shows, in display order:
/// title, invoice metadata, issuer block, client block, table, totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    pub title: String,
    pub meta_lines: Vec<String>,
    pub issuer_block: Vec<String>,
    pub client_block: Vec<String>,
    pub table: LineItemTable,
    pub totals_lines: Vec<TotalLine>,
    file_name: String,
}

impl InvoiceDocument {
    /// Lay out an immutable invoice snapshot.
    pub fn build(invoice: &Invoice) -> Self {
        let business = invoice.business();
        let client = invoice.client();

        let rows = invoice
            .line_items()
            .iter()
            .map(|item| {
                [
                    item.description().to_string(),
                    item.quantity().to_string(),
                    item.rate().to_string(),
                    item.amount().to_string(),
                ]
            })
            .collect();

        Self {
            title: "INVOICE".to_string(),
            meta_lines: vec![
                format!("Invoice #: {}", invoice.invoice_number()),
                format!("Date: {}", invoice.issue_date()),
                format!("Due Date: {}", invoice.due_date()),
            ],
            issuer_block: vec![
                business.name.clone(),
                business.address.clone(),
                business.email.clone(),
                business.phone.clone(),
            ],
            client_block: vec![
                client.name.clone(),
                client.email.clone(),
                client.address.clone(),
                client.phone.clone(),
            ],
            table: LineItemTable {
                header: [
                    "Description".to_string(),
                    "Quantity".to_string(),
                    "Rate".to_string(),
                    "Amount".to_string(),
                ],
                rows,
            },
            totals_lines: vec![
                TotalLine {
                    label: "Subtotal:".to_string(),
                    amount: invoice.subtotal().to_string(),
                },
                TotalLine {
                    label: format!("Tax ({TAX_RATE_PERCENT}%):"),
                    amount: invoice.tax().to_string(),
                },
                TotalLine {
                    label: "Total:".to_string(),
                    amount: invoice.total().to_string(),
                },
            ],
            file_name: format!("invoice-{}.pdf", invoice.invoice_number()),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use facture_core::{Aggregate, AggregateId, EntityId};
    use facture_invoicing::{
        AddLineItem, BusinessField, InvoiceCommand, InvoiceId, LineItemField, LineItemId,
        OpenInvoice, UpdateBusinessDetails, UpdateLineItem,
    };

    fn exec(invoice: &mut Invoice, command: InvoiceCommand) {
        let events = invoice.handle(&command).unwrap();
        for event in &events {
            invoice.apply(event);
        }
    }

    fn opened_invoice() -> Invoice {
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
        invoice
    }

    fn add_item(invoice: &mut Invoice, description: &str, quantity: &str, rate: &str) {
        let line_item_id = LineItemId::new(EntityId::new());
        exec(
            invoice,
            InvoiceCommand::AddLineItem(AddLineItem {
                invoice_id: invoice.id_typed(),
                line_item_id,
                occurred_at: Utc::now(),
            }),
        );
        for (field, value) in [
            (LineItemField::Description, description),
            (LineItemField::Quantity, quantity),
            (LineItemField::Rate, rate),
        ] {
            exec(
                invoice,
                InvoiceCommand::UpdateLineItem(UpdateLineItem {
                    invoice_id: invoice.id_typed(),
                    line_item_id,
                    field,
                    value: value.to_string(),
                    occurred_at: Utc::now(),
                }),
            );
        }
    }

    #[test]
    fn empty_invoice_has_empty_table_body_and_zero_totals() {
        let document = InvoiceDocument::build(&opened_invoice());

        assert!(document.table.rows.is_empty());
        assert_eq!(document.table.header[0], "Description");
        for line in &document.totals_lines {
            assert_eq!(line.amount, "$0.00");
        }
    }

    #[test]
    fn blocks_appear_in_display_order_with_formatted_values() {
        let mut invoice = opened_invoice();
        let invoice_id = invoice.id_typed();
        exec(
            &mut invoice,
            InvoiceCommand::UpdateBusinessDetails(UpdateBusinessDetails {
                invoice_id,
                field: BusinessField::Name,
                value: "Acme Studio".to_string(),
                occurred_at: Utc::now(),
            }),
        );
        add_item(&mut invoice, "Consulting", "3", "50.00");

        let document = InvoiceDocument::build(&invoice);

        assert_eq!(document.title, "INVOICE");
        assert_eq!(document.meta_lines[0], "Invoice #: INV-7");
        assert_eq!(document.meta_lines[1], "Date: 2026-08-07");
        assert_eq!(document.meta_lines[2], "Due Date: 2026-09-06");
        assert_eq!(document.issuer_block[0], "Acme Studio");
        assert_eq!(document.issuer_block.len(), 4);
        assert_eq!(document.client_block.len(), 4);
        assert_eq!(
            document.table.rows,
            vec![[
                "Consulting".to_string(),
                "3".to_string(),
                "$50.00".to_string(),
                "$150.00".to_string(),
            ]]
        );
        assert_eq!(document.totals_lines[0].amount, "$150.00");
        assert_eq!(document.totals_lines[1].label, "Tax (10%):");
        assert_eq!(document.totals_lines[1].amount, "$15.00");
        assert_eq!(document.totals_lines[2].amount, "$165.00");
    }

    #[test]
    fn file_name_follows_the_invoice_number() {
        let document = InvoiceDocument::build(&opened_invoice());
        assert_eq!(document.file_name(), "invoice-INV-7.pdf");
    }
}
