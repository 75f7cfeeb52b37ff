//! The form session: one invoice, edited in place, synchronously.

use anyhow::Context;
use chrono::{Days, Utc};
use tracing::{debug, info, warn};

use facture_core::{Aggregate, AggregateId, DomainError, DomainResult, EntityId};
use facture_events::EventBus;
use facture_export::{DocumentRenderer, ExportArtifact, InvoiceDocument};
use facture_invoicing::{
    AddLineItem, BusinessField, ClientField, Invoice, InvoiceCommand, InvoiceId, LineItemField,
    LineItemId, OpenInvoice, RemoveLineItem, UpdateBusinessDetails, UpdateClientInfo,
    UpdateLineItem,
};

use crate::notification::Notification;

/// Owns the invoice for the lifetime of one form session.
///
/// Every operation runs to completion before the next read; the invoice is
/// never shared, so there is no locking anywhere in this crate.
pub struct FormSession<B: EventBus<Notification>> {
    invoice: Invoice,
    notifications: B,
}

impl<B: EventBus<Notification>> FormSession<B> {
    /// Open a session with a fresh invoice: today's issue date, payment due
    /// in 30 days, and a generated `INV-<millis>` invoice number.
    pub fn new(notifications: B) -> DomainResult<Self> {
        let now = Utc::now();
        let issue_date = now.date_naive();
        let due_date = issue_date
            .checked_add_days(Days::new(30))
            .ok_or_else(|| DomainError::invariant("due date out of calendar range"))?;

        let invoice_id = InvoiceId::new(AggregateId::new());
        let mut invoice = Invoice::empty(invoice_id);
        let events = invoice.handle(&InvoiceCommand::OpenInvoice(OpenInvoice {
            invoice_id,
            invoice_number: format!("INV-{}", now.timestamp_millis()),
            issue_date,
            due_date,
            occurred_at: now,
        }))?;
        for event in &events {
            invoice.apply(event);
        }

        info!(invoice_id = %invoice_id, "form session opened");
        Ok(Self {
            invoice,
            notifications,
        })
    }

    /// Current invoice state. Totals are already consistent with the line
    /// items; there is never a window where they are stale.
    pub fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    /// Run one mutation: decide, then apply every emitted event before the
    /// next read. `handle` is pure, so a failed command leaves the invoice
    /// exactly as it was and the session stays usable.
    pub fn dispatch(&mut self, command: InvoiceCommand) -> DomainResult<()> {
        let events = self.invoice.handle(&command)?;
        for event in &events {
            self.invoice.apply(event);
        }
        debug!(applied = events.len(), "command dispatched");
        Ok(())
    }

    pub fn set_business_field(
        &mut self,
        field: BusinessField,
        value: impl Into<String>,
    ) -> DomainResult<()> {
        self.dispatch(InvoiceCommand::UpdateBusinessDetails(
            UpdateBusinessDetails {
                invoice_id: self.invoice.id_typed(),
                field,
                value: value.into(),
                occurred_at: Utc::now(),
            },
        ))
    }

    pub fn set_client_field(
        &mut self,
        field: ClientField,
        value: impl Into<String>,
    ) -> DomainResult<()> {
        self.dispatch(InvoiceCommand::UpdateClientInfo(UpdateClientInfo {
            invoice_id: self.invoice.id_typed(),
            field,
            value: value.into(),
            occurred_at: Utc::now(),
        }))
    }

    /// Append a fresh line item and return its generated identifier.
    pub fn add_line_item(&mut self) -> DomainResult<LineItemId> {
        let line_item_id = LineItemId::new(EntityId::new());
        self.dispatch(InvoiceCommand::AddLineItem(AddLineItem {
            invoice_id: self.invoice.id_typed(),
            line_item_id,
            occurred_at: Utc::now(),
        }))?;
        Ok(line_item_id)
    }

    pub fn update_line_item(
        &mut self,
        line_item_id: LineItemId,
        field: LineItemField,
        value: impl Into<String>,
    ) -> DomainResult<()> {
        self.dispatch(InvoiceCommand::UpdateLineItem(UpdateLineItem {
            invoice_id: self.invoice.id_typed(),
            line_item_id,
            field,
            value: value.into(),
            occurred_at: Utc::now(),
        }))
    }

    pub fn remove_line_item(&mut self, line_item_id: LineItemId) -> DomainResult<()> {
        self.dispatch(InvoiceCommand::RemoveLineItem(RemoveLineItem {
            invoice_id: self.invoice.id_typed(),
            line_item_id,
            occurred_at: Utc::now(),
        }))
    }

    /// Persistence is not wired in; "save" only reports the outcome.
    pub fn save(&self) {
        info!(invoice_id = %self.invoice.id_typed(), "invoice saved");
        self.notify(Notification::success("Success", "Invoice has been saved"));
    }

    /// Export the current snapshot through `renderer`, reporting the outcome
    /// on the notification channel either way.
    pub fn export<R: DocumentRenderer>(&self, renderer: &R) -> anyhow::Result<ExportArtifact> {
        let document = InvoiceDocument::build(&self.invoice);
        match renderer.render(&document) {
            Ok(artifact) => {
                info!(file_name = %artifact.file_name, "invoice exported");
                self.notify(Notification::success(
                    "Success",
                    format!("Invoice exported as {}", artifact.file_name),
                ));
                Ok(artifact)
            }
            Err(err) => {
                warn!(error = %err, "invoice export failed");
                self.notify(Notification::error("Export failed", err.to_string()));
                Err(err).context("invoice export failed")
            }
        }
    }

    /// Fire-and-forget: a dead notification channel must not break the form.
    fn notify(&self, notification: Notification) {
        if let Err(err) = self.notifications.publish(notification) {
            warn!(?err, "failed to publish notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use facture_events::InMemoryEventBus;
    use facture_export::{ExportError, InvoiceDocument};

    use crate::notification::Severity;

    type Bus = Arc<InMemoryEventBus<Notification>>;

    fn session_with_bus() -> (FormSession<Bus>, facture_events::Subscription<Notification>) {
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let subscription = bus.subscribe();
        let session = FormSession::new(bus).unwrap();
        (session, subscription)
    }

    struct FailingRenderer;

    impl DocumentRenderer for FailingRenderer {
        fn render(&self, document: &InvoiceDocument) -> Result<ExportArtifact, ExportError> {
            Err(ExportError::PageOverflow {
                line_items: document.table.rows.len(),
            })
        }
    }

    #[test]
    fn fresh_session_has_generated_defaults() {
        let (session, _sub) = session_with_bus();
        let invoice = session.invoice();

        assert!(invoice.invoice_number().starts_with("INV-"));
        assert_eq!(
            invoice.due_date() - invoice.issue_date(),
            chrono::Duration::days(30)
        );
        assert!(invoice.line_items().is_empty());
        assert!(invoice.total().is_zero());
    }

    #[test]
    fn form_edits_flow_through_to_the_invoice() {
        let (mut session, _sub) = session_with_bus();

        session
            .set_business_field(BusinessField::Name, "Acme Studio")
            .unwrap();
        session
            .set_client_field(ClientField::Name, "Globex")
            .unwrap();
        let item = session.add_line_item().unwrap();
        session
            .update_line_item(item, LineItemField::Quantity, "3")
            .unwrap();
        session
            .update_line_item(item, LineItemField::Rate, "50.00")
            .unwrap();

        let invoice = session.invoice();
        assert_eq!(invoice.business().name, "Acme Studio");
        assert_eq!(invoice.client().name, "Globex");
        assert_eq!(invoice.total().to_string(), "$165.00");

        session.remove_line_item(item).unwrap();
        assert!(session.invoice().total().is_zero());
    }

    #[test]
    fn failed_edit_leaves_the_session_usable() {
        let (mut session, _sub) = session_with_bus();
        let item = session.add_line_item().unwrap();

        let err = session
            .update_line_item(item, LineItemField::Quantity, "three")
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));

        // The rejected keystroke changed nothing; the next edit still works.
        session
            .update_line_item(item, LineItemField::Quantity, "3")
            .unwrap();
        assert_eq!(session.invoice().line_item(item).unwrap().quantity(), 3);
    }

    #[test]
    fn save_publishes_a_success_notification() {
        let (session, sub) = session_with_bus();
        session.save();

        let notification = sub.try_recv().unwrap();
        assert_eq!(notification.severity, Severity::Success);
        assert_eq!(notification.title, "Success");
        assert_eq!(notification.description, "Invoice has been saved");
    }

    #[test]
    fn export_failure_surfaces_on_the_notification_channel() {
        let (session, sub) = session_with_bus();

        let err = session.export(&FailingRenderer).unwrap_err();
        assert!(err.to_string().contains("invoice export failed"));

        let notification = sub.try_recv().unwrap();
        assert_eq!(notification.severity, Severity::Error);
        assert_eq!(notification.title, "Export failed");
    }
}
