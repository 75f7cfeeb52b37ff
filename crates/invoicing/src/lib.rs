//! Invoicing domain module.
//!
//! This crate contains the business rules for the invoice form: the invoice
//! aggregate, its mutation commands/events, and totals recomputation,
//! implemented purely as deterministic domain logic (no IO, no rendering,
//! no storage).

pub mod invoice;
pub mod totals;

pub use invoice::{
    AddLineItem, BusinessDetails, BusinessDetailsUpdated, BusinessField, ClientField, ClientInfo,
    ClientInfoUpdated, Invoice, InvoiceCommand, InvoiceEvent, InvoiceId, InvoiceOpened, LineItem,
    LineItemAdded, LineItemChange, LineItemField, LineItemId, LineItemRemoved, LineItemUpdated,
    OpenInvoice, RemoveLineItem, UpdateBusinessDetails, UpdateClientInfo, UpdateLineItem,
};
pub use totals::{TAX_RATE_PERCENT, Totals};
