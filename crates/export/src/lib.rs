//! Export adapter: turns an invoice snapshot into a downloadable document.
//!
//! The domain core's only contract with this crate is "immutable `Invoice`
//! snapshot in, artifact out"; nothing upstream depends on the artifact's
//! internal layout.

pub mod document;
pub mod pdf;
pub mod renderer;

pub use document::{InvoiceDocument, LineItemTable, TotalLine};
pub use pdf::PdfRenderer;
pub use renderer::{DocumentRenderer, ExportArtifact, ExportError};
