//! Renderer contract between the layout model and concrete backends.

use thiserror::Error;

use crate::document::InvoiceDocument;

/// A rendered, downloadable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Suggested download name, e.g. `invoice-INV-1700000000000.pdf`.
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Rendering failure. Surfaced to the user through the notification channel,
/// never fatal to the form session.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The line-item table does not fit on a single page.
    #[error("document does not fit on a single page ({line_items} line items)")]
    PageOverflow { line_items: usize },

    #[error("pdf generation failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("pdf serialization failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders a laid-out invoice document into a concrete artifact.
pub trait DocumentRenderer {
    fn render(&self, document: &InvoiceDocument) -> Result<ExportArtifact, ExportError>;
}
