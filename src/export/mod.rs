//! Document export.
//!
//! A finished case is handed to a [`DocumentExporter`] exactly once per
//! export action. [`HtmlExporter`] writes a printable, self-printing HTML file.

pub mod format;
mod html;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::drafts::{BlockReport, CeasedProfits, Draft, LegalDefense, WorkHistory};

pub use html::{document_title, escape_html, render_html, HtmlExporter};

/// Errors raised while exporting a document.
#[derive(Debug, Error)]
pub enum ExportError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The renderer refused the record.
    #[error("Render failed: {0}")]
    Render(String),
}

/// Complete, final case handed to an exporter.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    pub block_report: BlockReport,
    pub work_history: WorkHistory,
    pub ceased_profits: CeasedProfits,
    /// Generated defense (laws, arguments, next steps)
    pub legal_defense: LegalDefense,
    /// Defense text after user edits
    pub defense_text: String,
}

impl CaseRecord {
    /// Rebuild a case from a saved draft.
    ///
    /// Returns `None` unless the draft holds everything a document needs,
    /// which is only the case once a defense has been generated.
    pub fn from_draft(draft: &Draft) -> Option<Self> {
        let legal_defense = draft.generated_defense.clone()?;
        let defense_text =
            draft.legal_defense.clone().unwrap_or_else(|| legal_defense.structured_document.clone());

        Some(Self {
            block_report: draft.block_report.clone()?,
            work_history: draft.work_history.clone()?,
            ceased_profits: draft.ceased_profits.clone()?,
            legal_defense,
            defense_text,
        })
    }
}

/// Outcome of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    /// Document title
    pub title: String,
    /// Where the document was written, if it was written to disk
    pub location: Option<PathBuf>,
}

/// Renders a finished case into a printable representation.
pub trait DocumentExporter: Send + Sync {
    fn export(
        &self,
        record: &CaseRecord,
        generated_at: DateTime<Utc>,
    ) -> Result<ExportedDocument, ExportError>;
}
