//! Error types for table rendering.

use crate::format::FormatError;

/// Errors that can occur while rendering a table.
#[derive(Debug, thiserror::Error)]
pub enum TabulaError {
    /// A text template names fields the records do not carry.
    ///
    /// `report` lists every template field, marking the missing ones.
    #[error("{report}")]
    TemplateFieldMismatch { template: String, report: String },

    /// A value could not be rendered with its format spec.
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// A projected column is not a field of the record.
    #[error("Unknown field: {field}")]
    UnknownField { field: String },

    /// The table layout could not be loaded or is inconsistent.
    #[error("Layout error: {0}")]
    Layout(String),

    /// JSON serialization / deserialization failed.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Workbook assembly or save failed.
    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tabula operations.
pub type Result<T> = std::result::Result<T, TabulaError>;
