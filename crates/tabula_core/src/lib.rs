// Record model, format mini-language and table options shared by the renderers.

pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod options;
pub mod record;
pub mod table;
pub mod template;
pub mod value;

pub use config::TableLayout;
pub use error::{Result, TabulaError};
pub use format::{format_value, FormatError, FormatSpec};
pub use options::{ResolvedColumns, TextOptions, TsvOptions, XlsxOptions, DEFAULT_SEPARATOR};
pub use record::Record;
pub use table::{project_row, resolve_headers, FieldFormats, RowSelection, SelectFn, SortKeyFn};
pub use template::{
    extract_field_names, header_template, template_header, validate_template_fields, Template,
};
pub use value::Value;
