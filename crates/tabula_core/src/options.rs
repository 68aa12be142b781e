use std::collections::BTreeMap;

use crate::record::Record;
use crate::table::{resolve_headers, FieldFormats, RowSelection};

/// Default TSV delimiter.
pub const DEFAULT_SEPARATOR: &str = "\t";

/// Options for the text renderer.
#[derive(Debug, Default)]
pub struct TextOptions {
    /// Declared record fields; when set, the template is checked against
    /// them before anything is written.
    pub expected_fields: Option<Vec<String>>,
    pub rows: RowSelection,
}

/// Options for the tab-separated renderer.
#[derive(Debug)]
pub struct TsvOptions {
    pub rows: RowSelection,
    pub headers: Option<Vec<String>>,
    pub columns: Option<Vec<String>>,
    pub separator: String,
    pub field_formats: FieldFormats,
}

impl Default for TsvOptions {
    fn default() -> Self {
        Self {
            rows: RowSelection::default(),
            headers: None,
            columns: None,
            separator: DEFAULT_SEPARATOR.to_string(),
            field_formats: FieldFormats::default(),
        }
    }
}

/// Options for the spreadsheet renderer.
#[derive(Debug, Default)]
pub struct XlsxOptions {
    pub rows: RowSelection,
    pub headers: Option<Vec<String>>,
    pub columns: Option<Vec<String>>,
    pub field_formats: FieldFormats,
    /// Column width per field name; unlisted columns keep the default width.
    pub column_widths: BTreeMap<String, f64>,
    /// Merged title row above the headers.
    pub title: Option<String>,
}

/// Header and projection resolved against the first record of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub headers: Vec<String>,
    pub columns: Vec<String>,
}

impl ResolvedColumns {
    pub fn new(first: &Record, headers: Option<&[String]>, columns: Option<&[String]>) -> Self {
        let all_fields = first.field_names();
        Self {
            headers: resolve_headers(&all_fields, headers, columns),
            columns: columns.map_or(all_fields, <[String]>::to_vec),
        }
    }
}

macro_rules! layout_setters {
    ($ty:ty) => {
        impl $ty {
            pub fn rows(mut self, rows: RowSelection) -> Self {
                self.rows = rows;
                self
            }

            pub fn headers<I, S>(mut self, headers: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.headers = Some(headers.into_iter().map(Into::into).collect());
                self
            }

            pub fn columns<I, S>(mut self, columns: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.columns = Some(columns.into_iter().map(Into::into).collect());
                self
            }

            pub fn field_formats(mut self, formats: FieldFormats) -> Self {
                self.field_formats = formats;
                self
            }

            /// Headers and projection for a call whose first record is `first`.
            pub fn resolve_columns(&self, first: &Record) -> ResolvedColumns {
                ResolvedColumns::new(first, self.headers.as_deref(), self.columns.as_deref())
            }
        }
    };
}

layout_setters!(TsvOptions);
layout_setters!(XlsxOptions);

impl TsvOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

impl XlsxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn column_width(mut self, field: impl Into<String>, width: f64) -> Self {
        self.column_widths.insert(field.into(), width);
        self
    }
}

impl TextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expected_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn rows(mut self, rows: RowSelection) -> Self {
        self.rows = rows;
        self
    }
}
