use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, TabulaError};
use crate::options::{TextOptions, TsvOptions, XlsxOptions, DEFAULT_SEPARATOR};
use crate::table::{FieldFormats, RowSelection};
use crate::template::Template;

/// The serializable part of a table's rendering options.
///
/// Loaded from JSON, e.g.
///
/// ```json
/// {
///   "columns": ["GO", "NS", "p_fdr_bh", "name"],
///   "field_formats": { "p_fdr_bh": "{:8.2e}" },
///   "column_widths": { "name": 60 },
///   "sort_by": ["NS", "p_fdr_bh"]
/// }
/// ```
///
/// Predicates cannot be expressed in a file; attach them to the converted
/// options with [`RowSelection::select`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableLayout {
    pub headers: Option<Vec<String>>,
    pub columns: Option<Vec<String>>,
    pub separator: Option<String>,
    pub field_formats: BTreeMap<String, String>,
    pub column_widths: BTreeMap<String, f64>,
    pub title: Option<String>,
    /// Fields to stable-sort by, most significant first.
    pub sort_by: Vec<String>,
    /// Line template for the text report.
    pub text_template: Option<String>,
    /// Declared fields to check `text_template` against.
    pub expected_fields: Option<Vec<String>>,
}

impl TableLayout {
    /// Returns the base directory: `~/.tabula`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| TabulaError::Layout("Could not determine home directory".into()))?;
        Ok(home.join(".tabula"))
    }

    /// Returns the logs directory: `~/.tabula/logs`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let layout: Self = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Load a layout from a JSON file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let layout = Self::from_json_str(&content)
            .map_err(|e| TabulaError::Layout(format!("{}: {e}", path.display())))?;
        info!("Loaded table layout from {}", path.display());
        Ok(layout)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject layouts whose templates cannot be parsed or whose separator is
    /// empty.
    pub fn validate(&self) -> Result<()> {
        if self.separator.as_deref() == Some("") {
            return Err(TabulaError::Layout("separator must not be empty".into()));
        }
        for (field, template) in &self.field_formats {
            Template::parse(template).map_err(|e| {
                TabulaError::Layout(format!("field format for '{field}': {e}"))
            })?;
        }
        if let Some(template) = &self.text_template {
            Template::parse(template)
                .map_err(|e| TabulaError::Layout(format!("text template: {e}")))?;
        }
        for (field, width) in &self.column_widths {
            if !width.is_finite() || *width < 0.0 {
                return Err(TabulaError::Layout(format!(
                    "column width for '{field}' must be a non-negative number"
                )));
            }
        }
        Ok(())
    }

    fn row_selection(&self) -> RowSelection {
        if self.sort_by.is_empty() {
            RowSelection::new()
        } else {
            RowSelection::new().order_by_fields(self.sort_by.clone())
        }
    }

    fn field_formats(&self) -> Result<FieldFormats> {
        Ok(FieldFormats::from_map(&self.field_formats)?)
    }

    pub fn to_tsv_options(&self) -> Result<TsvOptions> {
        Ok(TsvOptions {
            rows: self.row_selection(),
            headers: self.headers.clone(),
            columns: self.columns.clone(),
            separator: self
                .separator
                .clone()
                .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string()),
            field_formats: self.field_formats()?,
        })
    }

    pub fn to_xlsx_options(&self) -> Result<XlsxOptions> {
        Ok(XlsxOptions {
            rows: self.row_selection(),
            headers: self.headers.clone(),
            columns: self.columns.clone(),
            field_formats: self.field_formats()?,
            column_widths: self.column_widths.clone(),
            title: self.title.clone(),
        })
    }

    pub fn to_text_options(&self) -> TextOptions {
        TextOptions {
            expected_fields: self.expected_fields.clone(),
            rows: self.row_selection(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    const LAYOUT: &str = r#"{
        "columns": ["name", "score"],
        "field_formats": { "score": "{:.1f}" },
        "column_widths": { "name": 20 },
        "title": "Scores",
        "sort_by": ["score"]
    }"#;

    #[test]
    fn test_from_json_str() {
        let layout = TableLayout::from_json_str(LAYOUT).unwrap();
        assert_eq!(
            layout.columns,
            Some(vec!["name".to_string(), "score".to_string()])
        );
        assert_eq!(layout.column_widths.get("name"), Some(&20.0));
        assert_eq!(layout.sort_by, vec!["score"]);
        assert!(layout.separator.is_none());
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(
            TableLayout::from_json_str("{}").unwrap(),
            TableLayout::default()
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = TableLayout::from_json_str(r#"{"sep": ","}"#).unwrap_err();
        assert!(matches!(err, TabulaError::Json(_)));
    }

    #[test]
    fn test_bad_field_format_rejected() {
        let err = TableLayout::from_json_str(r#"{"field_formats": {"p": "{:.e}"}}"#).unwrap_err();
        assert!(err.to_string().contains("field format for 'p'"));
    }

    #[test]
    fn test_empty_separator_rejected() {
        assert!(TableLayout::from_json_str(r#"{"separator": ""}"#).is_err());
    }

    #[test]
    fn test_negative_width_rejected() {
        assert!(TableLayout::from_json_str(r#"{"column_widths": {"a": -1}}"#).is_err());
    }

    #[test]
    fn test_to_tsv_options_sorts_and_formats() {
        let opts = TableLayout::from_json_str(LAYOUT)
            .unwrap()
            .to_tsv_options()
            .unwrap();
        assert_eq!(opts.separator, "\t");
        let records = vec![
            Record::new().with("name", "a").with("score", 0.5),
            Record::new().with("name", "b").with("score", 0.25),
        ];
        let rows = opts.rows.apply(&records);
        assert_eq!(rows[0].get("name").unwrap().to_string(), "b");
        assert!(opts.field_formats.get("score").is_some());
    }

    #[test]
    fn test_to_xlsx_options_carries_sheet_settings() {
        let opts = TableLayout::from_json_str(LAYOUT)
            .unwrap()
            .to_xlsx_options()
            .unwrap();
        assert_eq!(opts.title.as_deref(), Some("Scores"));
        assert_eq!(opts.column_widths.get("name"), Some(&20.0));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let path = tmp.path().join("layout.json");
        let layout = TableLayout {
            separator: Some(",".into()),
            text_template: Some("{name}\n".into()),
            ..TableLayout::default()
        };
        layout.save_to_path(&path).unwrap();
        assert_eq!(TableLayout::load_from_path(&path).unwrap(), layout);
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let err = TableLayout::load_from_path(&tmp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, TabulaError::Io(_)));
    }
}
