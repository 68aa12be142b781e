//! Row selection, header resolution and per-field formatting shared by all
//! renderers.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use crate::error::Result;
use crate::format::FormatError;
use crate::record::Record;
use crate::template::Template;
use crate::value::Value;

pub type SelectFn = Box<dyn Fn(&Record) -> bool>;
pub type SortKeyFn = Box<dyn Fn(&Record) -> Vec<Value>>;

/// Which records to emit, and in what order.
#[derive(Default)]
pub struct RowSelection {
    pub select: Option<SelectFn>,
    pub order_by: Option<SortKeyFn>,
}

impl fmt::Debug for RowSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowSelection")
            .field("select", &self.select.is_some())
            .field("order_by", &self.order_by.is_some())
            .finish()
    }
}

impl RowSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only records for which `predicate` returns true.
    pub fn select(mut self, predicate: impl Fn(&Record) -> bool + 'static) -> Self {
        self.select = Some(Box::new(predicate));
        self
    }

    /// Stable-sort records by the key `key` extracts.
    pub fn order_by(mut self, key: impl Fn(&Record) -> Vec<Value> + 'static) -> Self {
        self.order_by = Some(Box::new(key));
        self
    }

    /// Stable-sort by the values of `fields`; absent fields sort as `Null`.
    pub fn order_by_fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        self.order_by(move |record| {
            fields
                .iter()
                .map(|f| record.get(f).cloned().unwrap_or_default())
                .collect()
        })
    }

    pub fn keeps(&self, record: &Record) -> bool {
        self.select.as_ref().is_none_or(|pred| pred(record))
    }

    /// Sort the full collection, then drop records failing `select`.
    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        let mut rows: Vec<&Record> = records.iter().collect();
        if let Some(key) = &self.order_by {
            debug!("Sorting {} records", rows.len());
            rows.sort_by_cached_key(|r| key(r));
        }
        rows.retain(|r| self.keeps(r));
        rows
    }
}

/// Header labels: explicit `headers`, else `columns`, else the record's own
/// field names. Nothing is checked against the record shape.
pub fn resolve_headers(
    all_fields: &[String],
    headers: Option<&[String]>,
    columns: Option<&[String]>,
) -> Vec<String> {
    if let Some(headers) = headers {
        debug!("Using {} explicit headers", headers.len());
        return headers.to_vec();
    }
    if let Some(columns) = columns {
        debug!("Using {} projected columns as headers", columns.len());
        return columns.to_vec();
    }
    all_fields.to_vec()
}

/// Field name → value template (`"{:8.2e}"`), applied before emission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFormats {
    templates: BTreeMap<String, Template>,
}

impl FieldFormats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every entry of `map`; the first malformed template is an error.
    pub fn from_map<I, K, V>(map: I) -> std::result::Result<Self, FormatError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut formats = Self::new();
        for (field, template) in map {
            formats.insert(field, template.as_ref())?;
        }
        Ok(formats)
    }

    pub fn insert(
        &mut self,
        field: impl Into<String>,
        template: &str,
    ) -> std::result::Result<(), FormatError> {
        self.templates.insert(field.into(), Template::parse(template)?);
        Ok(())
    }

    pub fn get(&self, field: &str) -> Option<&Template> {
        self.templates.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Format `value` if `field` has an entry; otherwise return it unchanged.
    pub fn apply(&self, field: &str, value: &Value) -> std::result::Result<Value, FormatError> {
        match self.templates.get(field) {
            Some(template) => Ok(Value::Str(template.render_value(value)?)),
            None => Ok(value.clone()),
        }
    }

    /// Log entries that name fields the records do not have.
    pub fn warn_unused(&self, fields: &[String]) {
        for name in self.templates.keys() {
            if !fields.iter().any(|f| f == name) {
                warn!("Field format for '{}' matches no field; ignored", name);
            }
        }
    }
}

/// Project `columns` out of `record`, formatting fields that have an entry.
pub fn project_row(
    record: &Record,
    columns: &[String],
    formats: &FieldFormats,
) -> Result<Vec<Value>> {
    columns
        .iter()
        .map(|col| -> Result<Value> { Ok(formats.apply(col, record.require(col)?)?) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TabulaError;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn scored(name: &str, score: f64) -> Record {
        Record::new().with("name", name).with("score", score)
    }

    #[test]
    fn test_resolve_headers_priority() {
        let all = strings(&["a", "b", "c"]);
        let headers = strings(&["A", "B"]);
        let columns = strings(&["c", "a"]);
        assert_eq!(
            resolve_headers(&all, Some(headers.as_slice()), Some(columns.as_slice())),
            headers
        );
        assert_eq!(resolve_headers(&all, None, Some(columns.as_slice())), columns);
        assert_eq!(resolve_headers(&all, None, None), all);
    }

    #[test]
    fn test_selection_sorts_then_filters() {
        let records = vec![scored("a", 0.5), scored("b", 0.25), scored("c", 0.9)];
        let selection = RowSelection::new()
            .order_by_fields(["score"])
            .select(|r| r.get("score").and_then(Value::as_f64).unwrap_or(0.0) < 0.8);
        let names: Vec<String> = selection
            .apply(&records)
            .iter()
            .map(|r| r.get("name").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_selection_sort_is_stable() {
        let records = vec![
            scored("first", 1.0),
            scored("x", 0.0),
            scored("second", 1.0),
            scored("third", 1.0),
        ];
        let selection = RowSelection::new().order_by_fields(["score"]);
        let names: Vec<String> = selection
            .apply(&records)
            .iter()
            .map(|r| r.get("name").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["x", "first", "second", "third"]);
    }

    #[test]
    fn test_selection_default_keeps_input_order() {
        let records = vec![scored("b", 2.0), scored("a", 1.0)];
        let rows = RowSelection::default().apply(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some(&Value::from("b")));
    }

    #[test]
    fn test_multi_key_order() {
        let records = vec![
            Record::new().with("NS", "MF").with("depth", 1),
            Record::new().with("NS", "BP").with("depth", 2),
            Record::new().with("NS", "BP").with("depth", 5),
        ];
        let selection = RowSelection::new().order_by(|r| {
            let depth = r.get("depth").and_then(Value::as_f64).unwrap_or(0.0);
            vec![r.get("NS").cloned().unwrap_or_default(), Value::from(-depth)]
        });
        let depths: Vec<String> = selection
            .apply(&records)
            .iter()
            .map(|r| r.get("depth").unwrap().to_string())
            .collect();
        assert_eq!(depths, vec!["5", "2", "1"]);
    }

    #[test]
    fn test_field_formats_apply_only_to_listed_fields() {
        let formats = FieldFormats::from_map([("score", "{:.1f}")]).unwrap();
        assert_eq!(
            formats.apply("score", &Value::from(0.5)).unwrap(),
            Value::from("0.5")
        );
        assert_eq!(
            formats.apply("name", &Value::from("a")).unwrap(),
            Value::from("a")
        );
    }

    #[test]
    fn test_field_formats_reject_malformed_template() {
        assert!(FieldFormats::from_map([("p", "{:.f}")]).is_err());
    }

    #[test]
    fn test_project_row_with_formats() {
        let formats = FieldFormats::from_map([("score", "{:.1f}"), ("absent", "{:>4}")]).unwrap();
        let row = project_row(&scored("a", 0.26), &strings(&["score", "name"]), &formats).unwrap();
        assert_eq!(row, vec![Value::from("0.3"), Value::from("a")]);
    }

    #[test]
    fn test_project_row_unknown_column() {
        let err = project_row(&scored("a", 0.5), &strings(&["depth"]), &FieldFormats::new())
            .unwrap_err();
        assert!(matches!(err, TabulaError::UnknownField { ref field } if field == "depth"));
    }

    #[test]
    fn test_project_row_format_error_propagates() {
        let formats = FieldFormats::from_map([("name", "{:d}")]).unwrap();
        let err = project_row(&scored("a", 0.5), &strings(&["name"]), &formats).unwrap_err();
        assert!(matches!(err, TabulaError::Format(FormatError::UnknownCode { .. })));
    }
}
