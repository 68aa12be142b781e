use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tabula_core::{project_row, Record, Result, TsvOptions};
use tracing::{debug, info};

use crate::writer::TableWriter;

/// Write a header line and one separated line per selected record to `sink`.
///
/// Headers and the default projection come from the first record as given,
/// before sorting. Returns the number of data lines written; with no records
/// nothing is written.
pub fn render_tsv_stream<W: Write + ?Sized>(
    sink: &mut W,
    records: &[Record],
    options: &TsvOptions,
) -> Result<usize> {
    let Some(first) = records.first() else {
        return Ok(0);
    };
    let resolved = options.resolve_columns(first);
    options.field_formats.warn_unused(&first.field_names());

    writeln!(sink, "{}", resolved.headers.join(&options.separator))?;

    let mut count = 0;
    for record in options.rows.apply(records) {
        let values = project_row(record, &resolved.columns, &options.field_formats)?;
        let line: Vec<String> = values.iter().map(ToString::to_string).collect();
        writeln!(sink, "{}", line.join(&options.separator))?;
        count += 1;
    }
    debug!("Wrote {} of {} records as separated values", count, records.len());
    Ok(count)
}

impl<O: Write, S: Write> TableWriter<O, S> {
    /// Write records to `path`, or to the default output when `path` is
    /// `None`.
    ///
    /// Writing to a path ends with a count notice. The file is closed on every
    /// exit path; a failure part way leaves the partial file in place.
    pub fn write_tsv(
        &mut self,
        path: Option<&Path>,
        records: &[Record],
        options: &TsvOptions,
    ) -> Result<usize> {
        if records.is_empty() {
            let target = path.map_or_else(|| "<stdout>".to_string(), |p| p.display().to_string());
            self.notice_skipped(&target)?;
            return Ok(0);
        }
        let Some(path) = path else {
            let count = render_tsv_stream(&mut self.out, records, options)?;
            self.out.flush()?;
            return Ok(count);
        };

        let mut file = BufWriter::new(File::create(path)?);
        let count = render_tsv_stream(&mut file, records, options)?;
        file.flush()?;
        self.notice_wrote(count, path)?;
        info!("Wrote {} rows to {}", count, path.display());
        Ok(count)
    }
}

/// [`TableWriter::write_tsv`] on standard output.
pub fn write_tsv(path: Option<&Path>, records: &[Record], options: &TsvOptions) -> Result<usize> {
    TableWriter::new().write_tsv(path, records, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::{FieldFormats, RowSelection, TabulaError};

    fn capture() -> TableWriter<Vec<u8>, Vec<u8>> {
        TableWriter::with_streams(Vec::new(), Vec::new())
    }

    fn records() -> Vec<Record> {
        vec![
            Record::new().with("name", "a").with("score", 0.5),
            Record::new().with("name", "b").with("score", 0.25),
        ]
    }

    fn render(options: &TsvOptions) -> (usize, String) {
        let mut sink = Vec::new();
        let n = render_tsv_stream(&mut sink, &records(), options).unwrap();
        (n, String::from_utf8(sink).unwrap())
    }

    #[test]
    fn test_sorted_by_score() {
        let options = TsvOptions::new().rows(RowSelection::new().order_by_fields(["score"]));
        let (n, out) = render(&options);
        assert_eq!(n, 2);
        assert_eq!(out, "name\tscore\nb\t0.25\na\t0.5\n");
    }

    #[test]
    fn test_custom_separator_and_columns() {
        let options = TsvOptions::new().separator(",").columns(["score", "name"]);
        let (_, out) = render(&options);
        assert_eq!(out, "score,name\n0.5,a\n0.25,b\n");
    }

    #[test]
    fn test_headers_override_labels_only() {
        let options = TsvOptions::new().headers(["Name", "Score", "Extra"]);
        let (_, out) = render(&options);
        assert_eq!(out, "Name\tScore\tExtra\na\t0.5\nb\t0.25\n");
    }

    #[test]
    fn test_field_formats() {
        let formats = FieldFormats::from_map([("score", "{:.2f}"), ("missing", "{:5}")]).unwrap();
        let options = TsvOptions::new().field_formats(formats);
        let (_, out) = render(&options);
        assert_eq!(out, "name\tscore\na\t0.50\nb\t0.25\n");
    }

    #[test]
    fn test_select_counts_only_kept_rows() {
        let options = TsvOptions::new().rows(
            RowSelection::new().select(|r| r.get("name").and_then(|v| v.as_str()) == Some("b")),
        );
        let (n, out) = render(&options);
        assert_eq!(n, 1);
        assert_eq!(out, "name\tscore\nb\t0.25\n");
    }

    #[test]
    fn test_unknown_column_aborts() {
        let mut sink = Vec::new();
        let options = TsvOptions::new().columns(["name", "depth"]);
        let err = render_tsv_stream(&mut sink, &records(), &options).unwrap_err();
        assert!(matches!(err, TabulaError::UnknownField { .. }));
        // The header line was already written.
        assert_eq!(String::from_utf8(sink).unwrap(), "name\tdepth\n");
    }

    #[test]
    fn test_empty_stream_writes_nothing() {
        let mut sink = Vec::new();
        assert_eq!(render_tsv_stream(&mut sink, &[], &TsvOptions::new()).unwrap(), 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_write_to_default_output() {
        let mut writer = capture();
        let n = writer.write_tsv(None, &records(), &TsvOptions::new()).unwrap();
        assert_eq!(n, 2);
        let (out, status) = writer.into_streams();
        assert_eq!(String::from_utf8(out).unwrap(), "name\tscore\na\t0.5\nb\t0.25\n");
        assert!(status.is_empty());
    }

    #[test]
    fn test_write_to_file_reports_count() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let path = tmp.path().join("scores.tsv");
        let mut writer = capture();
        let n = writer
            .write_tsv(Some(path.as_path()), &records(), &TsvOptions::new())
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "name\tscore\na\t0.5\nb\t0.25\n"
        );
        let (out, status) = writer.into_streams();
        assert!(out.is_empty());
        assert_eq!(
            String::from_utf8(status).unwrap(),
            format!("      2 items WROTE: {}\n", path.display())
        );
    }

    #[test]
    fn test_write_empty_touches_no_file() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let path = tmp.path().join("empty.tsv");
        let mut writer = capture();
        assert_eq!(writer.write_tsv(Some(path.as_path()), &[], &TsvOptions::new()).unwrap(), 0);
        assert!(!path.exists());
        let (_, status) = writer.into_streams();
        assert_eq!(
            String::from_utf8(status).unwrap(),
            format!("      0 items. NOT WRITING {}\n", path.display())
        );
    }

    #[test]
    fn test_unwritable_path_is_io_error() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let path = tmp.path().join("no_such_dir").join("out.tsv");
        let mut writer = capture();
        let err = writer
            .write_tsv(Some(path.as_path()), &records(), &TsvOptions::new())
            .unwrap_err();
        assert!(matches!(err, TabulaError::Io(_)));
    }
}
