use std::io::Write;

use tabula_core::{template_header, validate_template_fields, Record, Result, Template, TextOptions};
use tracing::debug;

use crate::writer::TableWriter;

impl<O: Write, S: Write> TableWriter<O, S> {
    /// Write one formatted `template` per selected record to `sink`.
    ///
    /// With no records, only a skip notice is written. When
    /// `expected_fields` is set, the template is validated before any output.
    pub fn render_text<W: Write + ?Sized>(
        &mut self,
        sink: &mut W,
        records: &[Record],
        template: &str,
        options: &TextOptions,
    ) -> Result<usize> {
        if records.is_empty() {
            self.notice_skipped(&format!("w/format_string({template})"))?;
            return Ok(0);
        }
        if let Some(expected) = &options.expected_fields {
            validate_template_fields(expected.as_slice(), template)?;
        }
        let template = Template::parse(template)?;

        let mut count = 0;
        for record in options.rows.apply(records) {
            sink.write_all(template.render(record)?.as_bytes())?;
            count += 1;
        }
        debug!("Rendered {} of {} records as text", count, records.len());
        Ok(count)
    }
}

/// [`TableWriter::render_text`] with notices on standard output.
pub fn render_text<W: Write + ?Sized>(
    sink: &mut W,
    records: &[Record],
    template: &str,
    options: &TextOptions,
) -> Result<usize> {
    TableWriter::new().render_text(sink, records, template, options)
}

/// Write `#` and the column header line that matches `template`.
pub fn write_text_header<W: Write + ?Sized>(sink: &mut W, template: &str) -> Result<()> {
    let header = template_header(template)?;
    write!(sink, "#{header}")?;
    Ok(())
}
