use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{ColNum, Format, FormatBorder, RowNum, Workbook, Worksheet};
use tabula_core::{project_row, Record, Result, TabulaError, Value, XlsxOptions};
use tracing::{debug, info};

use crate::writer::TableWriter;

fn col_num(idx: usize) -> Result<ColNum> {
    ColNum::try_from(idx)
        .map_err(|_| TabulaError::Layout(format!("column index {idx} out of range")))
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    value: &Value,
    format: &Format,
) -> Result<()> {
    match value {
        Value::Null => worksheet.write_blank(row, col, format)?,
        Value::Bool(b) => worksheet.write_boolean_with_format(row, col, *b, format)?,
        Value::Int(i) => worksheet.write_number_with_format(row, col, *i as f64, format)?,
        Value::Float(x) if x.is_finite() => worksheet.write_number_with_format(row, col, *x, format)?,
        // Excel has no NaN/inf cells.
        Value::Float(_) => worksheet.write_string_with_format(row, col, value.to_string(), format)?,
        Value::Str(s) => worksheet.write_string_with_format(row, col, s.as_str(), format)?,
    };
    Ok(())
}

/// Assemble the single-sheet workbook; returns it with the data row count.
fn build_workbook(records: &[Record], options: &XlsxOptions) -> Result<(Workbook, usize)> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let header_format = Format::new()
        .set_border_top(FormatBorder::Thin)
        .set_border_bottom(FormatBorder::Thin)
        .set_bold();
    let body_format = Format::new().set_border(FormatBorder::None);

    let empty = Record::new();
    let first = records.first().unwrap_or(&empty);
    let fields = first.field_names();

    for (col, field) in fields.iter().enumerate() {
        if let Some(width) = options.column_widths.get(field) {
            worksheet.set_column_width(col_num(col)?, *width)?;
        }
    }

    let resolved = options.resolve_columns(first);
    let mut row: RowNum = 0;

    if let Some(title) = &options.title {
        let last_col = col_num(resolved.headers.len().saturating_sub(1))?;
        if last_col == 0 {
            worksheet.write_string_with_format(row, 0, title.as_str(), &header_format)?;
        } else {
            worksheet.merge_range(row, 0, row, last_col, title, &header_format)?;
        }
        row += 1;
    }

    for (col, header) in resolved.headers.iter().enumerate() {
        worksheet.write_string_with_format(row, col_num(col)?, header.as_str(), &header_format)?;
    }
    row += 1;
    let first_data_row = row;

    for record in options.rows.apply(records) {
        let values = project_row(record, &resolved.columns, &options.field_formats)?;
        for (col, value) in values.iter().enumerate() {
            write_cell(worksheet, row, col_num(col)?, value, &body_format)?;
        }
        row += 1;
    }

    let written = (row - first_data_row) as usize;
    debug!("Laid out {} of {} records in worksheet", written, records.len());
    Ok((workbook, written))
}

/// Render records into xlsx bytes without touching the filesystem.
///
/// With no records the sheet holds only the title and explicit headers.
pub fn render_xlsx_buffer(records: &[Record], options: &XlsxOptions) -> Result<Vec<u8>> {
    let (mut workbook, _) = build_workbook(records, options)?;
    Ok(workbook.save_to_buffer()?)
}

impl<O: Write, S: Write> TableWriter<O, S> {
    /// Write records into a one-sheet workbook at `path`.
    ///
    /// No file is created for an empty collection. The workbook is built in
    /// memory and only written once every row has been laid out.
    pub fn write_xlsx(
        &mut self,
        path: &Path,
        records: &[Record],
        options: &XlsxOptions,
    ) -> Result<usize> {
        if records.is_empty() {
            self.notice_skipped(&path.display().to_string())?;
            return Ok(0);
        }
        let (mut workbook, written) = build_workbook(records, options)?;
        workbook.save(path)?;
        self.notice_wrote(written, path)?;
        info!("Wrote {} rows to {}", written, path.display());
        Ok(written)
    }
}

/// [`TableWriter::write_xlsx`] with notices on standard output.
pub fn write_xlsx(path: &Path, records: &[Record], options: &XlsxOptions) -> Result<usize> {
    TableWriter::new().write_xlsx(path, records, options)
}
