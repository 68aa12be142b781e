//! `tabula`: load a delimited table, apply an optional JSON layout and render
//! it as formatted text, separated values or a single-sheet workbook.
//!
//! ```bash
//! tabula goea.tsv --xlsx goea.xlsx --layout goea_layout.json
//! tabula goea.tsv --tsv --filter NS=BP --sort-by p_fdr_bh
//! tabula goea.tsv --text='{GO} {NS} {p_fdr_bh:8.2e} {name}\n' --header
//! ```

mod cli;
mod input;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tabula_core::logging::{init_logging, init_logging_to_dir, DEFAULT_FILTER};
use tabula_core::{Record, RowSelection, TableLayout};
use tabula_docs::{write_text_header, TableWriter};
use tracing::{debug, error, warn};
use tracing_appender::non_blocking::WorkerGuard;

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = setup_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(cli: &Cli) -> Option<WorkerGuard> {
    let filter = if cli.verbose { "debug" } else { DEFAULT_FILTER };
    let result = match &cli.log_dir {
        Some(dir) => init_logging_to_dir(dir, filter).map(Some),
        None => init_logging(filter).map(|()| None),
    };
    result.unwrap_or_else(|e| {
        eprintln!("Warning: {e:#}");
        None
    })
}

fn run(cli: &Cli) -> Result<()> {
    let mut layout = match &cli.layout {
        Some(path) => TableLayout::load_from_path(path)
            .with_context(|| format!("Failed to load layout {}", path.display()))?,
        None => TableLayout::default(),
    };
    if !cli.sort_by.is_empty() {
        layout.sort_by = cli.sort_by.clone();
    }

    let delimiter = input::delimiter_for(&cli.input, cli.delimiter)?;
    let records = input::read_records_from_path(&cli.input, delimiter)?;
    if let Some(first) = records.first() {
        for (field, _) in &cli.filter {
            if first.get(field).is_none() {
                warn!("Filter field '{}' is not in {}", field, cli.input.display());
            }
        }
    }

    let mut writer = TableWriter::new();
    let output = &cli.output;

    if let Some(path) = &output.tsv {
        let mut options = layout.to_tsv_options()?;
        options.rows = with_filters(options.rows, &cli.filter);
        writer
            .write_tsv(path.as_deref(), &records, &options)
            .context("Failed to write separated values")?;
    } else if let Some(path) = &output.xlsx {
        let mut options = layout.to_xlsx_options()?;
        options.rows = with_filters(options.rows, &cli.filter);
        writer
            .write_xlsx(path, &records, &options)
            .with_context(|| format!("Failed to write workbook {}", path.display()))?;
    } else if let Some(template) = &output.text {
        let template = match template.as_deref().or(layout.text_template.as_deref()) {
            Some(t) => unescape_template(t),
            None => bail!("--text needs a TEMPLATE or a layout with text_template"),
        };
        let mut options = layout.to_text_options();
        options.rows = with_filters(options.rows, &cli.filter);

        let mut sink = io::stdout().lock();
        if cli.header && !records.is_empty() {
            write_text_header(&mut sink, &template).context("Failed to write text header")?;
        }
        writer
            .render_text(&mut sink, &records, &template, &options)
            .context("Failed to render text")?;
        sink.flush()?;
    }
    Ok(())
}

/// Attach `FIELD=VALUE` filters as the row predicate; every filter must match.
fn with_filters(rows: RowSelection, filters: &[(String, String)]) -> RowSelection {
    if filters.is_empty() {
        return rows;
    }
    debug!("Filtering on {} field(s)", filters.len());
    let filters = filters.to_vec();
    rows.select(move |record: &Record| {
        filters.iter().all(|(field, expected)| {
            record.get(field).is_some_and(|v| v.to_string() == *expected)
        })
    })
}

/// Expand `\n` and `\t` typed on the command line, and end the template with
/// a newline.
fn unescape_template(raw: &str) -> String {
    let mut template = raw.replace("\\n", "\n").replace("\\t", "\t");
    if !template.ends_with('\n') {
        template.push('\n');
    }
    template
}
