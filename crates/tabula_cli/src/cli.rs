use std::path::PathBuf;

use clap::{Args, Parser};

fn parse_filter(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((field, expected)) if !field.is_empty() => {
            Ok((field.to_string(), expected.to_string()))
        }
        _ => Err(format!("Expected FIELD=VALUE, got '{value}'")),
    }
}

/// Render a CSV/TSV table as formatted text, separated values or an XLSX sheet.
#[derive(Parser, Debug)]
#[command(name = "tabula")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Input table; the first line holds the field names
    pub input: PathBuf,

    /// JSON table layout (columns, headers, formats, widths, title, sort order)
    #[arg(long, value_name = "FILE")]
    pub layout: Option<PathBuf>,

    /// Input delimiter; defaults to tab for .tsv/.tab files and comma otherwise
    #[arg(long, short = 'd')]
    pub delimiter: Option<char>,

    #[command(flatten)]
    pub output: OutputTarget,

    /// Precede text output with a `#` header line matching the template
    #[arg(long)]
    pub header: bool,

    /// Keep only records whose FIELD displays as VALUE (repeatable)
    #[arg(long, value_name = "FIELD=VALUE", value_parser = parse_filter)]
    pub filter: Vec<(String, String)>,

    /// Stable-sort by FIELD, most significant first; replaces the layout's order
    #[arg(long = "sort-by", value_name = "FIELD")]
    pub sort_by: Vec<String>,

    /// Also write daily-rolling log files to DIR
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// Exactly one output form.
///
/// The optional values of `--tsv` and `--text` must be attached with `=`,
/// so a following positional argument is never taken as OUT or TEMPLATE.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct OutputTarget {
    /// Write separated values to OUT, or to standard output without OUT
    #[arg(long, value_name = "OUT", num_args = 0..=1, require_equals = true)]
    pub tsv: Option<Option<PathBuf>>,

    /// Write a single-sheet workbook to OUT
    #[arg(long, value_name = "OUT")]
    pub xlsx: Option<PathBuf>,

    /// Write one TEMPLATE line per record to standard output; without
    /// TEMPLATE the layout's `text_template` is used
    #[arg(long, value_name = "TEMPLATE", num_args = 0..=1, require_equals = true)]
    pub text: Option<Option<String>>,
}
