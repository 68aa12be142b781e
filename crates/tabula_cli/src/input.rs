use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tabula_core::{Record, Value};
use tracing::debug;

/// Pick the input delimiter: an explicit ASCII character, else tab for
/// `.tsv`/`.tab` files and comma for anything else.
pub fn delimiter_for(path: &Path, explicit: Option<char>) -> Result<u8> {
    if let Some(c) = explicit {
        if !c.is_ascii() {
            bail!("Delimiter must be a single ASCII character, got '{c}'");
        }
        return Ok(c as u8);
    }
    let tab_separated = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("tab"));
    Ok(if tab_separated { b'\t' } else { b',' })
}

/// Parse delimited text into records. The first row names the fields; each
/// cell becomes a [`Value`] via [`Value::infer`].
pub fn read_records<R: Read>(input: R, delimiter: u8) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read table headers")?
        .iter()
        .map(String::from)
        .collect();

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("Failed to read table row {}", idx + 1))?;
        records.push(Record::from_pairs(
            headers
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| (name.as_str(), Value::infer(cell))),
        ));
    }
    debug!("Read {} records with {} fields", records.len(), headers.len());
    Ok(records)
}

pub fn read_records_from_path(path: &Path, delimiter: u8) -> Result<Vec<Record>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open input {}", path.display()))?;
    read_records(file, delimiter).with_context(|| format!("Failed to parse {}", path.display()))
}
