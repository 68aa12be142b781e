use std::io::{self, Stdout, Write};
use std::path::Path;

use tabula_core::Result;

/// Owns the streams a render call reports to.
///
/// `out` receives TSV output when no destination path is given; `status`
/// receives the one-line progress notices. Both are standard output by
/// default.
pub struct TableWriter<O: Write = Stdout, S: Write = Stdout> {
    pub(crate) out: O,
    status: S,
}

impl TableWriter {
    pub fn new() -> Self {
        Self {
            out: io::stdout(),
            status: io::stdout(),
        }
    }
}

impl Default for TableWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Write, S: Write> TableWriter<O, S> {
    pub fn with_streams(out: O, status: S) -> Self {
        Self { out, status }
    }

    pub fn out(&self) -> &O {
        &self.out
    }

    pub fn status(&self) -> &S {
        &self.status
    }

    pub fn into_streams(self) -> (O, S) {
        (self.out, self.status)
    }

    /// `      0 items. NOT WRITING <target>`
    pub(crate) fn notice_skipped(&mut self, target: &str) -> Result<()> {
        writeln!(self.status, "      0 items. NOT WRITING {target}")?;
        self.status.flush()?;
        Ok(())
    }

    /// `  <count> items WROTE: <path>`, count right-aligned in five columns.
    pub(crate) fn notice_wrote(&mut self, count: usize, path: &Path) -> Result<()> {
        writeln!(self.status, "  {count:>5} items WROTE: {}", path.display())?;
        self.status.flush()?;
        Ok(())
    }
}
