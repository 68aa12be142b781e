// Table renderers: formatted text, separated values and single-sheet XLSX.

pub mod text;
pub mod tsv;
pub mod writer;
pub mod xlsx;

pub use text::{render_text, write_text_header};
pub use tsv::{render_tsv_stream, write_tsv};
pub use writer::TableWriter;
pub use xlsx::{render_xlsx_buffer, write_xlsx};
