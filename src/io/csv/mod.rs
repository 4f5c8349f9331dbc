//! CSV attribute tables (read) and result records (write).

mod read;
mod write;

pub(crate) use read::*;
pub use write::{aggregate_header, contribution_header, CsvSink};
pub(crate) use write::{create_new_file, ensure_new_file};
