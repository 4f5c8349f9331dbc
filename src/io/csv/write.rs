//! CSV writing operations.

use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
};

use anyhow::{anyhow, Context, Result};

use crate::error::AreaWeightError;
use crate::weight::{AggregateRecord, ContributionRecord, RecordSink};

/// Header of the aggregate file: `[to_id, aw_n, aw_a, attr_1, ..., attr_k]`.
pub fn aggregate_header(to_id: &str, attributes: &[String]) -> Vec<String> {
    let mut header = vec![to_id.to_string(), "aw_n".to_string(), "aw_a".to_string()];
    header.extend(attributes.iter().cloned());
    header
}

/// Header of the contribution file:
/// `[to_id, from_id, total_area, from_area, prop, attr_1, aw_attr_1, ...]`.
pub fn contribution_header(to_id: &str, from_id: &str, attributes: &[String]) -> Vec<String> {
    let mut header = vec![
        to_id.to_string(),
        from_id.to_string(),
        "total_area".to_string(),
        "from_area".to_string(),
        "prop".to_string(),
    ];
    for attribute in attributes {
        header.push(attribute.clone());
        header.push(format!("aw_{attribute}"));
    }
    header
}

/// Fail with a `Configuration` error if `path` already exists.
pub(crate) fn ensure_new_file(path: &Path, what: &'static str) -> Result<()> {
    if path.exists() {
        return Err(AreaWeightError::Configuration { what, path: path.to_path_buf() }.into());
    }
    Ok(())
}

/// Create `path`, refusing to touch an existing file.
pub(crate) fn create_new_file(path: &Path, what: &'static str) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => AreaWeightError::Configuration { what, path: path.to_path_buf() }.into(),
            _ => anyhow!(e).context(format!("[io::csv::write] Failed to create {what} file: {}", path.display())),
        })
}

/// Writes aggregate rows, and optionally contribution rows, as CSV.
pub struct CsvSink<O: Write, C: Write> {
    output: ::csv::Writer<O>,
    contrib: Option<::csv::Writer<C>>,
}

impl<O: Write, C: Write> CsvSink<O, C> {
    /// Wrap the writers and emit both headers.
    pub fn new(output: O, contrib: Option<C>, to_id: &str, from_id: &str, attributes: &[String]) -> Result<Self> {
        let mut output = ::csv::Writer::from_writer(output);
        output.write_record(aggregate_header(to_id, attributes))
            .context("[io::csv::write] Failed to write output header")?;

        let contrib = contrib.map(|writer| -> Result<_> {
            let mut writer = ::csv::Writer::from_writer(writer);
            writer.write_record(contribution_header(to_id, from_id, attributes))
                .context("[io::csv::write] Failed to write contribution header")?;
            Ok(writer)
        }).transpose()?;

        Ok(Self { output, contrib })
    }

    /// Flush both writers.
    pub fn flush(&mut self) -> Result<()> {
        self.output.flush().context("[io::csv::write] Failed to flush output")?;
        if let Some(contrib) = self.contrib.as_mut() {
            contrib.flush().context("[io::csv::write] Failed to flush contribution file")?;
        }
        Ok(())
    }

    /// Flush and hand back the underlying writers.
    pub fn into_inner(self) -> Result<(O, Option<C>)> {
        let output = self.output.into_inner()
            .map_err(|e| anyhow!("[io::csv::write] Failed to flush output: {}", e.error()))?;
        let contrib = self.contrib
            .map(|writer| writer.into_inner()
                .map_err(|e| anyhow!("[io::csv::write] Failed to flush contribution file: {}", e.error())))
            .transpose()?;
        Ok((output, contrib))
    }
}

impl<O: Write, C: Write> RecordSink for CsvSink<O, C> {
    fn contribution(&mut self, record: &ContributionRecord) -> Result<()> {
        let Some(writer) = self.contrib.as_mut() else { return Ok(()) };

        let mut row = vec![
            record.to_id.to_string(),
            record.from_id.to_string(),
            record.total_area.to_string(),
            record.from_area.to_string(),
            record.proportion.to_string(),
        ];
        for (value, share) in record.values.iter().zip(&record.shares) {
            row.push(value.to_string());
            row.push(share.to_string());
        }

        writer.write_record(&row)
            .context("[io::csv::write] Failed to write contribution row")
    }

    fn aggregate(&mut self, record: &AggregateRecord) -> Result<()> {
        let mut row = vec![
            record.to_id.to_string(),
            record.count.to_string(),
            record.total_area.to_string(),
        ];
        row.extend(record.sums.iter().map(f64::to_string));

        self.output.write_record(&row)
            .context("[io::csv::write] Failed to write output row")
    }
}
