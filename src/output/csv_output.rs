//! CSV output
//!
//! The column set is the sorted union of every key seen across the batch,
//! `url` included. Missing values become empty cells and lists are written
//! as JSON arrays.

use crate::crawler::{FieldValue, PageRecord};
use crate::output::traits::{OutputResult, RecordSink};
use std::collections::BTreeSet;
use std::io::Write;

const URL_COLUMN: &str = "url";

pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    pub fn into_inner(self) -> OutputResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()).into())
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_records(&mut self, records: &[PageRecord]) -> OutputResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let columns = columns(records);
        self.writer.write_record(&columns)?;

        for record in records {
            let row = columns
                .iter()
                .map(|column| cell(record, column))
                .collect::<OutputResult<Vec<String>>>()?;
            self.writer.write_record(&row)?;
        }

        self.writer.flush()?;
        Ok(())
    }
}

fn columns(records: &[PageRecord]) -> Vec<&str> {
    let mut names: BTreeSet<&str> = BTreeSet::new();
    names.insert(URL_COLUMN);
    for record in records {
        names.extend(record.fields.keys().map(String::as_str));
    }
    names.into_iter().collect()
}

fn cell(record: &PageRecord, column: &str) -> OutputResult<String> {
    if column == URL_COLUMN {
        return Ok(record.url.clone());
    }

    Ok(match record.fields.get(column) {
        None | Some(FieldValue::Missing) => String::new(),
        Some(FieldValue::Text(text)) => text.clone(),
        Some(FieldValue::List(values)) => serde_json::to_string(values)?,
    })
}
