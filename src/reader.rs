//! Lazy CSV record reader.
//!
//! The first row defines the column names. Every following row becomes a
//! [`Record`] holding `(column, value)` pairs in header order. Values are
//! decoded with the configured encoding and never coerced.

use std::{
    collections::HashSet,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use encoding_rs::Encoding;
use log::debug;

use crate::error::{InventoryError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Physical row number, the header being row 1.
    pub row: usize,
    pub fields: Vec<(String, String)>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: std::io::Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

/// Single-pass iterator over the rows of a CSV file.
///
/// The file handle is owned by the reader and closed when it is dropped.
pub struct RecordReader {
    path: PathBuf,
    reader: csv::Reader<BufReader<File>>,
    headers: Vec<String>,
    encoding: &'static Encoding,
    record: csv::ByteRecord,
    row: usize,
}

impl RecordReader {
    pub fn open(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let file = File::open(path).map_err(|source| InventoryError::Io {
            action: "opening inventory source",
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = open_csv_reader(BufReader::new(file), delimiter);
        let raw_headers = reader
            .byte_headers()
            .map_err(|source| InventoryError::Csv {
                path: path.to_path_buf(),
                row: 1,
                source,
            })?
            .clone();
        let headers = decode_record(&raw_headers, encoding).ok_or(InventoryError::Encoding {
            path: path.to_path_buf(),
            row: 1,
            encoding: encoding.name(),
        })?;

        let mut seen = HashSet::new();
        if let Some(duplicate) = headers.iter().find(|h| !seen.insert(h.as_str())) {
            return Err(InventoryError::DuplicateColumn {
                path: path.to_path_buf(),
                column: duplicate.clone(),
            });
        }
        debug!("Opened {:?} with columns {:?}", path, headers);

        Ok(RecordReader {
            path: path.to_path_buf(),
            reader,
            headers,
            encoding,
            record: csv::ByteRecord::new(),
            row: 1,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for RecordReader {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.row + 1;
        match self.reader.read_byte_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => {
                self.row = row;
                let Some(values) = decode_record(&self.record, self.encoding) else {
                    return Some(Err(InventoryError::Encoding {
                        path: self.path.clone(),
                        row,
                        encoding: self.encoding.name(),
                    }));
                };
                let fields = self.headers.iter().cloned().zip(values).collect();
                Some(Ok(Record { row, fields }))
            }
            Err(source) => {
                self.row = row;
                Some(Err(InventoryError::Csv {
                    path: self.path.clone(),
                    row,
                    source,
                }))
            }
        }
    }
}

fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Option<Vec<String>> {
    record
        .iter()
        .map(|field| {
            let (text, _, had_errors) = encoding.decode(field);
            (!had_errors).then(|| text.into_owned())
        })
        .collect()
}
