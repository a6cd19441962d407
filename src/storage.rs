//! Tabular storage
//!
//! Both stores keep their records in comma separated files with a header row. Loading
//! discards the header, skips rows whose field count does not match the schema and fails
//! on values that cannot be parsed. Persisting always rewrites the whole file through a
//! temporary file that is renamed over the target.

use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
    str::FromStr,
};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors reading or writing a backing file.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem error
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The file could not be read or written as CSV.
    #[error("invalid CSV in {}: {source}", path.display())]
    Csv {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: csv::Error,
    },

    /// A stored numeric field could not be parsed.
    #[error("{}:{line}: cannot parse {column} {value:?}: {reason}", path.display())]
    UnparsableValue {
        /// File being loaded
        path: PathBuf,
        /// 1-based line number of the row
        line: u64,
        /// Column name from the schema
        column: &'static str,
        /// Raw stored value
        value: String,
        /// Why the value was rejected
        reason: String,
    },
}

/// Summary of a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records loaded
    pub loaded: usize,

    /// Rows skipped because their field count did not match the schema
    pub skipped: usize,

    /// Whether the file was missing and has been created empty
    pub created: bool,
}

/// Rows read from a backing file, all with the expected field count.
#[derive(Debug, Default)]
pub(crate) struct Rows {
    pub(crate) records: Vec<StringRecord>,
    pub(crate) report: LoadReport,
}

/// Reads every data row of `path` that has exactly `width` fields.
///
/// A missing file is created empty and yields no rows.
pub(crate) fn read_rows(path: &Path, width: usize) -> Result<Rows, StorageError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            File::create(path).map_err(|source| io_error(path, source))?;

            info!(path = %path.display(), "created empty storage file");

            return Ok(Rows {
                records: Vec::new(),
                report: LoadReport {
                    created: true,
                    ..LoadReport::default()
                },
            });
        }
        Err(source) => return Err(io_error(path, source)),
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let mut rows = Rows::default();

    for result in reader.records() {
        let record = result.map_err(|source| csv_error(path, source))?;

        if record.len() != width {
            rows.report.skipped += 1;

            warn!(
                path = %path.display(),
                line = line_of(&record),
                fields = record.len(),
                expected = width,
                "skipping malformed row"
            );

            continue;
        }

        rows.records.push(record);
    }

    debug!(path = %path.display(), rows = rows.records.len(), "read storage file");

    Ok(rows)
}

/// Text of field `index`, or an empty string if the row is shorter.
pub(crate) fn text(record: &StringRecord, index: usize) -> String {
    record.get(index).unwrap_or_default().to_string()
}

/// Parses field `index` of a stored row.
pub(crate) fn parse<T>(
    path: &Path,
    record: &StringRecord,
    index: usize,
    column: &'static str,
) -> Result<T, StorageError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = record.get(index).unwrap_or_default();

    value
        .trim()
        .parse()
        .map_err(|error: T::Err| StorageError::UnparsableValue {
            path: path.to_path_buf(),
            line: line_of(record),
            column,
            value: value.to_string(),
            reason: error.to_string(),
        })
}

/// Replaces `path` with a header row followed by `rows`.
///
/// The rows are written to a temporary file in the same directory which is then renamed
/// over `path`, so readers observe either the old contents or the new ones.
pub(crate) fn write_rows<T, I>(path: &Path, header: &[&str], rows: I) -> Result<(), StorageError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|source| io_error(path, source))?;

    let mut count = 0_usize;

    {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(file.as_file_mut());

        writer
            .write_record(header.iter())
            .map_err(|source| csv_error(path, source))?;

        for row in rows {
            writer
                .serialize(row)
                .map_err(|source| csv_error(path, source))?;

            count += 1;
        }

        writer.flush().map_err(|source| io_error(path, source))?;
    }

    file.persist(path)
        .map_err(|error| io_error(path, error.error))?;

    debug!(path = %path.display(), rows = count, "persisted storage file");

    Ok(())
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, csv::Position::line)
}

fn io_error(path: &Path, source: io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn csv_error(path: &Path, source: csv::Error) -> StorageError {
    StorageError::Csv {
        path: path.to_path_buf(),
        source,
    }
}
