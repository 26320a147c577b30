//! Cleaned-dataset CSV writer.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::WriterBuilder;
use log::info;

use crate::error::OutputError;
use crate::session::{SESSION_HEADER, SessionRecord};

/// Write the header and every record to `writer`. The header is emitted even
/// when `records` is empty.
///
/// # Errors
///
/// Returns the underlying [`csv::Error`] if serialization or flushing fails.
pub fn write_sessions_to<W: Write>(writer: W, records: &[SessionRecord]) -> Result<(), csv::Error> {
    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(SESSION_HEADER)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the cleaned dataset to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an [`OutputError`] if the directory or file cannot be created or
/// written.
pub fn write_sessions(path: &Path, records: &[SessionRecord]) -> Result<usize, OutputError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| OutputError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let file = File::create(path).map_err(|source| OutputError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut buffered = BufWriter::new(file);
    write_sessions_to(&mut buffered, records).map_err(|source| OutputError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    buffered.flush().map_err(|source| OutputError::Flush {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Saved {} sessions to {}", records.len(), path.display());
    Ok(records.len())
}
