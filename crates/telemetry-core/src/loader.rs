//! Bootstrap device file parsing.
//!
//! The file is CSV with a header row. The first column of every data row is
//! the device identifier; remaining columns are ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// Read device identifiers from a CSV source, in row order.
///
/// Rows whose field count differs from the header are rejected, as is a
/// source with no header row at all. A stray `"` inside an unquoted field is
/// kept as part of the value.
pub fn read_device_ids<R: Read>(source: R) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(source);

    if reader.headers()?.is_empty() {
        return Err(Error::MissingHeader);
    }

    let mut ids = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(id) = record.get(0) {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

/// Open `path` and read its device identifiers.
pub fn read_device_file(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let file = File::open(path)?;
    read_device_ids(file)
}
