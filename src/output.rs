use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::Result;

/// Write `rows` as CSV with a header taken from the row type's field names.
///
/// An existing file is replaced. Returns the number of data rows written.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!("Data saved to {} ({} rows)", path.display(), rows.len());
    Ok(rows.len())
}
