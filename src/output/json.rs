use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::report::Report;

pub const REPORT_FILE: &str = "sp-metadata-extra.json";

/// Write the report to `<data_dir>/sp-metadata-extra.json`, creating the
/// directory if needed. An existing report is replaced.
pub fn write(report: &Report, data_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(data_dir).map_err(|e| {
        Error::Report(format!("cannot create data directory {}: {e}", data_dir.display()))
    })?;

    let path = data_dir.join(REPORT_FILE);
    let json = report.to_json_pretty()?;
    fs::write(&path, json)
        .map_err(|e| Error::Report(format!("cannot write {}: {e}", path.display())))?;

    info!(path = %path.display(), "report written");
    Ok(path)
}
