//! Saved search results, one pretty-printed JSON file per discipline and
//! job level.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use common::{JobLevel, JobRecord};
use tracing::{debug, info};

use crate::error::ExportError;

/// `{discipline}_{job_level}_jobs.json`
pub fn export_file_name(discipline: &str, job_level: JobLevel) -> String {
    format!("{discipline}_{}_jobs.json", job_level.slug())
}

/// Writes `records` to `dir`, creating it if needed, and returns the path.
pub fn write_json(
    records: &[JobRecord],
    dir: &Path,
    discipline: &str,
    job_level: JobLevel,
) -> Result<PathBuf, ExportError> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        debug!(dir = %dir.display(), "Created export directory");
    }
    let path = dir.join(export_file_name(discipline, job_level));
    let json = serde_json::to_string_pretty(records)?;
    fs::write(&path, json)?;
    info!(path = %path.display(), jobs = records.len(), "Saved jobs");
    Ok(path)
}

/// Loads a previous export. A missing file is an empty list.
pub fn read_json(
    dir: &Path,
    discipline: &str,
    job_level: JobLevel,
) -> Result<Vec<JobRecord>, ExportError> {
    let path = dir.join(export_file_name(discipline, job_level));
    match fs::read_to_string(&path) {
        Ok(json) => Ok(serde_json::from_str(&json)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// When the export for this discipline and level was last written.
pub fn last_export_time(
    dir: &Path,
    discipline: &str,
    job_level: JobLevel,
) -> Option<DateTime<Local>> {
    let path = dir.join(export_file_name(discipline, job_level));
    let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
    Some(DateTime::<Local>::from(modified))
}
