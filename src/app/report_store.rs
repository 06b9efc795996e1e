// JobRadar - app/report_store.rs
//
// Last-report persistence: the most recent scan report is kept in the data
// directory so it can be reviewed and exported after the scan has finished.
//
// - Saved atomically (write temp, rename) so a crash during save never
//   corrupts the previous report.
// - Load errors are discarded: a corrupt or incompatible file just means
//   "no previous report".

use crate::core::model::ScanReport;
use crate::platform::fs::write_atomic;
use crate::util::constants::REPORT_FILE_NAME;
use crate::util::error::ReportStoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Version stamp for forward-compatibility checks. Version mismatches
/// silently discard the stored report.
pub const REPORT_VERSION: u32 = 1;

/// On-disk wrapper around a finished scan report.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredReport {
    /// Schema version, must equal `REPORT_VERSION` to be accepted.
    pub version: u32,

    /// When the scan finished.
    pub finished_at: DateTime<Utc>,

    /// Lookback window the scan used.
    #[serde(default)]
    pub scan_depth_days: u32,

    pub report: ScanReport,
}

impl StoredReport {
    pub fn new(report: ScanReport, scan_depth_days: u32, finished_at: DateTime<Utc>) -> Self {
        Self {
            version: REPORT_VERSION,
            finished_at,
            scan_depth_days,
            report,
        }
    }
}

/// Resolve the report file path from the platform data directory.
pub fn report_path(data_dir: &Path) -> PathBuf {
    data_dir.join(REPORT_FILE_NAME)
}

/// Save `stored` to `path` atomically, creating parent directories as needed.
pub fn save(stored: &StoredReport, path: &Path) -> Result<(), ReportStoreError> {
    let json = serde_json::to_string_pretty(stored)
        .map_err(|e| ReportStoreError::Serialize { source: e })?;

    write_atomic(path, json.as_bytes()).map_err(|e| ReportStoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(
        path = %path.display(),
        matches = stored.report.matched_records.len(),
        "Report saved"
    );
    Ok(())
}

/// Load and validate a stored report. `None` on any error.
pub fn load(path: &Path) -> Option<StoredReport> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| {
            // "Not found" is the normal state before the first scan.
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), error = %e, "Cannot read report file");
            }
        })
        .ok()?;

    let stored: StoredReport = serde_json::from_str(&content)
        .map_err(|e| {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Report file is malformed; ignoring it"
            );
        })
        .ok()?;

    if stored.version != REPORT_VERSION {
        tracing::warn!(
            found = stored.version,
            expected = REPORT_VERSION,
            "Report file version mismatch; ignoring it"
        );
        return None;
    }

    tracing::info!(path = %path.display(), "Report file loaded");
    Some(stored)
}
