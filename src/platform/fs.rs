// JobRadar - platform/fs.rs
//
// Filesystem helpers shared by the config store and report persistence.

use std::io;
use std::path::Path;

/// Write `bytes` to `path` atomically: write a sibling temp file, then rename.
///
/// Parent directories are created as needed. A crash between write and rename
/// loses the new content but never corrupts the previous file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path).map_err(|e| {
        // Clean up the temp file on failure; ignore any secondary error.
        let _ = std::fs::remove_file(&tmp);
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn test_write_atomic_overwrites_stale_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_report.json");
        std::fs::write(dir.path().join("last_report.json.tmp"), b"garbage").unwrap();
        write_atomic(&path, b"{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        assert!(!dir.path().join("last_report.json.tmp").exists());
    }
}
