//! Sequential, non-colliding report file names

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

fn numbered(dir: &Path, prefix: &str, n: u64, extension: &str) -> PathBuf {
    dir.join(format!("{}_{}.{}", prefix, n, extension))
}

/// First `<prefix>_<n>.<extension>` in `dir` that does not exist yet, `n` starting at 1.
///
/// Read-only lookup; use [`claim_report_path`] to reserve the file.
pub fn next_report_path(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    let mut n = 1;
    loop {
        let path = numbered(dir, prefix, n, extension);
        if !path.exists() {
            return path;
        }
        n += 1;
    }
}

/// Create `dir` if needed and atomically claim the smallest unused report number.
///
/// Returns the path together with the freshly created, empty file.
pub fn claim_report_path(dir: &Path, prefix: &str, extension: &str) -> io::Result<(PathBuf, File)> {
    fs::create_dir_all(dir)?;

    let mut n = 1;
    loop {
        let path = numbered(dir, prefix, n, extension);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_report_is_numbered_one() {
        let dir = TempDir::new().unwrap();
        let (path, _) = claim_report_path(dir.path(), "Report", "pdf").unwrap();
        assert_eq!(path, dir.path().join("Report_1.pdf"));
        assert!(path.exists());
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let reports = dir.path().join("nested").join("reports");
        let (path, _) = claim_report_path(&reports, "Report", "pdf").unwrap();
        assert_eq!(path, reports.join("Report_1.pdf"));
    }

    #[test]
    fn test_fills_smallest_gap() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Report_1.pdf"), b"").unwrap();
        fs::write(dir.path().join("Report_3.pdf"), b"").unwrap();

        assert_eq!(
            next_report_path(dir.path(), "Report", "pdf"),
            dir.path().join("Report_2.pdf")
        );
        let (path, _) = claim_report_path(dir.path(), "Report", "pdf").unwrap();
        assert_eq!(path, dir.path().join("Report_2.pdf"));
    }

    #[test]
    fn test_numbering_is_per_prefix() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Backend_1.pdf"), b"").unwrap();

        let (frontend, _) = claim_report_path(dir.path(), "Frontend", "pdf").unwrap();
        let (backend, _) = claim_report_path(dir.path(), "Backend", "pdf").unwrap();
        assert_eq!(frontend, dir.path().join("Frontend_1.pdf"));
        assert_eq!(backend, dir.path().join("Backend_2.pdf"));
    }

    #[test]
    fn test_consecutive_claims_never_reuse_a_number() {
        let dir = TempDir::new().unwrap();
        let (a, _) = claim_report_path(dir.path(), "Report", "pdf").unwrap();
        let (b, _) = claim_report_path(dir.path(), "Report", "pdf").unwrap();
        assert_ne!(a, b);
        assert_eq!(b, dir.path().join("Report_2.pdf"));
    }
}
