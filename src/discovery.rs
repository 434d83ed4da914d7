//! Discovery Module for mockexec
//!
//! Recursively scans a source tree for `.rs` files and reports, per file,
//! which functions the transformer would instrument and which it would skip.

use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::transform::{transform_file, SkippedFunction, TransformOptions};

// ═══════════════════════════════════════════════════════════════════════════════
// REPORT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: PathBuf,
    pub instrumented: Vec<String>,
    pub skipped: Vec<SkippedFunction>,
    /// Set when the file could not be read or parsed.
    pub error: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISCOVERY
// ═══════════════════════════════════════════════════════════════════════════════

/// Report on every `.rs` file under `dir`, sorted by path.
pub fn discover(dir: &Path, options: &TransformOptions) -> Vec<FileReport> {
    let files = find_rs_files(dir);
    tracing::debug!(dir = %dir.display(), files = files.len(), "scanning");

    let mut reports: Vec<FileReport> = files
        .par_iter()
        .map(|path| match transform_file(path, options) {
            Ok(output) => FileReport {
                path: path.clone(),
                instrumented: output.instrumented,
                skipped: output.skipped,
                error: None,
            },
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "cannot scan file");
                FileReport {
                    path: path.clone(),
                    instrumented: Vec::new(),
                    skipped: Vec::new(),
                    error: Some(format!("{}: {}", e.code(), e)),
                }
            }
        })
        .collect();

    reports.sort_by(|a, b| a.path.cmp(&b.path));
    reports
}

/// Recursively find all .rs files, skipping build output and hidden entries
fn find_rs_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_ignored(entry))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
        .filter(|path| path.extension().map(|ext| ext == "rs").unwrap_or(false))
        .collect()
}

fn is_ignored(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && name == "target")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_reports_each_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::create_dir_all(dir.path().join("target/debug")).unwrap();

        fs::write(
            src.join("lib.rs"),
            "pub fn greet(s: String) -> String { s }\nfn borrow(s: &str) -> usize { s.len() }\n",
        )
        .unwrap();
        fs::write(src.join("nested/broken.rs"), "fn broken( {").unwrap();
        fs::write(src.join(".mockexec-abc.rs"), "fn hidden() {}").unwrap();
        fs::write(dir.path().join("target/debug/build.rs"), "fn build() {}").unwrap();
        fs::write(src.join("notes.txt"), "fn not_rust() {}").unwrap();

        let reports = discover(dir.path(), &TransformOptions::default());
        let paths: Vec<PathBuf> = reports.iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths, vec![src.join("lib.rs"), src.join("nested/broken.rs")]);

        let lib = &reports[0];
        assert_eq!(lib.instrumented, vec!["greet"]);
        assert_eq!(lib.skipped.len(), 1);
        assert_eq!(lib.skipped[0].name, "borrow");
        assert!(lib.error.is_none());

        let broken = &reports[1];
        assert!(broken.error.as_deref().unwrap().starts_with(crate::error::ERR_PARSE));
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let reports = discover(Path::new("/definitely/not/here"), &TransformOptions::default());
        assert!(reports.is_empty());
    }
}
