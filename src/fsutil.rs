//! Filesystem helpers: namespace-to-path derivation and store teardown.

use std::io;
use std::path::{Path, PathBuf};

/// Render a namespace as a filesystem-safe file stem.
///
/// Alphanumerics plus `.`, `_` and `-` pass through; everything else becomes
/// `_`. Collisions between sanitized names are caught at open time by the
/// namespace recorded inside the store file.
#[must_use]
pub fn sanitize_namespace(namespace: &str) -> String {
    namespace
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect()
}

/// Resolve the store file path for a namespace: `{root}/{namespace}.db`.
///
/// Without an explicit root this uses the OS cache directory (under a
/// crate-named folder), falling back to the temp dir when the platform has no
/// cache directory.
#[must_use]
pub fn store_path(root: Option<&Path>, namespace: &str) -> PathBuf {
    let root = root.map_or_else(default_root, Path::to_path_buf);
    root.join(format!("{}.db", sanitize_namespace(namespace)))
}

fn default_root() -> PathBuf {
    dirs_next::cache_dir().unwrap_or_else(std::env::temp_dir).join("larder")
}

/// Delete the store file and its SQLite WAL/SHM siblings. Missing files are
/// not an error.
pub fn remove_store_files(db_path: &Path) -> io::Result<()> {
    let mut wal = db_path.as_os_str().to_owned();
    wal.push("-wal");
    let mut shm = db_path.as_os_str().to_owned();
    shm.push("-shm");

    for path in [db_path.to_path_buf(), PathBuf::from(wal), PathBuf::from(shm)] {
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_passes_safe_characters() {
        assert_eq!(sanitize_namespace("reader.pages_v2-beta"), "reader.pages_v2-beta");
    }

    #[test]
    fn sanitize_replaces_separators() {
        assert_eq!(sanitize_namespace("a/b\\c d"), "a_b_c_d");
    }

    #[test]
    fn store_path_uses_explicit_root() {
        let p = store_path(Some(Path::new("/tmp/x")), "ns");
        assert_eq!(p, Path::new("/tmp/x/ns.db"));
    }

    #[test]
    fn remove_store_files_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        remove_store_files(&dir.path().join("nothing.db")).unwrap();
    }
}
