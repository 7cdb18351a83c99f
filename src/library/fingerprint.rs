//! Library cache fingerprinting
//!
//! Equality of two fingerprints means the on-disk manifest set is unchanged,
//! so a cached scan result may be reused without re-walking install
//! directories.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::LibraryLayout;

/// Name, mtime and size of one manifest file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFingerprint {
    /// Manifest file name
    pub file_name: String,
    /// Last modification time (`UNIX_EPOCH` when unavailable)
    pub modified: SystemTime,
    /// File size in bytes
    pub size: u64,
}

/// Cache-validity key for one store library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryFingerprint {
    /// Store root the fingerprint was taken for
    pub root_path: PathBuf,
    /// Manifest triples, sorted by file name
    pub manifests: Vec<ManifestFingerprint>,
}

impl LibraryFingerprint {
    /// Collect the fingerprint for `store_root`. A missing manifest
    /// directory yields an empty manifest list (which still fingerprints
    /// the root path).
    pub fn collect(store_root: &Path, layout: &LibraryLayout) -> Self {
        let manifests_dir = store_root.join(layout.manifest_dir);
        let mut manifests = Vec::new();

        if let Ok(entries) = std::fs::read_dir(&manifests_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                    continue;
                };
                let extension = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(str::to_lowercase);
                if !file_name.starts_with(layout.manifest_prefix)
                    || file_name.starts_with('.')
                    || extension.as_deref() != Some(layout.manifest_extension)
                {
                    continue;
                }
                let Ok(metadata) = entry.metadata() else {
                    continue;
                };
                if !metadata.is_file() {
                    continue;
                }
                manifests.push(ManifestFingerprint {
                    file_name: file_name.to_string(),
                    modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                    size: metadata.len(),
                });
            }
        }

        manifests.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Self {
            root_path: store_root.to_path_buf(),
            manifests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_dir, steam_layout};

    #[test]
    fn test_fingerprint_stable_for_unchanged_tree() {
        let dir = create_test_dir();
        let steamapps = dir.path().join("steamapps");
        std::fs::create_dir_all(&steamapps).unwrap();
        std::fs::write(steamapps.join("appmanifest_220.acf"), "\"AppState\"\n{\n}\n").unwrap();

        let first = LibraryFingerprint::collect(dir.path(), &steam_layout());
        let second = LibraryFingerprint::collect(dir.path(), &steam_layout());
        assert_eq!(first, second);
        assert_eq!(first.manifests.len(), 1);
    }

    #[test]
    fn test_fingerprint_changes_when_manifest_content_changes() {
        let dir = create_test_dir();
        let steamapps = dir.path().join("steamapps");
        std::fs::create_dir_all(&steamapps).unwrap();
        let manifest = steamapps.join("appmanifest_220.acf");
        std::fs::write(&manifest, "a").unwrap();

        let before = LibraryFingerprint::collect(dir.path(), &steam_layout());
        std::fs::write(&manifest, "longer contents").unwrap();
        let after = LibraryFingerprint::collect(dir.path(), &steam_layout());
        assert_ne!(before, after);
    }

    #[test]
    fn test_fingerprint_ignores_non_manifest_files() {
        let dir = create_test_dir();
        let steamapps = dir.path().join("steamapps");
        std::fs::create_dir_all(&steamapps).unwrap();
        std::fs::write(steamapps.join("libraryfolders.vdf"), "x").unwrap();
        std::fs::write(steamapps.join("appmanifest_1.txt"), "x").unwrap();

        let fingerprint = LibraryFingerprint::collect(dir.path(), &steam_layout());
        assert!(fingerprint.manifests.is_empty());
    }

    #[test]
    fn test_missing_directory_fingerprints_root_only() {
        let dir = create_test_dir();
        let fingerprint = LibraryFingerprint::collect(&dir.path().join("gone"), &steam_layout());
        assert!(fingerprint.manifests.is_empty());
        assert_eq!(fingerprint.root_path, dir.path().join("gone"));
    }
}
