//! Installed-game discovery for a store library on disk
//!
//! A store root (the directory holding the client executable inside the
//! bottle) contains a manifest directory with one key/value manifest per
//! installed game, install directories under a "common apps" subpath, and
//! per-user config directories. Discovery is best-effort throughout: missing
//! directories and unreadable manifests yield empty results, never errors.
//!
//! Scan results are immutable snapshots, recomputed from the filesystem on
//! every scan and cached by [`LibraryFingerprint`] equality.

pub mod fingerprint;
pub mod manifest;
pub mod scanner;

pub use fingerprint::LibraryFingerprint;
pub use manifest::AppManifest;

use std::path::PathBuf;

/// Fixed path constants describing how a store lays out its library on disk.
///
/// The four supported backends share the discovery logic and differ only in
/// these constants (and in how the client executable is located, which the
/// store manager owns).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryLayout {
    /// Manifest directory under the store root (e.g. `steamapps`)
    pub manifest_dir: &'static str,
    /// Manifest filename prefix (e.g. `appmanifest_`)
    pub manifest_prefix: &'static str,
    /// Manifest filename extension, lowercase (e.g. `acf`)
    pub manifest_extension: &'static str,
    /// Install-directory parent under the manifest directory (e.g. `common`)
    pub apps_dir: &'static str,
    /// Per-user data directory under the store root (e.g. `userdata`)
    pub userdata_dir: &'static str,
    /// Config file path under each per-user directory
    /// (e.g. `config/localconfig.vdf`)
    pub config_relative_path: &'static str,
}

/// One executable found under a game's install directory, with its
/// heuristic score. Purely derived; recomputed each scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableCandidate {
    /// Path relative to the install directory, `/`-separated
    pub relative_path: String,
    /// Canonical absolute path on the host filesystem
    pub absolute_path: PathBuf,
    /// Heuristic score; higher is more likely the main executable
    pub score: i32,
}

/// An installed game as discovered from its manifest. Immutable snapshot,
/// replaced wholesale on each scan; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledGame {
    /// Store app id
    pub app_id: u32,
    /// Display name from the manifest
    pub name: String,
    /// Absolute install directory path
    pub install_directory_path: PathBuf,
    /// Executable candidates, best first
    pub executable_candidates: Vec<ExecutableCandidate>,
    /// Relative path of the top-scored candidate, if any
    pub default_executable_relative_path: Option<String>,
}
