#![expect(
    clippy::unwrap_used,
    reason = "Test utilities use .unwrap() for brevity"
)]

//! Shared test utilities for `bottlerack` unit tests.
//!
//! Only compiled during testing (`#[cfg(test)]`).

use tempfile::TempDir;

use crate::library::LibraryLayout;

/// Helper function to create a temporary test directory using tempfile.
/// Returns a `TempDir` that automatically cleans up when dropped.
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// The Steam library layout, used as the fixture layout across tests.
pub fn steam_layout() -> LibraryLayout {
    crate::store::StoreBackend::Steam
        .spec()
        .library
        .expect("Steam backend always has a library spec")
        .layout
}
