//! Preflight checks: is this machine ready to run the store client?
//!
//! Local checks only — runtime presence, client presence, free disk space.
//! The report is advisory; the caller decides whether warnings block.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::runtime::runner::run_with_timeout;
use crate::runtime::WineRunner;
use crate::store::backend::BackendSpec;

/// Free space below this many GB fails the disk check.
const DISK_FAIL_GB: u64 = 10;
/// Free space below this many GB warns.
const DISK_WARN_GB: u64 = 20;

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreflightStatus {
    /// Check passed
    Ok,
    /// Degraded but not blocking
    Warning,
    /// Blocking problem
    Failed,
}

impl PreflightStatus {
    /// Short label for reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Failed => "failed",
        }
    }
}

/// Which aspect a check covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreflightCheckKind {
    /// Wine/CrossOver runtime presence
    Runtime,
    /// Store client presence inside the bottle
    StoreClient,
    /// Free disk space at the application home
    DiskSpace,
}

impl PreflightCheckKind {
    /// Short label for reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Runtime => "runtime",
            Self::StoreClient => "store-client",
            Self::DiskSpace => "disk-space",
        }
    }
}

/// One check result.
#[derive(Debug, Clone)]
pub struct PreflightCheck {
    /// What was checked
    pub kind: PreflightCheckKind,
    /// Outcome
    pub status: PreflightStatus,
    /// Human-readable detail
    pub detail: String,
}

/// The full preflight report.
#[derive(Debug, Clone)]
pub struct PreflightReport {
    /// Individual checks, in a fixed order
    pub checks: Vec<PreflightCheck>,
}

impl PreflightReport {
    /// Kinds of checks that failed outright.
    pub fn blocking_failures(&self) -> Vec<PreflightCheckKind> {
        self.checks
            .iter()
            .filter(|check| check.status == PreflightStatus::Failed)
            .map(|check| check.kind)
            .collect()
    }
}

/// Run all checks for one backend.
pub fn run_checks(
    spec: &BackendSpec,
    app_home: &Path,
    client_executable: Option<PathBuf>,
) -> PreflightReport {
    let runtime_check = match WineRunner::locate_wine_binary() {
        Some(path) => PreflightCheck {
            kind: PreflightCheckKind::Runtime,
            status: PreflightStatus::Ok,
            detail: format!("Detected at {}.", path.display()),
        },
        None => PreflightCheck {
            kind: PreflightCheckKind::Runtime,
            status: PreflightStatus::Failed,
            detail: "Not detected. Install CrossOver or Wine to continue.".to_string(),
        },
    };

    let client_check = match client_executable {
        Some(path) => PreflightCheck {
            kind: PreflightCheckKind::StoreClient,
            status: PreflightStatus::Ok,
            detail: format!("Detected at {}.", path.display()),
        },
        None => PreflightCheck {
            kind: PreflightCheckKind::StoreClient,
            status: PreflightStatus::Warning,
            detail: format!(
                "{} not detected yet. Store setup will install it.",
                spec.display_name
            ),
        },
    };

    let disk_check = match available_disk_gb(app_home) {
        None => PreflightCheck {
            kind: PreflightCheckKind::DiskSpace,
            status: PreflightStatus::Warning,
            detail: "Could not determine available disk space.".to_string(),
        },
        Some(gb) if gb < DISK_FAIL_GB => PreflightCheck {
            kind: PreflightCheckKind::DiskSpace,
            status: PreflightStatus::Failed,
            detail: format!("Only {gb} GB available (recommended: at least {DISK_WARN_GB} GB)."),
        },
        Some(gb) if gb < DISK_WARN_GB => PreflightCheck {
            kind: PreflightCheckKind::DiskSpace,
            status: PreflightStatus::Warning,
            detail: format!("{gb} GB available (recommended: at least {DISK_WARN_GB} GB)."),
        },
        Some(gb) => PreflightCheck {
            kind: PreflightCheckKind::DiskSpace,
            status: PreflightStatus::Ok,
            detail: format!("{gb} GB available."),
        },
    };

    PreflightReport {
        checks: vec![runtime_check, client_check, disk_check],
    }
}

/// Free space at `path` in whole GB, via `df -k` (the path may not exist
/// yet; fall back to its closest existing ancestor).
fn available_disk_gb(path: &Path) -> Option<u64> {
    let mut probe = path;
    while !probe.exists() {
        probe = probe.parent()?;
    }

    let output = run_with_timeout(
        Path::new("/bin/df"),
        &["-k".to_string(), probe.to_string_lossy().into_owned()],
        &[],
        Duration::from_secs(10),
    )
    .ok()?;

    // Second line, fourth column: available 1K blocks.
    let data_line = output.output.lines().nth(1)?;
    let available_kb: u64 = data_line.split_whitespace().nth(3)?.parse().ok()?;
    let available_gb = available_kb / (1024 * 1024);
    debug!(path = %probe.display(), available_gb, "Disk space probed");
    Some(available_gb)
}
