//! Library scanning: manifest discovery, executable candidates, config files
//!
//! The executable walk is bounded (depth 7, 12,000 visited entries) and
//! prunes whole subtrees whose path contains known non-game tokens
//! (redistributables, anti-cheat support folders). Candidates are scored
//! heuristically; the scan is deterministic for a fixed directory tree.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{AppManifest, ExecutableCandidate, InstalledGame, LibraryLayout};

/// Maximum directory depth below the install directory.
const MAX_WALK_DEPTH: usize = 7;
/// Maximum filesystem entries visited per install directory.
const MAX_WALK_ENTRIES: usize = 12_000;
/// Path segment marking the bottle's emulated C: drive.
const DRIVE_C_MARKER: &str = "/drive_c/";

/// Path tokens whose presence disqualifies an entire subtree.
const SKIP_TOKENS: [&str; 5] = ["redist", "_commonredist", "directx", "vcredist", "support"];

/// The store root is the directory containing the client executable.
pub fn store_root(client_executable_path: &Path) -> PathBuf {
    client_executable_path
        .parent()
        .map_or_else(|| client_executable_path.to_path_buf(), Path::to_path_buf)
}

/// Discover installed games under `store_root`.
///
/// Lists manifests under the layout's manifest directory, parses each, and
/// walks the matching install directory for executable candidates. Missing
/// or unreadable manifests are skipped; a missing root yields an empty list.
/// The result is sorted by case-insensitive name, ties broken by ascending
/// app id.
pub fn discover_installed_games(store_root: &Path, layout: &LibraryLayout) -> Vec<InstalledGame> {
    let manifests_dir = store_root.join(layout.manifest_dir);
    let mut manifest_paths = list_manifest_files(&manifests_dir, layout);
    manifest_paths.sort();

    let mut games = Vec::new();
    for manifest_path in manifest_paths {
        let Ok(contents) = std::fs::read_to_string(&manifest_path) else {
            warn!(path = %manifest_path.display(), "Skipping unreadable manifest");
            continue;
        };
        let manifest = match AppManifest::parse(&contents) {
            Ok(Some(manifest)) => manifest,
            Ok(None) => continue,
            Err(error) => {
                warn!(path = %manifest_path.display(), %error, "Skipping malformed manifest");
                continue;
            }
        };

        let install_directory = manifests_dir
            .join(layout.apps_dir)
            .join(&manifest.install_directory_name);
        let candidates = executable_candidates(&install_directory, &manifest.name);

        let default_executable_relative_path = candidates
            .first()
            .map(|candidate| candidate.relative_path.clone());
        games.push(InstalledGame {
            app_id: manifest.app_id,
            name: manifest.name,
            install_directory_path: install_directory,
            executable_candidates: candidates,
            default_executable_relative_path,
        });
    }

    games.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.app_id.cmp(&b.app_id))
    });
    debug!(root = %store_root.display(), count = games.len(), "Library scan complete");
    games
}

/// Locate the per-user config file under each user-data directory that
/// actually exists, sorted by path.
pub fn locate_config_files(store_root: &Path, layout: &LibraryLayout) -> Vec<PathBuf> {
    let userdata_dir = store_root.join(layout.userdata_dir);
    let Ok(entries) = std::fs::read_dir(&userdata_dir) else {
        return Vec::new();
    };

    let mut configs: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| {
            entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false)
                && !entry.file_name().to_string_lossy().starts_with('.')
        })
        .map(|entry| entry.path().join(layout.config_relative_path))
        .filter(|config| config.is_file())
        .collect();
    configs.sort();
    configs
}

/// Translate a host path inside the bottle's `drive_c` into Windows path
/// syntax. Returns `None` when the path lies outside the emulated drive.
pub fn resolve_windows_path(unix_path: &str) -> Option<String> {
    let marker_start = unix_path.find(DRIVE_C_MARKER)?;
    let relative = &unix_path[marker_start + DRIVE_C_MARKER.len()..];
    Some(format!("C:\\{}", relative.replace('/', "\\")))
}

fn list_manifest_files(manifests_dir: &Path, layout: &LibraryLayout) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(manifests_dir) else {
        return Vec::new();
    };

    entries
        .flatten()
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| {
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                return false;
            };
            let extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_lowercase);
            file_name.starts_with(layout.manifest_prefix)
                && !file_name.starts_with('.')
                && extension.as_deref() == Some(layout.manifest_extension)
        })
        .collect()
}

/// Walk an install directory and score every executable found.
fn executable_candidates(install_directory: &Path, game_name: &str) -> Vec<ExecutableCandidate> {
    let Ok(canonical_root) = std::fs::canonicalize(install_directory) else {
        return Vec::new();
    };
    if !canonical_root.is_dir() {
        return Vec::new();
    }

    let game_tokens = normalized_tokens(game_name);
    let install_directory_name = canonical_root
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let mut visited = 0usize;
    let mut candidates = Vec::new();

    let walker = WalkDir::new(&canonical_root)
        .min_depth(1)
        .max_depth(MAX_WALK_DEPTH)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') {
                return false;
            }
            // Pruning on the relative path skips the whole subtree, not
            // just the matching entry.
            let relative = entry
                .path()
                .strip_prefix(&canonical_root)
                .unwrap_or_else(|_| entry.path())
                .to_string_lossy()
                .to_lowercase();
            !SKIP_TOKENS.iter().any(|token| relative.contains(token))
        });

    for entry in walker.flatten() {
        visited += 1;
        if visited > MAX_WALK_ENTRIES {
            warn!(
                root = %canonical_root.display(),
                "Walk entry budget exhausted, truncating scan"
            );
            break;
        }

        if !entry.file_type().is_file() {
            continue;
        }
        let is_exe = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"));
        if !is_exe {
            continue;
        }

        // Resolve symlinked executables and discard anything that escapes
        // the install directory.
        let Ok(canonical_file) = std::fs::canonicalize(entry.path()) else {
            continue;
        };
        let Ok(relative) = canonical_file.strip_prefix(&canonical_root) else {
            continue;
        };
        let relative_path = relative.to_string_lossy().replace('\\', "/");

        let score = score_executable(&relative_path, &game_tokens, &install_directory_name);
        candidates.push(ExecutableCandidate {
            relative_path,
            absolute_path: canonical_file,
            score,
        });
    }

    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.relative_path.len().cmp(&b.relative_path.len()))
            .then_with(|| {
                a.relative_path
                    .to_lowercase()
                    .cmp(&b.relative_path.to_lowercase())
            })
    });
    candidates
}

/// Lowercased alphanumeric tokens of the game name, 3+ chars each.
fn normalized_tokens(game_name: &str) -> Vec<String> {
    game_name
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() >= 3)
        .map(str::to_string)
        .collect()
}

/// Heuristic score for one candidate. Base 100, penalized by nesting depth
/// and well-known helper/installer/redistributable names, boosted when the
/// name matches the install directory or the game's title tokens.
fn score_executable(relative_path: &str, game_tokens: &[String], install_directory_name: &str) -> i32 {
    let lower_path = relative_path.to_lowercase();
    let file_name = lower_path.rsplit('/').next().unwrap_or(&lower_path).to_string();
    let base_name = file_name
        .strip_suffix(".exe")
        .unwrap_or(&file_name)
        .to_string();
    let depth = relative_path.split('/').count() as i32;

    let mut score = 100;
    score -= depth * 5;

    if base_name == install_directory_name {
        score += 80;
    }
    if base_name == "game" {
        score += 20;
    }
    if file_name.contains("shipping") {
        score += 18;
    }
    if file_name.contains("launcher") {
        score -= 24;
    }
    if file_name.contains("unins") {
        score -= 90;
    }
    if file_name.contains("crash") || file_name.contains("report") || file_name.contains("helper") {
        score -= 45;
    }
    if lower_path.contains("anticheat") {
        score -= 50;
    }
    if lower_path.contains("redist") || lower_path.contains("support") {
        score -= 70;
    }

    for token in game_tokens {
        if base_name.contains(token.as_str()) {
            score += 15;
        }
    }

    score
}
