//! Profile synchronization: reconcile persisted profiles into the two
//! external stores of truth
//!
//! For every affected app id, in ascending order:
//!
//! 1. **Launch options** — each located per-user config file is parsed, the
//!    managed segment is merged into the game's `LaunchOptions` string, and
//!    the file is rewritten only when the serialized document differs from
//!    the raw text on disk. Options that become empty are removed entirely
//!    rather than stored as an empty string.
//! 2. **Compatibility flags** — the effective executable is resolved
//!    (explicit choice first, scanner default second), translated into a
//!    Windows path, and the registry value is written or deleted only when
//!    the desired flag *set* differs from the current one.
//!
//! A failure against one file or one registry value becomes a log line and
//! processing continues; a single bad file never aborts the batch.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::keyvalue::Document;
use crate::library::scanner;
use crate::library::InstalledGame;
use crate::profile::launch_options;
use crate::profile::CompatibilityProfile;
use crate::runtime::registry;
use crate::runtime::CompatLayerRegistry;
use crate::store::backend::BackendSpec;

/// What to reconcile in one synchronization pass.
pub struct SyncRequest<'a> {
    /// The full current profile mapping
    pub profiles: &'a HashMap<u32, CompatibilityProfile>,
    /// App ids that changed this call (just saved or just removed)
    pub target_app_ids: &'a [u32],
    /// For removals: the removed profile values, needed to resolve which
    /// executable to clear flags from
    pub removed_profiles: &'a HashMap<u32, CompatibilityProfile>,
}

/// One synchronization pass over a discovered library.
pub struct ProfileSynchronizer<'a> {
    spec: &'a BackendSpec,
    games_by_id: HashMap<u32, &'a InstalledGame>,
    config_paths: &'a [PathBuf],
    registry: &'a CompatLayerRegistry,
}

impl<'a> ProfileSynchronizer<'a> {
    /// Build a synchronizer over the current library snapshot.
    pub fn new(
        spec: &'a BackendSpec,
        games: &'a [InstalledGame],
        config_paths: &'a [PathBuf],
        registry: &'a CompatLayerRegistry,
    ) -> Self {
        Self {
            spec,
            games_by_id: games.iter().map(|game| (game.app_id, game)).collect(),
            config_paths,
            registry,
        }
    }

    /// Run the pass and return the human-readable change log.
    ///
    /// Never fails: per-item errors are converted into log lines. Lines are
    /// ordered deterministically (app ids ascending, config files in their
    /// sorted order).
    pub fn synchronize(&self, request: &SyncRequest<'_>) -> Vec<String> {
        if request.target_app_ids.is_empty() {
            return Vec::new();
        }

        let mut output = Vec::new();

        let mut registry_values = match self.registry.query_all() {
            Ok(values) => values,
            Err(error) => {
                output.push(format!(
                    "[CompatLayer] Failed to read current registry state: {error}"
                ));
                HashMap::new()
            }
        };

        if self.config_paths.is_empty() {
            if let Some(config_file_name) = self.spec.config_file_name() {
                output.push(format!(
                    "{config_file_name} not found ({} has not been signed into yet).",
                    self.spec.display_name
                ));
            }
        }

        let mut targets: Vec<u32> = request.target_app_ids.to_vec();
        targets.sort_unstable();
        targets.dedup();

        for app_id in targets {
            let active_profile = request.profiles.get(&app_id);
            let previous_profile = request.removed_profiles.get(&app_id);
            let profile_for_executable = active_profile.or(previous_profile);
            let game = self.games_by_id.get(&app_id).copied();
            let force_windowed = active_profile.is_some_and(|profile| profile.force_windowed);

            for config_path in self.config_paths {
                match self.sync_launch_options(app_id, force_windowed, config_path) {
                    Ok(true) => output.push(format!(
                        "[LaunchOptions] AppID {app_id} updated in {}.",
                        config_path.display()
                    )),
                    Ok(false) => {}
                    Err(error) => output.push(format!(
                        "[LaunchOptions] AppID {app_id} failed in {}: {error}",
                        config_path.display()
                    )),
                }
            }

            let Some(profile_for_executable) = profile_for_executable else {
                continue;
            };

            match self.sync_compat_layer(
                app_id,
                game,
                profile_for_executable,
                active_profile,
                &mut registry_values,
            ) {
                Ok(Some(line)) => output.push(line),
                Ok(None) => {}
                Err(error) => output.push(format!("[CompatLayer] AppID {app_id} error: {error}")),
            }
        }

        output
    }

    /// Merge the managed segment into one config file's launch options.
    /// Returns whether the file changed.
    fn sync_launch_options(
        &self,
        app_id: u32,
        force_windowed: bool,
        config_path: &Path,
    ) -> Result<bool> {
        let Some(segments) = self.spec.launch_options_path(app_id) else {
            return Ok(false);
        };
        let path: Vec<&str> = segments.iter().map(String::as_str).collect();

        let content =
            std::fs::read_to_string(config_path).map_err(|source| Error::ConfigUnreadable {
                path: config_path.to_path_buf(),
                source,
            })?;
        let mut document = Document::parse(&content)?;

        let existing = document.string_at(&path).unwrap_or("").to_string();
        let segment = launch_options::managed_segment(force_windowed);
        let merged = launch_options::merge(&existing, segment.as_deref());

        if merged.is_empty() {
            document.remove_value(&path);
        } else {
            document.set_string(&merged, &path);
        }

        let updated = document.serialize();
        if updated == content {
            return Ok(false);
        }

        write_atomically(config_path, &updated)?;
        debug!(app_id, path = %config_path.display(), "Launch options updated");
        Ok(true)
    }

    /// Diff and apply the registry flags for one game. Returns the log line
    /// describing what happened, or `None` for a no-op.
    fn sync_compat_layer(
        &self,
        app_id: u32,
        game: Option<&InstalledGame>,
        profile_for_executable: &CompatibilityProfile,
        active_profile: Option<&CompatibilityProfile>,
        registry_values: &mut HashMap<String, String>,
    ) -> Result<Option<String>> {
        let selected = profile_for_executable.executable_relative_path.as_deref();
        let Some(executable_path) = resolve_executable_path(game, selected) else {
            // Only worth reporting when there might be flags to apply or
            // clear: an active profile with no flags resolves to a no-op.
            if active_profile.is_none_or(|profile| !profile.compat_layer_flags().is_empty()) {
                return Ok(Some(format!(
                    "[CompatLayer] AppID {app_id}: could not resolve executable to apply flags."
                )));
            }
            return Ok(None);
        };

        let Some(windows_path) =
            scanner::resolve_windows_path(&executable_path.to_string_lossy())
        else {
            return Ok(Some(format!(
                "[CompatLayer] AppID {app_id}: path outside drive_c, not applicable."
            )));
        };

        let escaped_path = registry::escaped_value_name(&windows_path);
        let current_raw = registry_values
            .get(&windows_path)
            .or_else(|| registry_values.get(&escaped_path))
            .cloned()
            .unwrap_or_default();
        let current_flags = registry::flag_set(&current_raw);

        let desired_tokens: Vec<&'static str> = active_profile
            .map(CompatibilityProfile::compat_layer_flags)
            .unwrap_or_default();
        let desired_flags: HashSet<String> =
            desired_tokens.iter().map(|token| (*token).to_string()).collect();

        if desired_tokens.is_empty() {
            if current_flags.is_empty() {
                return Ok(None);
            }
            self.registry.remove_flags(&windows_path)?;
            registry_values.remove(&windows_path);
            registry_values.remove(&escaped_path);
            return Ok(Some(format!(
                "[CompatLayer] AppID {app_id}: compatibility flags removed."
            )));
        }

        if current_flags == desired_flags {
            return Ok(None);
        }

        let value = desired_tokens.join(" ");
        self.registry.set_flags(&windows_path, &value)?;
        registry_values.insert(windows_path, value.clone());
        registry_values.remove(&escaped_path);
        Ok(Some(format!(
            "[CompatLayer] AppID {app_id}: flags applied ({value})."
        )))
    }
}

/// Resolve the executable a profile's flags apply to: the explicitly chosen
/// relative path when it exists on disk, the scanner's default otherwise.
fn resolve_executable_path(
    game: Option<&InstalledGame>,
    selected_relative_path: Option<&str>,
) -> Option<PathBuf> {
    let game = game?;

    let selected = selected_relative_path.map(str::trim).unwrap_or("");
    if !selected.is_empty() {
        let selected_path = game.install_directory_path.join(selected);
        if selected_path.is_file() {
            return Some(selected_path);
        }
    }

    if let Some(default_relative) = &game.default_executable_relative_path {
        let default_path = game.install_directory_path.join(default_relative);
        if default_path.is_file() {
            return Some(default_path);
        }
    }

    None
}

/// Write `content` to `path` via a temp file + rename in the same directory.
fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let parent = path.parent().ok_or_else(|| Error::ConfigWriteFailed {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent"),
    })?;
    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|source| {
        Error::ConfigWriteFailed {
            path: path.to_path_buf(),
            source,
        }
    })?;
    temp.write_all(content.as_bytes())
        .map_err(|source| Error::ConfigWriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
    temp.persist(path).map_err(|e| Error::ConfigWriteFailed {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
