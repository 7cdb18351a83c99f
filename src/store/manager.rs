//! Store manager: the single-writer orchestrator for one backend
//!
//! One `StoreManager` per configured store backend owns that backend's
//! directory layout, its fingerprint-keyed library cache, and all profile
//! mutations. Callers must not overlap mutating operations against the same
//! instance; the internal cache is mutex-guarded so read paths stay `&self`.
//!
//! Profile saves and removals persist first, then drive a synchronization
//! pass over the affected app ids and return a human-readable summary. The
//! call only fails before per-game work begins (directory preparation,
//! profile-store I/O) — per-game trouble is reported in the returned log.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::library::{scanner, InstalledGame, LibraryFingerprint};
use crate::profile::{CompatibilityProfile, ProfileStore};
use crate::runtime::runner::RegistryRunner;
use crate::runtime::{CommandOutput, CompatLayerRegistry, WineRunner};
use crate::store::backend::{BackendSpec, StoreBackend};
use crate::store::preflight::{self, PreflightReport};
use crate::store::sync::{ProfileSynchronizer, SyncRequest};

/// Environment snapshot for one backend, as reported to the caller.
#[derive(Debug, Clone)]
pub struct StoreEnvironment {
    /// Application home directory
    pub app_home_path: PathBuf,
    /// Wine prefix used when no CrossOver bottle exists
    pub prefix_path: PathBuf,
    /// Log directory
    pub logs_path: PathBuf,
    /// Detected Wine binary, if any
    pub wine_binary_path: Option<PathBuf>,
    /// Whether the store client executable was found
    pub client_installed: bool,
    /// The client executable, when found
    pub client_executable_path: Option<PathBuf>,
}

/// Library snapshot: discovered games plus persisted profiles.
#[derive(Debug, Clone, Default)]
pub struct GameLibraryState {
    /// Installed games, sorted by name
    pub games: Vec<InstalledGame>,
    /// Persisted profiles, sorted by app id
    pub profiles: Vec<CompatibilityProfile>,
}

struct CachedLibrary {
    fingerprint: LibraryFingerprint,
    games: Vec<InstalledGame>,
}

/// Registry runner stand-in used when no Wine runtime is installed: every
/// invocation fails, which the synchronizer downgrades to log lines.
struct UnavailableRunner;

impl RegistryRunner for UnavailableRunner {
    fn run_registry_command(&self, _args: &[String]) -> Result<CommandOutput> {
        Err(Error::RuntimeNotFound)
    }
}

/// Orchestrator for one store backend. See the module docs.
pub struct StoreManager {
    spec: BackendSpec,
    app_home: PathBuf,
    prefix_path: PathBuf,
    logs_path: PathBuf,
    cache_path: PathBuf,
    settings_path: PathBuf,
    profiles_path: PathBuf,
    bottle_name: String,
    bottle_path: PathBuf,
    runner_override: Option<Arc<dyn RegistryRunner>>,
    library_cache: Mutex<Option<CachedLibrary>>,
}

impl StoreManager {
    /// Create a manager rooted at the default application home
    /// (`~/Library/Application Support/Bottlerack`).
    pub fn new(backend: StoreBackend) -> Self {
        let app_home = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Library/Application Support/Bottlerack");
        Self::with_home(backend, app_home)
    }

    /// Create a manager rooted at an explicit application home. Used by
    /// tests and by hosts that relocate their data directory.
    pub fn with_home(backend: StoreBackend, app_home: PathBuf) -> Self {
        let spec = backend.spec();
        let bottle_name = std::env::var(spec.bottle_env_var)
            .unwrap_or_else(|_| spec.default_bottle_name.to_string());
        let bottle_path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Library/Application Support/CrossOver/Bottles")
            .join(&bottle_name);

        let prefix_path = app_home.join("prefixes").join(spec.home_component);
        let logs_path = app_home.join("logs");
        let cache_path = app_home.join("cache");
        let settings_path = app_home.join("settings");
        let profiles_path = settings_path.join(spec.profile_file_name);

        Self {
            spec,
            app_home,
            prefix_path,
            logs_path,
            cache_path,
            settings_path,
            profiles_path,
            bottle_name,
            bottle_path,
            runner_override: None,
            library_cache: Mutex::new(None),
        }
    }

    /// Inject a registry runner, replacing Wine detection. Tests use this to
    /// run the full synchronization against a scripted fake.
    pub fn with_runner(mut self, runner: Arc<dyn RegistryRunner>) -> Self {
        self.runner_override = Some(runner);
        self
    }

    /// Override the CrossOver bottle location. Tests point this at a
    /// fixture directory.
    pub fn with_bottle_path(mut self, bottle_path: PathBuf) -> Self {
        self.bottle_path = bottle_path;
        self
    }

    /// The backend this manager serves.
    pub fn backend(&self) -> StoreBackend {
        self.spec.backend
    }

    /// Path of the persisted profile store.
    pub fn profiles_path(&self) -> &Path {
        &self.profiles_path
    }

    /// Environment snapshot: paths, runtime and client detection.
    pub fn snapshot(&self) -> StoreEnvironment {
        let client_executable = self.locate_client_executable();
        StoreEnvironment {
            app_home_path: self.app_home.clone(),
            prefix_path: self.prefix_path.clone(),
            logs_path: self.logs_path.clone(),
            wine_binary_path: WineRunner::locate_wine_binary(),
            client_installed: client_executable.is_some(),
            client_executable_path: client_executable,
        }
    }

    /// Current library state: discovered games (cached by fingerprint) and
    /// persisted profiles sorted by app id. Best-effort — a missing client
    /// or unreadable store yields empty lists.
    pub fn game_library_state(&self, force_refresh: bool) -> GameLibraryState {
        let games = self.discover_games(force_refresh);
        let mut profiles = ProfileStore::load(&self.profiles_path).unwrap_or_else(|error| {
            warn!(%error, "Failed to load profile store, treating as empty");
            Vec::new()
        });
        profiles.sort_by_key(|profile| profile.app_id);
        GameLibraryState { games, profiles }
    }

    /// Run the backend's preflight checks.
    pub fn preflight_report(&self) -> PreflightReport {
        preflight::run_checks(&self.spec, &self.app_home, self.locate_client_executable())
    }

    /// Write a plain-text diagnostics report into the cache directory and
    /// return its path.
    pub fn diagnostics_report(&self) -> Result<PathBuf> {
        self.prepare_directories()?;

        let environment = self.snapshot();
        let library = self.game_library_state(false);
        let report = self.preflight_report();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);

        let mut lines = vec![
            "Bottlerack Diagnostics".to_string(),
            format!("Generated at (unix): {timestamp}"),
            String::new(),
            "[Environment]".to_string(),
            format!("Store: {}", self.spec.display_name),
            format!("App home: {}", environment.app_home_path.display()),
            format!("Prefix: {}", environment.prefix_path.display()),
            format!("Logs: {}", environment.logs_path.display()),
            format!("Client installed: {}", environment.client_installed),
            format!(
                "Client executable: {}",
                environment
                    .client_executable_path
                    .as_deref()
                    .map_or_else(|| "-".to_string(), |path| path.display().to_string())
            ),
            format!(
                "Wine runtime: {}",
                environment
                    .wine_binary_path
                    .as_deref()
                    .map_or_else(|| "-".to_string(), |path| path.display().to_string())
            ),
            String::new(),
            "[Library]".to_string(),
            format!("Installed games: {}", library.games.len()),
            format!("Saved profiles: {}", library.profiles.len()),
            String::new(),
            "[Preflight]".to_string(),
        ];
        for check in &report.checks {
            lines.push(format!(
                "- {}: {} | {}",
                check.kind.label(),
                check.status.label(),
                check.detail
            ));
        }

        let report_path = self.cache_path.join(format!("diagnostics-{timestamp}.txt"));
        std::fs::write(&report_path, lines.join("\n"))?;
        info!(path = %report_path.display(), "Diagnostics report written");
        Ok(report_path)
    }

    /// Normalize and persist a profile, then synchronize the affected game.
    ///
    /// The preset is rederived from the flags first; a profile whose flags
    /// are all default is *removed* instead of stored. Returns a summary
    /// line plus any synchronizer log lines.
    pub fn save_profile(&self, profile: CompatibilityProfile) -> Result<String> {
        self.prepare_directories()?;

        let mut normalized = profile;
        normalized.refresh_preset_from_flags();
        let app_id = normalized.app_id;
        let has_overrides = normalized.has_overrides();

        let mut profiles_by_id = self.load_profiles_by_id()?;
        if has_overrides {
            profiles_by_id.insert(app_id, normalized);
        } else {
            profiles_by_id.remove(&app_id);
        }
        self.persist_profiles_by_id(&profiles_by_id)?;

        let logs = self.synchronize(&profiles_by_id, &[app_id], &HashMap::new());
        let message = if has_overrides {
            format!("Profile saved for AppID {app_id}.")
        } else {
            format!("Profile reset for AppID {app_id}.")
        };
        Ok(join_summary(message, logs))
    }

    /// Remove a profile and clear its external state.
    pub fn remove_profile(&self, app_id: u32) -> Result<String> {
        self.prepare_directories()?;

        let mut profiles_by_id = self.load_profiles_by_id()?;
        let removed = profiles_by_id.remove(&app_id);
        self.persist_profiles_by_id(&profiles_by_id)?;

        let removed_profiles: HashMap<u32, CompatibilityProfile> = removed
            .into_iter()
            .map(|profile| (app_id, profile))
            .collect();
        let logs = self.synchronize(&profiles_by_id, &[app_id], &removed_profiles);
        Ok(join_summary(format!("Profile removed for AppID {app_id}."), logs))
    }

    /// Reconcile every persisted profile. Run before launching the client
    /// so external state matches the store even after out-of-band edits.
    pub fn synchronize_all(&self) -> Result<Vec<String>> {
        self.prepare_directories()?;
        let profiles_by_id = self.load_profiles_by_id()?;
        let targets: Vec<u32> = profiles_by_id.keys().copied().collect();
        Ok(self.synchronize(&profiles_by_id, &targets, &HashMap::new()))
    }

    /// Remove store data under the client's root. At least one of the two
    /// selections is required. Always drops the library cache.
    pub fn wipe_data(&self, clear_account_data: bool, clear_library_data: bool) -> Result<String> {
        self.prepare_directories()?;
        if !clear_account_data && !clear_library_data {
            return Err(Error::WipeSelectionRequired);
        }

        let mut removed: Vec<String> = Vec::new();
        if let Some(root) = self.store_root() {
            if let Some(library) = &self.spec.library {
                if clear_library_data {
                    let library_dir = root.join(library.layout.manifest_dir);
                    remove_dir_logged(&library_dir, &mut removed)?;
                }
                if clear_account_data {
                    let userdata_dir = root.join(library.layout.userdata_dir);
                    remove_dir_logged(&userdata_dir, &mut removed)?;
                    remove_dir_logged(&root.join("config"), &mut removed)?;
                }
            }
        }
        self.invalidate_library_cache();

        if removed.is_empty() {
            return Ok(format!(
                "No {} data found to remove.",
                self.spec.display_name
            ));
        }
        Ok(format!("Removed: {}", removed.join(", ")))
    }

    /// Drop the cached scan. Call after any operation that can change the
    /// on-disk manifest set.
    pub fn invalidate_library_cache(&self) {
        *self.library_cache.lock() = None;
    }

    fn prepare_directories(&self) -> Result<()> {
        for dir in [
            &self.app_home,
            &self.prefix_path,
            &self.logs_path,
            &self.cache_path,
            &self.settings_path,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Probe the client executable inside the bottle, preferring candidates
    /// whose installation marker is present.
    fn locate_client_executable(&self) -> Option<PathBuf> {
        let drive_roots = [
            self.bottle_path.join("drive_c"),
            self.prefix_path.join("drive_c"),
        ];

        for drive_c in &drive_roots {
            for candidate in self.spec.client_candidates {
                let executable = drive_c.join(candidate.executable);
                let marker_present = candidate
                    .installed_marker
                    .map(|marker| drive_c.join(marker).is_file());
                if executable.is_file() && marker_present != Some(false) {
                    return Some(executable);
                }
            }
        }
        // Fall back to executable-only matches (install may still be
        // finishing its first run).
        for drive_c in &drive_roots {
            for candidate in self.spec.client_candidates {
                let executable = drive_c.join(candidate.executable);
                if executable.is_file() {
                    return Some(executable);
                }
            }
        }
        None
    }

    fn store_root(&self) -> Option<PathBuf> {
        self.locate_client_executable()
            .map(|executable| scanner::store_root(&executable))
    }

    fn discover_games(&self, force_refresh: bool) -> Vec<InstalledGame> {
        let Some(library) = &self.spec.library else {
            return Vec::new();
        };
        let Some(root) = self.store_root() else {
            self.invalidate_library_cache();
            return Vec::new();
        };

        let fingerprint = LibraryFingerprint::collect(&root, &library.layout);
        let mut cache = self.library_cache.lock();
        if !force_refresh {
            if let Some(cached) = cache.as_ref() {
                if cached.fingerprint == fingerprint {
                    return cached.games.clone();
                }
            }
        }

        let games = scanner::discover_installed_games(&root, &library.layout);
        *cache = Some(CachedLibrary {
            fingerprint,
            games: games.clone(),
        });
        games
    }

    fn registry_runner(&self) -> Arc<dyn RegistryRunner> {
        if let Some(runner) = &self.runner_override {
            return Arc::clone(runner);
        }
        match WineRunner::detect(&self.bottle_name, &self.bottle_path, &self.prefix_path) {
            Ok(runner) => Arc::new(runner),
            Err(error) => {
                warn!(%error, "No Wine runtime available for registry access");
                Arc::new(UnavailableRunner)
            }
        }
    }

    fn synchronize(
        &self,
        profiles_by_id: &HashMap<u32, CompatibilityProfile>,
        target_app_ids: &[u32],
        removed_profiles: &HashMap<u32, CompatibilityProfile>,
    ) -> Vec<String> {
        if target_app_ids.is_empty() {
            return Vec::new();
        }
        let Some(library) = self.spec.library else {
            // Backends without a manifest library have nothing to reconcile.
            return Vec::new();
        };

        let Some(root) = self.store_root() else {
            return vec![format!(
                "{} not found: profile saved and will be applied when {} is available.",
                self.spec.display_name, self.spec.display_name
            )];
        };

        let games = self.discover_games(false);
        let config_paths = scanner::locate_config_files(&root, &library.layout);

        let registry = CompatLayerRegistry::new(self.registry_runner());
        let synchronizer = ProfileSynchronizer::new(&self.spec, &games, &config_paths, &registry);
        synchronizer.synchronize(&SyncRequest {
            profiles: profiles_by_id,
            target_app_ids,
            removed_profiles,
        })
    }

    fn load_profiles_by_id(&self) -> Result<HashMap<u32, CompatibilityProfile>> {
        let profiles = ProfileStore::load(&self.profiles_path)?;
        Ok(profiles
            .into_iter()
            .map(|profile| (profile.app_id, profile))
            .collect())
    }

    fn persist_profiles_by_id(
        &self,
        profiles_by_id: &HashMap<u32, CompatibilityProfile>,
    ) -> Result<()> {
        let profiles: Vec<CompatibilityProfile> = profiles_by_id.values().cloned().collect();
        ProfileStore::save(&profiles, &self.profiles_path)
    }
}

fn join_summary(message: String, logs: Vec<String>) -> String {
    if logs.is_empty() {
        return message;
    }
    let mut lines = vec![message];
    lines.extend(logs);
    lines.join("\n")
}

fn remove_dir_logged(dir: &Path, removed: &mut Vec<String>) -> Result<()> {
    if dir.is_dir() {
        std::fs::remove_dir_all(dir)?;
        removed.push(dir.display().to_string());
    }
    Ok(())
}
