//! Profile persistence: one versioned JSON document per store backend
//!
//! The file is the sole durable store — `{ "version": 1, "profiles": [...] }`,
//! pretty-printed with a stable field order so it diffs cleanly under version
//! control. Loading is tolerant by contract: records from older releases must
//! always load, with unknown fields defaulted and deprecated fields migrated
//! (the v1 boolean `force16BitColor` becomes the 16-bit reduced-color mode).
//! Writes are atomic (temp file + rename) so a crash never leaves a
//! half-written store.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::profile::models::{
    CompatibilityMode, CompatibilityPreset, CompatibilityProfile, HighDpiOverrideMode,
    ReducedColorMode,
};

/// Current schema version written by `save`.
const CURRENT_VERSION: u32 = 1;

/// Versioned on-disk envelope.
#[derive(Debug, Serialize, Deserialize)]
struct StoredProfiles {
    version: u32,
    profiles: Vec<ProfileRecord>,
}

/// One persisted profile record.
///
/// Every field except the key is optional on read; enum fields travel as
/// strings and unknown values default rather than fail. This is the
/// schema-evolution seam — the strong model lives in [`CompatibilityProfile`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileRecord {
    #[serde(rename = "appID")]
    app_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    executable_relative_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compatibility_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    force_windowed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    force_640x480: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reduced_color_mode: Option<String>,
    #[serde(default, rename = "highDPIOverrideMode", skip_serializing_if = "Option::is_none")]
    high_dpi_override_mode: Option<String>,
    /// Deprecated v1 field, read for migration and never written back.
    #[serde(default, rename = "force16BitColor", skip_serializing_if = "Option::is_none")]
    force_16_bit_color: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    disable_fullscreen_optimizations: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    run_as_admin: Option<bool>,
}

impl ProfileRecord {
    fn from_profile(profile: &CompatibilityProfile) -> Self {
        Self {
            app_id: profile.app_id,
            preset: Some(profile.preset.wire_name().to_string()),
            executable_relative_path: profile.executable_relative_path.clone(),
            compatibility_mode: Some(profile.compatibility_mode.wire_name().to_string()),
            force_windowed: Some(profile.force_windowed),
            force_640x480: Some(profile.force_640x480),
            reduced_color_mode: Some(profile.reduced_color_mode.wire_name().to_string()),
            high_dpi_override_mode: Some(profile.high_dpi_override_mode.wire_name().to_string()),
            force_16_bit_color: None,
            disable_fullscreen_optimizations: Some(profile.disable_fullscreen_optimizations),
            run_as_admin: Some(profile.run_as_admin),
        }
    }

    fn into_profile(self) -> CompatibilityProfile {
        let reduced_color_mode = match self
            .reduced_color_mode
            .as_deref()
            .and_then(ReducedColorMode::from_wire)
        {
            Some(mode) => mode,
            // v1 records carried a boolean instead of the enum.
            None if self.force_16_bit_color == Some(true) => ReducedColorMode::Colors16Bit,
            None => ReducedColorMode::None,
        };

        CompatibilityProfile {
            app_id: self.app_id,
            preset: self
                .preset
                .as_deref()
                .and_then(CompatibilityPreset::from_wire)
                .unwrap_or(CompatibilityPreset::Automatic),
            executable_relative_path: self.executable_relative_path,
            compatibility_mode: self
                .compatibility_mode
                .as_deref()
                .and_then(CompatibilityMode::from_wire)
                .unwrap_or_default(),
            force_windowed: self.force_windowed.unwrap_or(false),
            force_640x480: self.force_640x480.unwrap_or(false),
            reduced_color_mode,
            high_dpi_override_mode: self
                .high_dpi_override_mode
                .as_deref()
                .and_then(HighDpiOverrideMode::from_wire)
                .unwrap_or_default(),
            disable_fullscreen_optimizations: self
                .disable_fullscreen_optimizations
                .unwrap_or(false),
            run_as_admin: self.run_as_admin.unwrap_or(false),
        }
    }
}

/// Profile store operations.
pub struct ProfileStore;

impl ProfileStore {
    /// Load all profiles from `path`. A missing file is an empty store, not
    /// an error.
    pub fn load(path: &Path) -> Result<Vec<CompatibilityProfile>> {
        if !path.exists() {
            debug!(path = %path.display(), "Profile store not found, starting empty");
            return Ok(Vec::new());
        }

        let json = std::fs::read_to_string(path).map_err(|source| Error::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let payload: StoredProfiles = serde_json::from_str(&json)?;

        debug!(
            path = %path.display(),
            version = payload.version,
            count = payload.profiles.len(),
            "Loaded profile store"
        );
        Ok(payload
            .profiles
            .into_iter()
            .map(ProfileRecord::into_profile)
            .collect())
    }

    /// Save `profiles` to `path`, sorted by app id, creating the parent
    /// directory if needed. The write is atomic: serialized into a temp file
    /// in the same directory, then renamed over the target.
    pub fn save(profiles: &[CompatibilityProfile], path: &Path) -> Result<()> {
        let mut sorted: Vec<&CompatibilityProfile> = profiles.iter().collect();
        sorted.sort_by_key(|profile| profile.app_id);

        let payload = StoredProfiles {
            version: CURRENT_VERSION,
            profiles: sorted.into_iter().map(ProfileRecord::from_profile).collect(),
        };
        let json = serde_json::to_string_pretty(&payload)?;

        let parent = path.parent().ok_or_else(|| Error::ConfigWriteFailed {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent"),
        })?;
        std::fs::create_dir_all(parent)?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)?;
        temp.write_all(json.as_bytes())?;
        temp.persist(path).map_err(|e| Error::ConfigWriteFailed {
            path: path.to_path_buf(),
            source: e.error,
        })?;

        info!(path = %path.display(), count = payload.profiles.len(), "Profile store saved");
        Ok(())
    }
}
